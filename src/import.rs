//! Bulk Import Engine
//!
//! Accepts an uploaded CSV payload (distinct from the mirror file) and merges
//! it into the companies table by natural key: uploaded rows carry no
//! reliable identity, so matching happens on `company_name`. Rows missing any
//! of the four fields are skipped outright; everything else commits as one
//! batch or not at all.

use crate::companies::CompanyFields;
use crate::error::ApiError;
use crate::store::Store;
use serde::{Deserialize, Serialize};

/// One payload row as it arrives: any field may be missing or blank.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImportRow {
    company_name: Option<String>,
    location: Option<String>,
    industry: Option<String>,
    website: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Parse the payload and merge it into the store in a single transaction.
pub fn import_companies(store: &Store, payload: &[u8]) -> Result<ImportOutcome, ApiError> {
    let (rows, skipped) = parse_payload(payload)?;
    let (inserted, updated) = store.merge_companies_by_name(&rows)?;
    log::info!(
        "bulk import: {} inserted, {} updated, {} skipped",
        inserted,
        updated,
        skipped
    );
    Ok(ImportOutcome {
        inserted,
        updated,
        skipped,
    })
}

/// Returns the usable rows plus the count of rows skipped for missing fields.
fn parse_payload(payload: &[u8]) -> Result<(Vec<CompanyFields>, usize), ApiError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(payload);

    let mut rows = Vec::new();
    let mut skipped = 0;
    for record in reader.deserialize::<ImportRow>() {
        let row = record?;
        match (
            present(row.company_name),
            present(row.location),
            present(row.industry),
            present(row.website),
        ) {
            (Some(company_name), Some(location), Some(industry), Some(website)) => {
                rows.push(CompanyFields {
                    company_name,
                    location,
                    industry,
                    website,
                });
            }
            _ => skipped += 1,
        }
    }
    Ok((rows, skipped))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::companies::Company;

    #[test]
    fn test_rows_with_missing_fields_are_skipped() {
        let payload = b"company_name,location,industry,website\n\
            Acme,Springfield,Tech,https://acme.example.com\n\
            Globex,Cypress Creek,Energy,\n\
            ,Nowhere,Tech,https://nameless.example.com\n";

        let (rows, skipped) = parse_payload(payload).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].company_name, "Acme");
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_import_updates_existing_by_name() {
        let store = Store::in_memory().unwrap();
        store
            .insert_company(&Company {
                id: 3,
                company_name: "Acme".to_string(),
                location: "Springfield".to_string(),
                industry: "Tech".to_string(),
                website: "https://acme.example.com".to_string(),
            })
            .unwrap();

        let payload = b"company_name,location,industry,website\n\
            Acme,Shelbyville,Tech,https://acme.example.com\n\
            Globex,Cypress Creek,Energy,https://globex.example.com\n";

        let outcome = import_companies(&store, payload).unwrap();
        assert_eq!(
            outcome,
            ImportOutcome {
                inserted: 1,
                updated: 1,
                skipped: 0
            }
        );

        // Name and id survive; only the other three fields move.
        let acme = store.get_company(3).unwrap();
        assert_eq!(acme.company_name, "Acme");
        assert_eq!(acme.location, "Shelbyville");
        assert_eq!(store.list_companies().unwrap().len(), 2);
    }

    #[test]
    fn test_skipped_row_changes_nothing() {
        let store = Store::in_memory().unwrap();
        let payload = b"company_name,location,industry,website\n\
            Globex,Cypress Creek,Energy,\n";

        let outcome = import_companies(&store, payload).unwrap();
        assert_eq!(outcome.skipped, 1);
        assert!(store.list_companies().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_payload_surfaces_csv_error() {
        let store = Store::in_memory().unwrap();
        // Invalid UTF-8 in a field.
        let payload = b"company_name,location,industry,website\nAcme,Spring\xfffield,Tech,x\n";
        let err = import_companies(&store, payload).unwrap_err();
        assert!(matches!(err, ApiError::Csv(_)));
    }
}
