//! Company Reconciliation Engine
//!
//! Companies live in two places: the relational store and a flat CSV mirror
//! that operators may edit out-of-band. Listing always re-imports the mirror
//! first (CSV is authoritative for bulk reads), while single-record writes go
//! to the store and then patch the mirror (store is authoritative by id).
//! Creation deliberately does not write through to the mirror; the row shows
//! up there after the next listing sync. The asymmetry is part of the
//! contract, not an oversight.

use crate::error::ApiError;
use crate::mirror::CsvMirror;
use crate::store::Store;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub company_name: String,
    pub location: String,
    pub industry: String,
    pub website: String,
}

/// The four caller-supplied fields, used for create and update payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyFields {
    pub company_name: String,
    pub location: String,
    pub industry: String,
    pub website: String,
}

impl Company {
    pub fn from_fields(id: i64, fields: CompanyFields) -> Self {
        Self {
            id,
            company_name: fields.company_name,
            location: fields.location,
            industry: fields.industry,
            website: fields.website,
        }
    }
}

/// CSV → store sync: upsert every mirror row by id. Errors with `NotFound`
/// when the mirror file is absent. Re-running with an unchanged file is a
/// no-op as far as store contents are concerned.
pub fn sync_mirror_into_store(mirror: &CsvMirror, store: &Store) -> Result<(), ApiError> {
    for company in mirror.read_all()? {
        store.upsert_company(&company)?;
    }
    Ok(())
}

/// Listing read path: sync from the mirror, then return the full table.
pub fn list_companies(store: &Store, mirror: &CsvMirror) -> Result<Vec<Company>, ApiError> {
    sync_mirror_into_store(mirror, store)?;
    store.list_companies()
}

/// Direct creation: sequential id, store only.
pub fn create_company(store: &Store, fields: CompanyFields) -> Result<Company, ApiError> {
    let id = store.next_company_id()?;
    let company = Company::from_fields(id, fields);
    store.insert_company(&company)?;
    log::info!("created company {} ({})", company.id, company.company_name);
    Ok(company)
}

/// Full field replacement in the store, then patch the mirror row in place.
pub fn update_company(
    store: &Store,
    mirror: &CsvMirror,
    id: i64,
    fields: CompanyFields,
) -> Result<Company, ApiError> {
    let company = Company::from_fields(id, fields);
    store.update_company(&company)?;
    mirror.patch_update(&company)?;
    Ok(company)
}

/// Remove the row, then rewrite the mirror without it.
pub fn delete_company(store: &Store, mirror: &CsvMirror, id: i64) -> Result<Company, ApiError> {
    let company = store.delete_company(id)?;
    mirror.remove(id)?;
    log::info!("deleted company {} ({})", company.id, company.company_name);
    Ok(company)
}
