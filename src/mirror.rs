//! CSV Mirror
//!
//! Flat-file copy of the companies table, header
//! `id,company_name,location,industry,website`. The file is treated as
//! human-editable: reads tolerate nothing less than a full rewrite cycle
//! (read all, mutate, write all), and the patch operations silently skip
//! when the file does not exist yet.

use crate::companies::Company;
use crate::error::ApiError;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CsvMirror {
    path: PathBuf,
}

impl CsvMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads every row. `NotFound` when the file is absent.
    pub fn read_all(&self) -> Result<Vec<Company>, ApiError> {
        if !self.path.exists() {
            return Err(ApiError::NotFound("CSV file not found".to_string()));
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut companies = Vec::new();
        for record in reader.deserialize() {
            companies.push(record?);
        }
        Ok(companies)
    }

    /// Rewrites the whole file. The header row is written explicitly so an
    /// empty table still produces a well-formed file.
    pub fn write_all(&self, companies: &[Company]) -> Result<(), ApiError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)?;
        writer.write_record(["id", "company_name", "location", "industry", "website"])?;
        for company in companies {
            writer.serialize(company)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Overwrites the row with a matching id. Skips silently when the file
    /// does not exist; leaves the file untouched when the id is not in it.
    pub fn patch_update(&self, company: &Company) -> Result<(), ApiError> {
        if !self.path.exists() {
            log::debug!("mirror {:?} absent, skipping update patch", self.path);
            return Ok(());
        }
        let mut rows = self.read_all()?;
        let mut changed = false;
        for row in rows.iter_mut() {
            if row.id == company.id {
                *row = company.clone();
                changed = true;
            }
        }
        if changed {
            self.write_all(&rows)?;
        }
        Ok(())
    }

    /// Drops the row with the given id and rewrites the file. Skips silently
    /// when the file does not exist.
    pub fn remove(&self, id: i64) -> Result<(), ApiError> {
        if !self.path.exists() {
            log::debug!("mirror {:?} absent, skipping delete patch", self.path);
            return Ok(());
        }
        let mut rows = self.read_all()?;
        rows.retain(|row| row.id != id);
        self.write_all(&rows)
    }
}
