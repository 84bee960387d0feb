//! Relational Store Adapter
//!
//! Typed CRUD primitives for the `companies` and `resumes` tables. The
//! connection lives behind a mutex and is shared by every handler; schema
//! creation runs once when the store is opened. This is the sole writer of
//! durable entity state — the CSV mirror is maintained separately.

use crate::companies::{Company, CompanyFields};
use crate::error::ApiError;
use crate::resumes::Resume;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS companies (
        id INTEGER PRIMARY KEY,
        company_name TEXT NOT NULL,
        location TEXT NOT NULL,
        industry TEXT NOT NULL,
        website TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_companies_name ON companies(company_name);

    CREATE TABLE IF NOT EXISTS resumes (
        id TEXT PRIMARY KEY,
        job_title TEXT NOT NULL,
        field TEXT NOT NULL,
        filename TEXT NOT NULL,
        url TEXT NOT NULL
    );
";

/// SQLite-backed store, cheap to clone and share across workers.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, ApiError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store for testing.
    pub fn in_memory() -> Result<Self, ApiError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // ============================================================
    // COMPANIES
    // ============================================================

    pub fn list_companies(&self) -> Result<Vec<Company>, ApiError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, company_name, location, industry, website
             FROM companies ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Company {
                id: row.get(0)?,
                company_name: row.get(1)?,
                location: row.get(2)?,
                industry: row.get(3)?,
                website: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_company(&self, id: i64) -> Result<Company, ApiError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, company_name, location, industry, website
             FROM companies WHERE id = ?1",
            params![id],
            |row| {
                Ok(Company {
                    id: row.get(0)?,
                    company_name: row.get(1)?,
                    location: row.get(2)?,
                    industry: row.get(3)?,
                    website: row.get(4)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Company not found".to_string()))
    }

    /// Next company id for direct creation: (max existing id) + 1, or 1 when
    /// the table is empty. Not guarded against concurrent allocation.
    pub fn next_company_id(&self) -> Result<i64, ApiError> {
        let conn = self.conn.lock().unwrap();
        let next: i64 = conn.query_row(
            "SELECT COALESCE(MAX(id), 0) + 1 FROM companies",
            [],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    /// Insert with an explicit id (direct creation and CSV ingestion).
    pub fn insert_company(&self, company: &Company) -> Result<(), ApiError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO companies (id, company_name, location, industry, website)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                company.id,
                company.company_name,
                company.location,
                company.industry,
                company.website,
            ],
        )
        .map_err(conflict_on_constraint)?;
        Ok(())
    }

    /// Upsert by id: the CSV-mirror sync path. Existing rows get all four
    /// fields overwritten; unknown ids are inserted verbatim.
    pub fn upsert_company(&self, company: &Company) -> Result<(), ApiError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO companies (id, company_name, location, industry, website)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 company_name = excluded.company_name,
                 location = excluded.location,
                 industry = excluded.industry,
                 website = excluded.website",
            params![
                company.id,
                company.company_name,
                company.location,
                company.industry,
                company.website,
            ],
        )?;
        Ok(())
    }

    /// Full field replacement.
    pub fn update_company(&self, company: &Company) -> Result<(), ApiError> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "UPDATE companies
             SET company_name = ?2, location = ?3, industry = ?4, website = ?5
             WHERE id = ?1",
            params![
                company.id,
                company.company_name,
                company.location,
                company.industry,
                company.website,
            ],
        )?;
        if affected == 0 {
            return Err(ApiError::NotFound("Company not found".to_string()));
        }
        Ok(())
    }

    /// Deletes the row and returns what was deleted.
    pub fn delete_company(&self, id: i64) -> Result<Company, ApiError> {
        let company = self.get_company(id)?;
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM companies WHERE id = ?1", params![id])?;
        Ok(company)
    }

    /// Natural-key merge for bulk import: match on `company_name`, update the
    /// other three fields, or insert with the store's default id allocation.
    /// The whole batch runs in one transaction; any failure rolls it back.
    /// Returns (inserted, updated).
    pub fn merge_companies_by_name(
        &self,
        rows: &[CompanyFields],
    ) -> Result<(usize, usize), ApiError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut inserted = 0;
        let mut updated = 0;

        for fields in rows {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM companies WHERE company_name = ?1",
                    params![fields.company_name],
                    |row| row.get(0),
                )
                .optional()?;

            match existing {
                Some(id) => {
                    // Name and id are left untouched.
                    tx.execute(
                        "UPDATE companies SET location = ?2, industry = ?3, website = ?4
                         WHERE id = ?1",
                        params![id, fields.location, fields.industry, fields.website],
                    )?;
                    updated += 1;
                }
                None => {
                    tx.execute(
                        "INSERT INTO companies (company_name, location, industry, website)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![
                            fields.company_name,
                            fields.location,
                            fields.industry,
                            fields.website,
                        ],
                    )?;
                    inserted += 1;
                }
            }
        }

        tx.commit()?;
        Ok((inserted, updated))
    }

    // ============================================================
    // RESUMES
    // ============================================================

    pub fn list_resumes(&self) -> Result<Vec<Resume>, ApiError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, job_title, field, filename, url FROM resumes ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Resume {
                id: row.get(0)?,
                job_title: row.get(1)?,
                field: row.get(2)?,
                filename: row.get(3)?,
                url: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_resume(&self, id: &str) -> Result<Resume, ApiError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, job_title, field, filename, url FROM resumes WHERE id = ?1",
            params![id],
            |row| {
                Ok(Resume {
                    id: row.get(0)?,
                    job_title: row.get(1)?,
                    field: row.get(2)?,
                    filename: row.get(3)?,
                    url: row.get(4)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Resume not found".to_string()))
    }

    pub fn insert_resume(&self, resume: &Resume) -> Result<(), ApiError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO resumes (id, job_title, field, filename, url)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                resume.id,
                resume.job_title,
                resume.field,
                resume.filename,
                resume.url,
            ],
        )
        .map_err(conflict_on_constraint)?;
        Ok(())
    }

    pub fn update_resume(&self, resume: &Resume) -> Result<(), ApiError> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "UPDATE resumes
             SET job_title = ?2, field = ?3, filename = ?4, url = ?5
             WHERE id = ?1",
            params![
                resume.id,
                resume.job_title,
                resume.field,
                resume.filename,
                resume.url,
            ],
        )?;
        if affected == 0 {
            return Err(ApiError::NotFound("Resume not found".to_string()));
        }
        Ok(())
    }

    pub fn delete_resume(&self, id: &str) -> Result<(), ApiError> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute("DELETE FROM resumes WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(ApiError::NotFound("Resume not found".to_string()));
        }
        Ok(())
    }
}

/// Constraint violations become `Conflict`; everything else stays `Store`.
fn conflict_on_constraint(err: rusqlite::Error) -> ApiError {
    match err {
        rusqlite::Error::SqliteFailure(e, ref msg)
            if e.code == ErrorCode::ConstraintViolation =>
        {
            ApiError::Conflict(format!(
                "An error occurred: {}",
                msg.clone().unwrap_or_else(|| "constraint violation".to_string())
            ))
        }
        other => ApiError::Store(other),
    }
}
