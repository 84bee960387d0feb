//! Talent Registry Backend
//!
//! Company directory persisted in SQLite and mirrored to a human-editable
//! CSV file, plus resume uploads whose binary artifacts are kept in lockstep
//! with their database rows.

pub mod api;
pub mod artifacts;
pub mod companies;
pub mod config;
pub mod error;
pub mod import;
pub mod lookup;
pub mod mirror;
pub mod resumes;
pub mod store;
