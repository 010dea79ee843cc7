//! tables_core - tiered DataTable loading for exported loot data
//!
//! Data tables live in a tier-partitioned tree (`<root>/Tier3/BaseResources_T3.json`).
//! [`TableRepository`] reads each `(name, tier)` pair at most once per run and
//! serves every later request from its cache.

mod config;
mod contents;
mod registry;
mod table;
pub mod tier;

pub use contents::{read_contents, write_contents, ContentsEntry, ContentsTable};
pub use registry::TableRepository;
pub use table::{asset_name, DataTable, DataTableItem};
pub use tier::Tier;

use std::path::PathBuf;
use thiserror::Error;

/// Error reading or writing data table files
#[derive(Debug, Error)]
pub enum TableError {
    #[error("IO error on '{path:?}': {error}")]
    Io {
        error: std::io::Error,
        path: PathBuf,
    },
    #[error("JSON error in '{path:?}': {error}")]
    Json {
        error: serde_json::Error,
        path: PathBuf,
    },
}
