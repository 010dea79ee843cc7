//! `datatable_contents.json`: which items every loot template's tables hold.
//!
//! The listing doubles as a cache between runs. Feeding it back through
//! [`TableRepository::seed_from_contents`] restores every listed table without
//! reading the data table tree again.

use crate::registry::TableRepository;
use crate::table::{DataTable, DataTableItem};
use crate::tier::{self, Tier};
use crate::TableError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Items of one referenced table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentsTable {
    pub table_name: String,
    #[serde(with = "tier::digit")]
    pub tier: Tier,
    pub items: Vec<DataTableItem>,
}

/// All tables referenced by one loot template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentsEntry {
    pub name: String,
    pub tables: Vec<ContentsTable>,
}

impl From<&DataTable> for ContentsTable {
    fn from(table: &DataTable) -> Self {
        ContentsTable {
            table_name: table.name.clone(),
            tier: table.tier,
            items: table.items.clone(),
        }
    }
}

impl ContentsTable {
    pub fn to_table(&self) -> DataTable {
        DataTable {
            name: self.table_name.clone(),
            tier: self.tier,
            items: self.items.clone(),
        }
    }
}

/// Write the listing as pretty JSON, replacing any previous file
pub fn write_contents(path: &Path, entries: &[ContentsEntry]) -> Result<(), TableError> {
    let json = serde_json::to_string_pretty(entries).map_err(|e| TableError::Json {
        error: e,
        path: path.to_path_buf(),
    })?;

    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, json).map_err(|e| TableError::Io {
        error: e,
        path: temp_path.clone(),
    })?;
    std::fs::rename(&temp_path, path).map_err(|e| TableError::Io {
        error: e,
        path: path.to_path_buf(),
    })?;

    tracing::debug!("Wrote {} template listings to {}", entries.len(), path.display());
    Ok(())
}

/// Read a listing written by [`write_contents`]
pub fn read_contents(path: &Path) -> Result<Vec<ContentsEntry>, TableError> {
    let content = std::fs::read_to_string(path).map_err(|e| TableError::Io {
        error: e,
        path: path.to_path_buf(),
    })?;

    serde_json::from_str(&content).map_err(|e| TableError::Json {
        error: e,
        path: path.to_path_buf(),
    })
}

impl TableRepository {
    /// Seed the cache from a previous run's listing.
    ///
    /// Returns the number of tables added.
    pub fn seed_from_contents(&mut self, entries: &[ContentsEntry]) -> usize {
        entries
            .iter()
            .flat_map(|entry| entry.tables.iter())
            .filter(|table| self.seed(table.to_table()))
            .count()
    }
}
