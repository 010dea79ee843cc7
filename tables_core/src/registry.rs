use crate::config::ExportObject;
use crate::table::{cache_key, DataTable};
use crate::tier::Tier;
use crate::TableError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Run-scoped store of data tables, keyed by `(name, tier)`.
///
/// A table is read from disk the first time it is requested; every later
/// request for the same key returns the cached table. Missing or unreadable
/// files yield an empty table and never fail the caller.
#[derive(Debug)]
pub struct TableRepository {
    root: PathBuf,
    tables: HashMap<String, Rc<DataTable>>,
    disk_reads: usize,
    failures: Vec<PathBuf>,
}

impl TableRepository {
    /// Create an empty repository reading from `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        TableRepository {
            root: root.into(),
            tables: HashMap::new(),
            disk_reads: 0,
            failures: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Expected location of a table file
    pub fn table_path(&self, name: &str, tier: Tier) -> PathBuf {
        self.root.join(tier.dir_name()).join(format!("{}.json", name))
    }

    /// Get a table, loading it on first request
    pub fn get_table(&mut self, name: &str, tier: Tier) -> Rc<DataTable> {
        let key = cache_key(name, tier);
        if let Some(table) = self.tables.get(&key) {
            return Rc::clone(table);
        }

        let table = Rc::new(self.load_table(name, tier));
        self.tables.insert(key, Rc::clone(&table));
        table
    }

    /// Insert a table without touching disk. An already cached table wins.
    ///
    /// Returns true if the table was added.
    pub fn seed(&mut self, table: DataTable) -> bool {
        let key = table.cache_key();
        if self.tables.contains_key(&key) {
            return false;
        }
        self.tables.insert(key, Rc::new(table));
        true
    }

    /// Check if a table is cached
    pub fn contains(&self, name: &str, tier: Tier) -> bool {
        self.tables.contains_key(&cache_key(name, tier))
    }

    /// Number of cached tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of table files this repository tried to read
    pub fn disk_reads(&self) -> usize {
        self.disk_reads
    }

    /// Table files that existed but could not be read or parsed
    pub fn failures(&self) -> &[PathBuf] {
        &self.failures
    }

    fn load_table(&mut self, name: &str, tier: Tier) -> DataTable {
        let path = self.table_path(name, tier);
        self.disk_reads += 1;

        if !path.exists() {
            tracing::warn!("DataTable file not found: {}", path.display());
            return DataTable::empty(name, tier);
        }

        match read_export(&path) {
            Ok(objects) => match DataTable::from_export(name, tier, objects) {
                Some(table) => {
                    tracing::debug!(
                        "Loaded DataTable {} ({}) with {} items",
                        name,
                        tier,
                        table.items.len()
                    );
                    table
                }
                None => {
                    tracing::warn!("No rows found in DataTable: {}", name);
                    DataTable::empty(name, tier)
                }
            },
            Err(e) => {
                tracing::error!("Error loading DataTable {}: {}", name, e);
                self.failures.push(path);
                DataTable::empty(name, tier)
            }
        }
    }
}

fn read_export(path: &Path) -> Result<Vec<ExportObject>, TableError> {
    let content = std::fs::read_to_string(path).map_err(|e| TableError::Io {
        error: e,
        path: path.to_path_buf(),
    })?;

    serde_json::from_str(&content).map_err(|e| TableError::Json {
        error: e,
        path: path.to_path_buf(),
    })
}
