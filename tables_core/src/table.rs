use crate::config::{ExportObject, RowConfig};
use crate::tier::{self, Tier};
use serde::{Deserialize, Serialize};

/// A droppable item row with its base chance and quantity bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTableItem {
    pub name: String,
    pub path: String,
    /// Base chance in percent (0-100)
    pub chance: f64,
    pub min_quantity: u32,
    pub max_quantity: u32,
}

/// A tiered, named collection of droppable items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub name: String,
    #[serde(with = "tier::digit")]
    pub tier: Tier,
    pub items: Vec<DataTableItem>,
}

impl DataTable {
    pub fn empty(name: impl Into<String>, tier: Tier) -> Self {
        DataTable {
            name: name.into(),
            tier,
            items: Vec::new(),
        }
    }

    /// Build a table from the objects of an exported data table file.
    ///
    /// Returns `None` when no object in the file is a data table with rows.
    pub fn from_export(name: &str, tier: Tier, objects: Vec<ExportObject>) -> Option<Self> {
        let object = objects.into_iter().find(ExportObject::is_data_table)?;
        let rows = object.rows.unwrap_or_default();

        let items = rows.values().filter_map(DataTableItem::from_row).collect();

        Some(DataTable {
            name: name.to_string(),
            tier,
            items,
        })
    }

    /// Cache identity, e.g. `BaseResources_T3`
    pub fn cache_key(&self) -> String {
        cache_key(&self.name, self.tier)
    }
}

impl DataTableItem {
    /// Rows without an item reference produce nothing
    fn from_row(row: &RowConfig) -> Option<Self> {
        let path = row.item_path()?;
        let min_quantity = to_quantity(row.min_quantity);
        let max_quantity = to_quantity(row.max_quantity);

        Some(DataTableItem {
            name: asset_name(path).to_string(),
            path: path.to_string(),
            chance: row.chance.unwrap_or(0.0),
            min_quantity,
            max_quantity: max_quantity.max(min_quantity),
        })
    }
}

pub(crate) fn cache_key(name: &str, tier: Tier) -> String {
    format!("{}_{}", name, tier)
}

/// Final path segment with its extension removed:
/// `/Game/Items/Wood.Wood` becomes `Wood`.
pub fn asset_name(path: &str) -> &str {
    let base = path.rsplit('/').next().unwrap_or(path);
    match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    }
}

fn to_quantity(raw: Option<f64>) -> u32 {
    match raw {
        Some(v) if v.is_finite() && v > 0.0 => v.round() as u32,
        _ => 0,
    }
}
