use indexmap::IndexMap;
use serde::Deserialize;

/// One object from an exported asset file. Data table files hold an array of
/// these, and only the one typed `DataTable` carries rows.
#[derive(Debug, Deserialize)]
pub struct ExportObject {
    #[serde(rename = "Type", default)]
    pub object_type: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Rows", default)]
    pub rows: Option<IndexMap<String, RowConfig>>,
}

impl ExportObject {
    pub fn is_data_table(&self) -> bool {
        self.object_type.as_deref() == Some("DataTable") && self.rows.is_some()
    }
}

/// A single data table row
#[derive(Debug, Default, Deserialize)]
pub struct RowConfig {
    #[serde(rename = "Item", default)]
    pub item: Option<AssetRefConfig>,
    #[serde(rename = "Chance", default)]
    pub chance: Option<f64>,
    #[serde(rename = "MinQuantity", default)]
    pub min_quantity: Option<f64>,
    #[serde(rename = "MaxQuantity", default)]
    pub max_quantity: Option<f64>,
}

/// Soft reference to another asset
#[derive(Debug, Default, Deserialize)]
pub struct AssetRefConfig {
    #[serde(rename = "AssetPathName", default)]
    pub asset_path_name: Option<String>,
}

impl RowConfig {
    /// Asset path of the dropped item, if the row references one
    pub fn item_path(&self) -> Option<&str> {
        self.item
            .as_ref()
            .and_then(|i| i.asset_path_name.as_deref())
            .filter(|p| !p.is_empty())
    }
}
