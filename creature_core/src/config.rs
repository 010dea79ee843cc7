//! Run configuration

use crate::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a run reads its inputs and writes its outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root of the tier-partitioned data table tree (`<root>/Tier3/X.json`)
    #[serde(default = "default_data_tables_dir")]
    pub data_tables_dir: PathBuf,
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
    #[serde(default = "default_creatures_dir")]
    pub creatures_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_enriched_dir_name")]
    pub enriched_dir_name: String,
    #[serde(default = "default_contents_file_name")]
    pub contents_file_name: String,
    #[serde(default = "default_summary_file_name")]
    pub summary_file_name: String,
    /// Seed the table cache from a previous run's contents listing
    #[serde(default)]
    pub reuse_contents: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            data_tables_dir: default_data_tables_dir(),
            templates_dir: default_templates_dir(),
            creatures_dir: default_creatures_dir(),
            output_dir: default_output_dir(),
            enriched_dir_name: default_enriched_dir_name(),
            contents_file_name: default_contents_file_name(),
            summary_file_name: default_summary_file_name(),
            reuse_contents: false,
        }
    }
}

impl PipelineConfig {
    /// Load a config from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Io {
            error: e,
            path: path.to_path_buf(),
        })?;
        toml::from_str(&content).map_err(|e| PipelineError::Config {
            error: e,
            path: path.to_path_buf(),
        })
    }

    pub fn enriched_dir(&self) -> PathBuf {
        self.output_dir.join(&self.enriched_dir_name)
    }

    pub fn contents_path(&self) -> PathBuf {
        self.output_dir.join(&self.contents_file_name)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(&self.summary_file_name)
    }
}

fn default_data_tables_dir() -> PathBuf {
    PathBuf::from("Mist/Content/Mist/Data/LootTables/LootTables")
}
fn default_templates_dir() -> PathBuf {
    PathBuf::from("output/loot_templates")
}
fn default_creatures_dir() -> PathBuf {
    PathBuf::from("output/creatures")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_enriched_dir_name() -> String {
    "enriched_creatures".to_string()
}
fn default_contents_file_name() -> String {
    "datatable_contents.json".to_string()
}
fn default_summary_file_name() -> String {
    "enriched_loot_summary.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_is_default() {
        let config: PipelineConfig = toml::from_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("enricher.toml");
        std::fs::write(
            &path,
            r#"
data_tables_dir = "export/LootTables"
output_dir = "out"
reuse_contents = true
"#,
        )
        .unwrap();

        let config = PipelineConfig::load_from_path(&path).unwrap();
        assert_eq!(config.data_tables_dir, PathBuf::from("export/LootTables"));
        assert!(config.reuse_contents);
        assert_eq!(config.creatures_dir, default_creatures_dir());
        assert_eq!(config.enriched_dir(), PathBuf::from("out/enriched_creatures"));
        assert_eq!(config.summary_path(), PathBuf::from("out/enriched_loot_summary.json"));
    }

    #[test]
    fn test_bad_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("enricher.toml");
        std::fs::write(&path, "output_dir = [").unwrap();
        assert!(matches!(
            PipelineConfig::load_from_path(&path),
            Err(PipelineError::Config { .. })
        ));
    }
}
