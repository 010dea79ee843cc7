//! Loot templates: named groups of table references assigned to creatures
//!
//! Template files come in two forms. The simplified form is a single object
//! (`name`, `type`, `class`, `super`, `tables`). The raw export form is an
//! array of exported objects, one of which carries `Properties.Loot.Tables`.

use crate::types::{LootTableRef, ModifierValues, RunModifiers, TableReference};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error loading a loot template file
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("IO error reading '{path:?}': {error}")]
    Io {
        error: std::io::Error,
        path: PathBuf,
    },
    #[error("Parse error in '{path:?}': {error}")]
    Json {
        error: serde_json::Error,
        path: PathBuf,
    },
    #[error("Validation error in '{path:?}': {message}")]
    Validation { message: String, path: PathBuf },
}

/// A named group of table references
#[derive(Debug, Clone, PartialEq)]
pub struct LootTemplate {
    pub name: String,
    pub template_type: String,
    pub class: String,
    pub super_ref: Option<String>,
    pub tables: Vec<LootTableRef>,
}

// === Simplified form ===

#[derive(Debug, Deserialize)]
struct TemplateConfig {
    name: String,
    #[serde(rename = "type", default)]
    template_type: Option<String>,
    #[serde(default)]
    class: Option<String>,
    #[serde(rename = "super", default)]
    super_ref: Option<String>,
    #[serde(default)]
    tables: Vec<TableRefConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableRefConfig {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    table_name: Option<String>,
    #[serde(default)]
    object_name: Option<String>,
    #[serde(default)]
    table_path: Option<String>,
    #[serde(default)]
    object_path: Option<String>,
    #[serde(default)]
    run_chance: Option<f64>,
    #[serde(default)]
    min_iterations: Option<f64>,
    #[serde(default)]
    max_iterations: Option<f64>,
    #[serde(default)]
    per_iteration_run_chance: Option<f64>,
    #[serde(default)]
    min_quantity_multiplier: Option<f64>,
    #[serde(default)]
    max_quantity_multiplier: Option<f64>,
}

impl TableRefConfig {
    fn values(&self) -> ModifierValues {
        ModifierValues {
            run_chance: self.run_chance,
            min_iterations: self.min_iterations,
            max_iterations: self.max_iterations,
            per_iteration_run_chance: self.per_iteration_run_chance,
            min_quantity_multiplier: self.min_quantity_multiplier,
            max_quantity_multiplier: self.max_quantity_multiplier,
        }
    }

    fn reference(&self) -> Option<(TableReference, Option<String>)> {
        let name = non_empty(&self.name)
            .or_else(|| non_empty(&self.table_name))
            .or_else(|| non_empty(&self.object_name));
        let path = non_empty(&self.table_path).or_else(|| non_empty(&self.object_path));
        reference_from(name, path)
    }
}

// === Raw export form ===

#[derive(Debug, Deserialize)]
struct ExportObject {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Type", default)]
    object_type: Option<String>,
    #[serde(rename = "Class", default)]
    class: Option<String>,
    #[serde(rename = "Super", default)]
    super_ref: Option<ObjectRefConfig>,
    #[serde(rename = "Properties", default)]
    properties: Option<ExportProperties>,
}

#[derive(Debug, Default, Deserialize)]
struct ObjectRefConfig {
    #[serde(rename = "ObjectName", default)]
    object_name: Option<String>,
    #[serde(rename = "ObjectPath", default)]
    object_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExportProperties {
    #[serde(rename = "Loot", default)]
    loot: Option<ExportLoot>,
}

#[derive(Debug, Deserialize)]
struct ExportLoot {
    #[serde(rename = "bUseTables", default)]
    use_tables: Option<bool>,
    #[serde(rename = "Tables", default)]
    tables: Vec<ExportTableRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExportTableRef {
    #[serde(default)]
    table: Option<ObjectRefConfig>,
    #[serde(default)]
    run_chance: Option<f64>,
    #[serde(default)]
    min_iterations: Option<f64>,
    #[serde(default)]
    max_iterations: Option<f64>,
    #[serde(default)]
    per_iteration_run_chance: Option<f64>,
    #[serde(default)]
    min_quantity_multiplier: Option<f64>,
    #[serde(default)]
    max_quantity_multiplier: Option<f64>,
}

impl ExportTableRef {
    fn values(&self) -> ModifierValues {
        ModifierValues {
            run_chance: self.run_chance,
            min_iterations: self.min_iterations,
            max_iterations: self.max_iterations,
            per_iteration_run_chance: self.per_iteration_run_chance,
            min_quantity_multiplier: self.min_quantity_multiplier,
            max_quantity_multiplier: self.max_quantity_multiplier,
        }
    }

    fn reference(&self) -> Option<(TableReference, Option<String>)> {
        let table = self.table.as_ref()?;
        reference_from(non_empty(&table.object_name), non_empty(&table.object_path))
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn reference_from(
    name: Option<String>,
    path: Option<String>,
) -> Option<(TableReference, Option<String>)> {
    match (name, path) {
        (Some(name), path) => Some((TableReference::Named(name), path)),
        (None, Some(path)) => Some((TableReference::Path(path), None)),
        (None, None) => None,
    }
}

fn build_ref(
    template: &str,
    reference: Option<(TableReference, Option<String>)>,
    values: ModifierValues,
) -> Option<LootTableRef> {
    let (reference, path) = reference?;

    let mut adjustments = Vec::new();
    let modifiers = RunModifiers::from_values(values, &mut adjustments);
    for adjustment in adjustments {
        tracing::warn!("Template {}: {:?}: {}", template, reference, adjustment);
    }

    Some(LootTableRef {
        reference,
        path,
        modifiers,
    })
}

impl LootTemplate {
    /// Load a template from a JSON file in either form
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let content = std::fs::read_to_string(path).map_err(|e| TemplateError::Io {
            error: e,
            path: path.to_path_buf(),
        })?;

        let value: Value = serde_json::from_str(&content).map_err(|e| TemplateError::Json {
            error: e,
            path: path.to_path_buf(),
        })?;

        Self::from_value(value, path)
    }

    /// Build a template from parsed JSON; `path` is used for messages and as
    /// a fallback name.
    pub fn from_value(value: Value, path: &Path) -> Result<Self, TemplateError> {
        let json_err = |e| TemplateError::Json {
            error: e,
            path: path.to_path_buf(),
        };

        match value {
            Value::Array(_) => {
                let objects: Vec<ExportObject> = serde_json::from_value(value).map_err(json_err)?;
                Self::from_export(objects, path)
            }
            Value::Object(_) => {
                let config: TemplateConfig = serde_json::from_value(value).map_err(json_err)?;
                Ok(Self::from_config(config))
            }
            _ => Err(TemplateError::Validation {
                message: "expected a template object or an export array".to_string(),
                path: path.to_path_buf(),
            }),
        }
    }

    fn from_config(config: TemplateConfig) -> Self {
        let tables = config
            .tables
            .iter()
            .filter_map(|t| build_ref(&config.name, t.reference(), t.values()))
            .collect();

        LootTemplate {
            template_type: config.template_type.unwrap_or_else(|| "Unknown".to_string()),
            class: config.class.unwrap_or_else(|| "Unknown".to_string()),
            super_ref: config.super_ref,
            tables,
            name: config.name,
        }
    }

    fn from_export(objects: Vec<ExportObject>, path: &Path) -> Result<Self, TemplateError> {
        let class_info = objects.first().ok_or_else(|| TemplateError::Validation {
            message: "empty export".to_string(),
            path: path.to_path_buf(),
        })?;

        let data = objects
            .iter()
            .find(|o| o.properties.as_ref().is_some_and(|p| p.loot.is_some()))
            .ok_or_else(|| TemplateError::Validation {
                message: "missing Properties.Loot".to_string(),
                path: path.to_path_buf(),
            })?;

        let name = non_empty(&class_info.name)
            .map(|n| n.strip_prefix("Default__").map(str::to_string).unwrap_or(n))
            .or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "Unknown".to_string());

        let loot = data
            .properties
            .as_ref()
            .and_then(|p| p.loot.as_ref())
            .ok_or_else(|| TemplateError::Validation {
                message: "missing Properties.Loot".to_string(),
                path: path.to_path_buf(),
            })?;

        let is_loot_box = loot.use_tables == Some(true);
        if is_loot_box {
            tracing::debug!("Processing LootBox template: {}", name);
        }

        let tables = loot
            .tables
            .iter()
            .filter_map(|t| build_ref(&name, t.reference(), t.values()))
            .collect();

        let template_type = if is_loot_box {
            "LootBox".to_string()
        } else {
            data.object_type.clone().unwrap_or_else(|| "Unknown".to_string())
        };

        Ok(LootTemplate {
            template_type,
            class: data.class.clone().unwrap_or_else(|| "Unknown".to_string()),
            super_ref: class_info
                .super_ref
                .as_ref()
                .and_then(|s| non_empty(&s.object_name)),
            tables,
            name,
        })
    }
}

/// Lookup key for template names: lowercase, trailing `_C` removed
pub fn normalize_template_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_suffix("_c") {
        Some(stripped) => stripped.to_string(),
        None => lower,
    }
}

/// All templates of a run, looked up by normalized name
#[derive(Debug, Default)]
pub struct TemplateIndex {
    templates: HashMap<String, LootTemplate>,
}

impl TemplateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, replacing any with the same normalized name
    pub fn insert(&mut self, template: LootTemplate) {
        let key = normalize_template_name(&template.name);
        if let Some(previous) = self.templates.insert(key, template) {
            tracing::debug!("Template {} replaced by a later definition", previous.name);
        }
    }

    /// Find the template a creature names.
    ///
    /// Tries the normalized name, then `<name>_c`, then the name with its
    /// first `_t` written as `t`, then with its first `t` written as `_t`.
    pub fn find(&self, template_name: &str) -> Option<&LootTemplate> {
        let normalized = normalize_template_name(template_name);
        if let Some(template) = self.templates.get(&normalized) {
            return Some(template);
        }

        let alternatives = [
            format!("{}_c", normalized),
            normalized.replacen("_t", "t", 1),
            normalized.replacen('t', "_t", 1),
        ];

        let found = alternatives
            .iter()
            .find_map(|alt| self.templates.get(alt).map(|t| (alt, t)));

        match found {
            Some((alt, template)) => {
                tracing::debug!("Found template using alternative name {} for {}", alt, template_name);
                Some(template)
            }
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Templates sorted by name
    pub fn templates(&self) -> Vec<&LootTemplate> {
        let mut templates: Vec<&LootTemplate> = self.templates.values().collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        templates
    }

    /// Load every `.json` template under `dir`, recursively, in path order.
    ///
    /// Bad files are logged and skipped; their paths are returned.
    pub fn load_dir(&mut self, dir: &Path) -> Vec<PathBuf> {
        let mut failures = Vec::new();

        if !dir.exists() {
            tracing::warn!("Template directory not found: {}", dir.display());
            return failures;
        }

        let mut files = Vec::new();
        collect_json_files(dir, &mut files, &mut failures);
        files.sort();

        for path in files {
            match LootTemplate::load(&path) {
                Ok(template) => self.insert(template),
                Err(e) => {
                    tracing::error!("Skipping template: {}", e);
                    failures.push(path);
                }
            }
        }

        failures
    }
}

fn collect_json_files(dir: &Path, files: &mut Vec<PathBuf>, failures: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("Cannot read directory {}: {}", dir.display(), e);
            failures.push(dir.to_path_buf());
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_json_files(&path, files, failures);
        } else if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
}
