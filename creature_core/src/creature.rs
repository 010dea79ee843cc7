use loot_core::{AggregatedDrop, EnrichedTable};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// An exported creature record.
///
/// Only the fields the enricher reads are typed; everything else is carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creature {
    pub basic_info: BasicInfo,
    /// `None` only when the key is absent. Kept as raw JSON so an explicit
    /// `null` is written back as it was read.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub loot_template: Option<Value>,
    /// Left as raw JSON so creatures that are never enriched keep whatever
    /// loot data they arrived with, `null` included.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub loot: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub creature_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Computed loot of a creature
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreatureLoot {
    pub tables: Vec<EnrichedTable>,
    pub items: Vec<AggregatedDrop>,
}

/// A key that is present, even as `null`, deserializes to `Some`
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl Creature {
    /// Name of the creature's loot template, if it has one
    pub fn template_name(&self) -> Option<&str> {
        self.loot_template.as_ref().and_then(Value::as_str)
    }

    /// Group used for per-type counts: the type up to its first `_`
    pub fn base_type(&self) -> &str {
        self.basic_info
            .creature_type
            .split('_')
            .next()
            .unwrap_or_default()
    }

    /// Aggregated drops from `loot.items`, empty if absent or unreadable
    pub fn loot_items(&self) -> Vec<AggregatedDrop> {
        let Some(items) = self.loot.as_ref().and_then(|loot| loot.get("items")) else {
            return Vec::new();
        };

        match serde_json::from_value(items.clone()) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Unreadable loot items for {}: {}", self.basic_info.name, e);
                Vec::new()
            }
        }
    }
}
