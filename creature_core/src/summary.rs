//! Reverse index from items to the creatures that drop them

use crate::creature::Creature;
use crate::pipeline::json_files;
use crate::PipelineError;
use loot_core::{AggregatedDrop, QuantityRange};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One creature that drops an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSource {
    pub creature: String,
    /// Aggregated chance in percent
    pub chance: f64,
    pub quantity: QuantityRange,
}

/// Every creature dropping one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDrops {
    pub dropped_by: Vec<DropSource>,
    pub highest_chance: f64,
    pub lowest_chance: f64,
}

impl Default for ItemDrops {
    fn default() -> Self {
        ItemDrops {
            dropped_by: Vec::new(),
            highest_chance: 0.0,
            lowest_chance: 100.0,
        }
    }
}

impl ItemDrops {
    fn add(&mut self, source: DropSource) {
        self.highest_chance = self.highest_chance.max(source.chance);
        self.lowest_chance = self.lowest_chance.min(source.chance);
        self.dropped_by.push(source);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryIndex {
    pub total_creatures: usize,
    /// Creature counts keyed by type up to its first `_`
    pub creatures_by_type: BTreeMap<String, usize>,
    pub item_drops: BTreeMap<String, ItemDrops>,
}

impl SummaryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a creature and index its aggregated drops
    pub fn add_creature(&mut self, creature: &Creature) {
        self.total_creatures += 1;
        *self
            .creatures_by_type
            .entry(creature.base_type().to_string())
            .or_insert(0) += 1;

        for drop in creature.loot_items() {
            self.add_drop(&creature.basic_info.name, drop);
        }
    }

    fn add_drop(&mut self, creature: &str, drop: AggregatedDrop) {
        self.item_drops
            .entry(drop.name)
            .or_default()
            .add(DropSource {
                creature: creature.to_string(),
                chance: drop.effective_chance.value(),
                quantity: drop.quantity,
            });
    }

    /// Sort every item's sources, highest chance first
    pub fn finish(mut self) -> Self {
        for drops in self.item_drops.values_mut() {
            drops
                .dropped_by
                .sort_by(|a, b| b.chance.partial_cmp(&a.chance).unwrap_or(Ordering::Equal));
        }
        self
    }

    /// Build the index from every creature file in `dir`.
    ///
    /// Unreadable or malformed files are logged and skipped; their paths are
    /// returned alongside the index. Only a directory that cannot be listed
    /// is an error.
    pub fn scan_dir(dir: &Path) -> Result<(Self, Vec<PathBuf>), PipelineError> {
        let mut index = SummaryIndex::new();
        let mut failures = Vec::new();

        for path in json_files(dir)? {
            match read_creature(&path) {
                Ok(creature) => index.add_creature(&creature),
                Err(e) => {
                    tracing::error!("Skipping creature in summary: {}", e);
                    failures.push(path);
                }
            }
        }

        tracing::info!(
            "Indexed {} creatures, {} distinct items",
            index.total_creatures,
            index.item_drops.len()
        );
        Ok((index.finish(), failures))
    }
}

pub(crate) fn read_creature(path: &Path) -> Result<Creature, PipelineError> {
    let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Io {
        error: e,
        path: path.to_path_buf(),
    })?;
    serde_json::from_str(&content).map_err(|e| PipelineError::Json {
        error: e,
        path: path.to_path_buf(),
    })
}
