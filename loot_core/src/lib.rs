//! loot_core - resolves loot templates into per-item drop probabilities
//!
//! This library provides:
//! - Reference resolution: table names and tiers from template references
//! - Probability: per-table effective chance and quantity ranges
//! - Aggregation: one combined entry per item across a creature's tables
//! - Templates: parsing simplified and raw exported loot templates

pub mod probability;
pub mod resolver;
pub mod template;
pub mod types;

pub use probability::{aggregate_drops, combine_chances, effective_chance, table_drops};
pub use resolver::{creature_tier, extract_table_name, resolve_template_tables, resolve_tier, ResolvedTable};
pub use template::{LootTemplate, TemplateError, TemplateIndex};
pub use types::{
    AggregatedDrop, EnrichedDropEntry, EnrichedTable, LootTableRef, Percent, QuantityRange,
    RunModifiers, TableReference,
};

// Re-export the data table types the engine consumes
pub use tables_core::{DataTable, DataTableItem, TableRepository, Tier};
