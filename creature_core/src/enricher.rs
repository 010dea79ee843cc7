//! Per-creature loot resolution
//!
//! A creature names one template. The template's references are resolved to
//! data tables, each table's rows become drop entries under that reference's
//! modifiers, and the entries are merged into one list per creature.

use crate::creature::{Creature, CreatureLoot};
use loot_core::{
    aggregate_drops, creature_tier, resolve_template_tables, table_drops, EnrichedTable,
    TableRepository, TemplateIndex, Tier,
};

/// What happened to one creature
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichOutcome {
    /// No `lootTemplate` field
    NoTemplate,
    /// The named template is not loaded
    TemplateNotFound(String),
    /// The template resolves to no tables
    NoTables,
    /// `loot` was replaced with the computed tables and drops
    Enriched {
        tables: usize,
        skipped_tables: usize,
        items: usize,
    },
}

impl EnrichOutcome {
    pub fn is_enriched(&self) -> bool {
        matches!(self, EnrichOutcome::Enriched { .. })
    }
}

/// A creature after enrichment, with how it got there
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub creature: Creature,
    pub outcome: EnrichOutcome,
}

/// Enriches creatures against one run's templates and tables
pub struct CreatureEnricher<'a> {
    templates: &'a TemplateIndex,
    tables: &'a mut TableRepository,
}

impl<'a> CreatureEnricher<'a> {
    pub fn new(templates: &'a TemplateIndex, tables: &'a mut TableRepository) -> Self {
        CreatureEnricher { templates, tables }
    }

    /// Compute a creature's loot.
    ///
    /// Creatures without a template, with an unknown template, or whose
    /// template resolves to no tables come back unchanged. A table whose
    /// own tier differs from the creature's tier is skipped when both are
    /// known.
    pub fn enrich(&mut self, mut creature: Creature) -> serde_json::Result<Enrichment> {
        let Some(template_name) = creature.template_name().map(str::to_string) else {
            tracing::debug!("{} has no loot template", creature.basic_info.name);
            return Ok(Enrichment {
                creature,
                outcome: EnrichOutcome::NoTemplate,
            });
        };

        let Some(template) = self.templates.find(&template_name) else {
            tracing::warn!(
                "Loot template {} not found for {}",
                template_name,
                creature.basic_info.name
            );
            return Ok(Enrichment {
                creature,
                outcome: EnrichOutcome::TemplateNotFound(template_name),
            });
        };

        let resolved = resolve_template_tables(template);
        if resolved.is_empty() {
            tracing::debug!("Template {} has no tables", template.name);
            return Ok(Enrichment {
                creature,
                outcome: EnrichOutcome::NoTables,
            });
        }

        let creature_tier = creature_tier(&template_name);
        let mut tables = Vec::with_capacity(resolved.len());
        let mut skipped_tables = 0;

        for table_ref in &resolved {
            if tier_mismatch(creature_tier, table_ref.declared_tier) {
                tracing::debug!(
                    "Skipping {} for {}: table tier {:?}, creature tier {:?}",
                    table_ref.table_name,
                    creature.basic_info.name,
                    table_ref.declared_tier,
                    creature_tier
                );
                skipped_tables += 1;
                continue;
            }

            let tier = table_ref.tier();
            let data = self.tables.get_table(&table_ref.table_name, tier);
            tables.push(EnrichedTable {
                table_name: table_ref.table_name.clone(),
                table_path: table_ref.table_path.clone(),
                tier,
                modifiers: table_ref.modifiers,
                items: table_drops(&data.items, &table_ref.modifiers),
            });
        }

        let items = aggregate_drops(&tables);
        let outcome = EnrichOutcome::Enriched {
            tables: tables.len(),
            skipped_tables,
            items: items.len(),
        };

        creature.loot = Some(serde_json::to_value(CreatureLoot { tables, items })?);
        Ok(Enrichment { creature, outcome })
    }
}

fn tier_mismatch(creature: Option<Tier>, table: Option<Tier>) -> bool {
    matches!((creature, table), (Some(c), Some(t)) if c != t)
}
