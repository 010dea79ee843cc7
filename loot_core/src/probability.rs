//! Drop chance and quantity math
//!
//! Per table, every iteration is an independent trial; across tables, chances
//! for the same item are combined as a union of independent events.

use crate::types::{
    AggregatedDrop, EnrichedDropEntry, EnrichedTable, Percent, QuantityRange, RunModifiers,
};
use indexmap::IndexMap;
use std::cmp::Ordering;
use tables_core::DataTableItem;

/// Probability (0-1) of getting an item at least once from one table run.
///
/// `base_percent` is the row chance in percent. With a single iteration this
/// is `run_chance * base`. With more, it is
/// `run_chance * (1 - (1 - base * per_iteration_run_chance)^max_iterations)`.
/// `min_iterations` does not take part.
pub fn effective_chance(base_percent: f64, modifiers: &RunModifiers) -> f64 {
    let base = (base_percent / 100.0).clamp(0.0, 1.0);

    if modifiers.max_iterations <= 1 {
        return modifiers.run_chance * base;
    }

    let per_trial = base * modifiers.per_iteration_run_chance;
    let iterations = i32::try_from(modifiers.max_iterations).unwrap_or(i32::MAX);
    let miss_every_trial = (1.0 - per_trial).powi(iterations);
    modifiers.run_chance * (1.0 - miss_every_trial)
}

/// Scale a row's quantity bounds by the table multipliers, rounding up
pub fn scale_quantity(min: u32, max: u32, modifiers: &RunModifiers) -> QuantityRange {
    let min = scale(min, modifiers.min_quantity_multiplier);
    let max = scale(max, modifiers.max_quantity_multiplier);
    QuantityRange {
        min,
        max: max.max(min),
    }
}

fn scale(quantity: u32, multiplier: f64) -> u32 {
    let scaled = (quantity as f64 * multiplier).ceil();
    if scaled <= 0.0 || scaled.is_nan() {
        0
    } else if scaled >= u32::MAX as f64 {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Drop entries for every item of one table, in row order
pub fn table_drops(items: &[DataTableItem], modifiers: &RunModifiers) -> Vec<EnrichedDropEntry> {
    items
        .iter()
        .map(|item| EnrichedDropEntry {
            name: item.name.clone(),
            path: item.path.clone(),
            base_chance: item.chance,
            effective_chance: Percent::from_fraction(effective_chance(item.chance, modifiers)),
            quantity: scale_quantity(item.min_quantity, item.max_quantity, modifiers),
        })
        .collect()
}

/// Chance of getting an item from either of two independent sources:
/// `a + b - a*b/100`, all in percent.
pub fn combine_chances(a: Percent, b: Percent) -> Percent {
    let (a, b) = (a.value(), b.value());
    Percent::new((a + b - a * b / 100.0).clamp(0.0, 100.0))
}

/// Merge the entries of all tables into one entry per item name.
///
/// Tables are folded in order. Repeated items combine their chances pairwise
/// and widen their quantity range. The result is sorted by chance, highest
/// first, keeping first-seen order among equal chances.
pub fn aggregate_drops<'a, I>(tables: I) -> Vec<AggregatedDrop>
where
    I: IntoIterator<Item = &'a EnrichedTable>,
{
    let mut merged: IndexMap<String, AggregatedDrop> = IndexMap::new();

    for table in tables {
        for entry in &table.items {
            match merged.get_mut(&entry.name) {
                Some(existing) => {
                    existing.effective_chance =
                        combine_chances(existing.effective_chance, entry.effective_chance);
                    existing.quantity = existing.quantity.union(&entry.quantity);
                }
                None => {
                    merged.insert(entry.name.clone(), entry.clone());
                }
            }
        }
    }

    let mut drops: Vec<AggregatedDrop> = merged.into_values().collect();
    drops.sort_by(|a, b| {
        b.effective_chance
            .partial_cmp(&a.effective_chance)
            .unwrap_or(Ordering::Equal)
    });
    drops
}
