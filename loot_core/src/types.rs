use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tables_core::Tier;

/// A percentage (0-100) kept at the four decimal places it is published with.
///
/// Serializes as a fixed four-decimal string (`"75.0000"`), and reads back
/// from either that string or a plain number.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Percent(f64);

impl Percent {
    pub const ZERO: Percent = Percent(0.0);

    pub fn new(value: f64) -> Self {
        if !value.is_finite() {
            return Percent::ZERO;
        }
        let rounded = format!("{:.4}", value).parse().unwrap_or(value);
        Percent(rounded)
    }

    /// Build from a probability in [0, 1]
    pub fn from_fraction(fraction: f64) -> Self {
        Percent::new(fraction * 100.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

impl Serialize for Percent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Percent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(Percent::new(v)),
            Raw::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Percent::new)
                .map_err(|_| serde::de::Error::custom(format!("invalid percentage '{}'", s))),
        }
    }
}

/// Inclusive quantity range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuantityRange {
    pub min: u32,
    pub max: u32,
}

impl QuantityRange {
    /// Widen to cover both ranges
    pub fn union(&self, other: &QuantityRange) -> QuantityRange {
        QuantityRange {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// How often a loot table runs and how its quantities scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunModifiers {
    /// Chance the table runs at all (0-1)
    pub run_chance: f64,
    pub min_iterations: u32,
    pub max_iterations: u32,
    /// Chance each iteration runs (0-1)
    pub per_iteration_run_chance: f64,
    pub min_quantity_multiplier: f64,
    pub max_quantity_multiplier: f64,
}

impl Default for RunModifiers {
    fn default() -> Self {
        RunModifiers {
            run_chance: 1.0,
            min_iterations: 1,
            max_iterations: 1,
            per_iteration_run_chance: 1.0,
            min_quantity_multiplier: 1.0,
            max_quantity_multiplier: 1.0,
        }
    }
}

/// Optional modifier values as they appear in template files
#[derive(Debug, Clone, Copy, Default)]
pub struct ModifierValues {
    pub run_chance: Option<f64>,
    pub min_iterations: Option<f64>,
    pub max_iterations: Option<f64>,
    pub per_iteration_run_chance: Option<f64>,
    pub min_quantity_multiplier: Option<f64>,
    pub max_quantity_multiplier: Option<f64>,
}

impl RunModifiers {
    /// Fill defaults and bring every value into its valid range.
    ///
    /// Each adjustment is described in `adjustments`.
    pub fn from_values(values: ModifierValues, adjustments: &mut Vec<String>) -> Self {
        let defaults = RunModifiers::default();

        let run_chance = clamp_probability(
            "runChance",
            values.run_chance.unwrap_or(defaults.run_chance),
            adjustments,
        );
        let per_iteration_run_chance = clamp_probability(
            "perIterationRunChance",
            values
                .per_iteration_run_chance
                .unwrap_or(defaults.per_iteration_run_chance),
            adjustments,
        );

        let min_iterations = to_iterations(
            "minIterations",
            values.min_iterations,
            defaults.min_iterations,
            1,
            adjustments,
        );
        let max_iterations = to_iterations(
            "maxIterations",
            values.max_iterations,
            defaults.max_iterations,
            1,
            adjustments,
        );

        let min_quantity_multiplier = clamp_multiplier(
            "minQuantityMultiplier",
            values
                .min_quantity_multiplier
                .unwrap_or(defaults.min_quantity_multiplier),
            0.0,
            adjustments,
        );
        let max_quantity_multiplier = clamp_multiplier(
            "maxQuantityMultiplier",
            values
                .max_quantity_multiplier
                .unwrap_or(defaults.max_quantity_multiplier),
            0.0,
            adjustments,
        );

        RunModifiers {
            run_chance,
            min_iterations,
            max_iterations,
            per_iteration_run_chance,
            min_quantity_multiplier,
            max_quantity_multiplier,
        }
    }
}

fn clamp_probability(field: &str, value: f64, adjustments: &mut Vec<String>) -> f64 {
    if value.is_nan() {
        adjustments.push(format!("{} is not a number, using 1", field));
        return 1.0;
    }
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        adjustments.push(format!("{} {} clamped to {}", field, value, clamped));
    }
    clamped
}

fn to_iterations(
    field: &str,
    value: Option<f64>,
    default: u32,
    floor: u32,
    adjustments: &mut Vec<String>,
) -> u32 {
    let raw = match value {
        Some(v) if v.is_finite() => v,
        Some(v) => {
            adjustments.push(format!("{} {} is not finite, using {}", field, v, floor));
            return floor.max(default);
        }
        None => return default.max(floor),
    };

    if raw.fract() != 0.0 {
        adjustments.push(format!("{} {} truncated", field, raw));
    }
    let whole = raw.trunc();
    if whole < floor as f64 {
        adjustments.push(format!("{} {} raised to {}", field, raw, floor));
        return floor;
    }
    if whole > u32::MAX as f64 {
        return u32::MAX;
    }
    whole as u32
}

fn clamp_multiplier(field: &str, value: f64, floor: f64, adjustments: &mut Vec<String>) -> f64 {
    if !value.is_finite() {
        adjustments.push(format!("{} {} is not finite, using {}", field, value, floor.max(1.0)));
        return floor.max(1.0);
    }
    if value < floor {
        adjustments.push(format!("{} {} raised to {}", field, value, floor));
        return floor;
    }
    value
}

/// The two ways a template can point at a data table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableReference {
    /// Object name, e.g. `DataTable'BaseResources_T2'` or plain `BaseResources_T2`
    Named(String),
    /// Object path, e.g. `Mist/Content/Mist/Data/LootTables/LootTables/Tier2/BaseResources_T2.0`
    Path(String),
}

/// A template's reference to a data table plus its run modifiers
#[derive(Debug, Clone, PartialEq)]
pub struct LootTableRef {
    pub reference: TableReference,
    /// Object path kept alongside a named reference; used for tier lookup
    pub path: Option<String>,
    pub modifiers: RunModifiers,
}

impl LootTableRef {
    pub fn named(name: impl Into<String>) -> Self {
        LootTableRef {
            reference: TableReference::Named(name.into()),
            path: None,
            modifiers: RunModifiers::default(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_modifiers(mut self, modifiers: RunModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// One item a table can yield, with the chance of getting it from that table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedDropEntry {
    pub name: String,
    pub path: String,
    /// Row chance in percent (0-100)
    pub base_chance: f64,
    pub effective_chance: Percent,
    pub quantity: QuantityRange,
}

/// Creature-level drop: the same shape, with `effective_chance` combined
/// across every table yielding the item.
pub type AggregatedDrop = EnrichedDropEntry;

/// A resolved table with the drops it contributes to a creature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTable {
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_path: Option<String>,
    pub tier: Tier,
    #[serde(flatten)]
    pub modifiers: RunModifiers,
    pub items: Vec<EnrichedDropEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds_and_serializes() {
        let p = Percent::new(75.0);
        assert_eq!(serde_json::to_string(&p).unwrap(), r#""75.0000""#);

        let p = Percent::new(12.345678);
        assert_eq!(p.value(), 12.3457);
        assert_eq!(p.to_string(), "12.3457");
    }

    #[test]
    fn test_percent_reads_string_or_number() {
        let a: Percent = serde_json::from_str(r#""42.5000""#).unwrap();
        let b: Percent = serde_json::from_str("42.5").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<Percent>(r#""lots""#).is_err());
    }

    #[test]
    fn test_quantity_union() {
        let a = QuantityRange { min: 2, max: 4 };
        let b = QuantityRange { min: 1, max: 3 };
        assert_eq!(a.union(&b), QuantityRange { min: 1, max: 4 });
    }

    #[test]
    fn test_modifiers_defaults() {
        let mut adjustments = Vec::new();
        let m = RunModifiers::from_values(ModifierValues::default(), &mut adjustments);
        assert_eq!(m, RunModifiers::default());
        assert!(adjustments.is_empty());
    }

    #[test]
    fn test_modifiers_are_brought_into_range() {
        let mut adjustments = Vec::new();
        let m = RunModifiers::from_values(
            ModifierValues {
                run_chance: Some(1.5),
                min_iterations: Some(0.0),
                max_iterations: Some(3.0),
                per_iteration_run_chance: Some(-0.2),
                min_quantity_multiplier: Some(2.0),
                max_quantity_multiplier: Some(1.0),
            },
            &mut adjustments,
        );

        assert_eq!(m.run_chance, 1.0);
        assert_eq!(m.min_iterations, 1);
        assert_eq!(m.max_iterations, 3);
        assert_eq!(m.per_iteration_run_chance, 0.0);
        assert_eq!(m.min_quantity_multiplier, 2.0);
        assert_eq!(m.max_quantity_multiplier, 1.0);
        assert_eq!(adjustments.len(), 3);
    }

    #[test]
    fn test_max_values_independent_of_min() {
        let mut adjustments = Vec::new();
        let m = RunModifiers::from_values(
            ModifierValues {
                min_iterations: Some(3.0),
                max_iterations: Some(1.0),
                min_quantity_multiplier: Some(2.0),
                max_quantity_multiplier: Some(0.5),
                ..Default::default()
            },
            &mut adjustments,
        );
        assert_eq!(m.min_iterations, 3);
        assert_eq!(m.max_iterations, 1);
        assert_eq!(m.max_quantity_multiplier, 0.5);
        assert!(adjustments.is_empty());
    }

    #[test]
    fn test_max_values_floored() {
        let mut adjustments = Vec::new();
        let m = RunModifiers::from_values(
            ModifierValues {
                max_iterations: Some(0.0),
                max_quantity_multiplier: Some(-1.0),
                ..Default::default()
            },
            &mut adjustments,
        );
        assert_eq!(m.max_iterations, 1);
        assert_eq!(m.max_quantity_multiplier, 0.0);
        assert_eq!(adjustments.len(), 2);
    }

    #[test]
    fn test_enriched_table_shape() {
        let table = EnrichedTable {
            table_name: "Ammo_T2".to_string(),
            table_path: None,
            tier: Tier::T2,
            modifiers: RunModifiers::default(),
            items: Vec::new(),
        };
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["tableName"], "Ammo_T2");
        assert_eq!(json["tier"], "T2");
        assert_eq!(json["runChance"], 1.0);
        assert_eq!(json["maxIterations"], 1);
        assert!(json.get("tablePath").is_none());
    }
}
