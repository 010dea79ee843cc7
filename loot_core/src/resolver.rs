//! Table names and tiers from template references

use crate::template::LootTemplate;
use crate::types::{LootTableRef, RunModifiers, TableReference};
use regex::Regex;
use std::sync::LazyLock;
use tables_core::Tier;

static TIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:_t|tier)([1-4])(?:[^0-9]|$)").unwrap());

static TEMPLATE_TIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)_t([1-4])(?:_|$)").unwrap());

static OBJECT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:DataTable|Object)'([^']+)'").unwrap());

/// A template reference resolved to a concrete data table
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTable {
    pub table_name: String,
    pub table_path: Option<String>,
    /// Tier named by the reference itself, if any
    pub declared_tier: Option<Tier>,
    pub modifiers: RunModifiers,
}

impl ResolvedTable {
    /// Tier used for the data table lookup; T1 when the reference names none
    pub fn tier(&self) -> Tier {
        self.declared_tier.unwrap_or_default()
    }
}

/// Find a `_T{n}` or `Tier{n}` marker (case-insensitive) in a path or name
pub fn resolve_tier(path_or_name: &str) -> Option<Tier> {
    TIER_RE
        .captures(path_or_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .and_then(Tier::from_number)
}

/// Tier of a creature, read from its loot template name.
///
/// Stricter than [`resolve_tier`]: only `_T{n}` followed by `_` or the end
/// of the name counts, so `EasyRupu_T2_Q` is T2 but `EasyRupu_T2Q` has no tier.
pub fn creature_tier(template_name: &str) -> Option<Tier> {
    TEMPLATE_TIER_RE
        .captures(template_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .and_then(Tier::from_number)
}

/// Canonical table name of a reference.
///
/// Named references unwrap `DataTable'X'`; path references take the last
/// segment before its extension. Returns `None` if nothing usable remains.
pub fn extract_table_name(reference: &TableReference) -> Option<String> {
    let name = match reference {
        TableReference::Named(raw) => match OBJECT_NAME_RE.captures(raw) {
            Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or_default(),
            None => raw.as_str(),
        },
        TableReference::Path(path) => path
            .rsplit(['/', '\\'])
            .next()
            .and_then(|last| last.split('.').next())
            .unwrap_or_default(),
    };

    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Resolve one reference. Path markers win over name markers for the tier.
pub fn resolve_reference(table_ref: &LootTableRef) -> Option<ResolvedTable> {
    let table_name = extract_table_name(&table_ref.reference)?;

    let table_path = match &table_ref.reference {
        TableReference::Path(path) => Some(path.clone()),
        TableReference::Named(_) => table_ref.path.clone(),
    };

    let declared_tier = table_path
        .as_deref()
        .and_then(resolve_tier)
        .or_else(|| resolve_tier(&table_name));

    Some(ResolvedTable {
        table_name,
        table_path,
        declared_tier,
        modifiers: table_ref.modifiers,
    })
}

/// Resolve a template's references in order, dropping any that name no table
pub fn resolve_template_tables(template: &LootTemplate) -> Vec<ResolvedTable> {
    template
        .tables
        .iter()
        .filter_map(|table_ref| {
            let resolved = resolve_reference(table_ref);
            if resolved.is_none() {
                tracing::debug!(
                    "Discarding unresolvable table reference {:?} in {}",
                    table_ref.reference,
                    template.name
                );
            }
            resolved
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creature_tier() {
        assert_eq!(creature_tier("EasyRupu_T2"), Some(Tier::T2));
        assert_eq!(creature_tier("EasyRupu_T2_Q_C"), Some(Tier::T2));
        assert_eq!(creature_tier("hardrupu_t3"), Some(Tier::T3));
        assert_eq!(creature_tier("EasyRupu_T2Q"), None);
        assert_eq!(creature_tier("RupuTier2"), None);
        assert_eq!(creature_tier("Rupu_T5"), None);
    }

    #[test]
    fn test_resolve_tier_patterns() {
        assert_eq!(resolve_tier("BaseResources_T3"), Some(Tier::T3));
        assert_eq!(resolve_tier("ammo_t1"), Some(Tier::T1));
        assert_eq!(resolve_tier("EasyRupu_T2_Q_C"), Some(Tier::T2));
        assert_eq!(
            resolve_tier("Mist/Content/Mist/Data/LootTables/LootTables/Tier4/Armors.0"),
            Some(Tier::T4)
        );
        assert_eq!(resolve_tier("tier2"), Some(Tier::T2));
        assert_eq!(resolve_tier("Rupu_T5"), None);
        assert_eq!(resolve_tier("Rupu_T12"), None);
        assert_eq!(resolve_tier("Generic"), None);
    }

    #[test]
    fn test_extract_named() {
        let name = extract_table_name(&TableReference::Named(
            "DataTable'BaseResources_T2'".to_string(),
        ));
        assert_eq!(name.as_deref(), Some("BaseResources_T2"));

        let name = extract_table_name(&TableReference::Named("Object'Armors_T1'".to_string()));
        assert_eq!(name.as_deref(), Some("Armors_T1"));

        let name = extract_table_name(&TableReference::Named("Plain_T3".to_string()));
        assert_eq!(name.as_deref(), Some("Plain_T3"));
    }

    #[test]
    fn test_extract_path() {
        let name = extract_table_name(&TableReference::Path(
            "Mist/Content/Mist/Data/LootTables/LootTables/Tier4/BaseResources_T4.0".to_string(),
        ));
        assert_eq!(name.as_deref(), Some("BaseResources_T4"));
    }

    #[test]
    fn test_extract_unusable() {
        assert!(extract_table_name(&TableReference::Named("   ".to_string())).is_none());
        assert!(extract_table_name(&TableReference::Path("Mist/Data/".to_string())).is_none());
    }

    #[test]
    fn test_path_tier_wins() {
        let table_ref = LootTableRef::named("DataTable'Resources_T1'")
            .with_path("Mist/Data/LootTables/Tier3/Resources_T1.0");
        let resolved = resolve_reference(&table_ref).unwrap();
        assert_eq!(resolved.table_name, "Resources_T1");
        assert_eq!(resolved.declared_tier, Some(Tier::T3));
    }

    #[test]
    fn test_unmarked_reference_defaults_to_t1() {
        let resolved = resolve_reference(&LootTableRef::named("Generic")).unwrap();
        assert_eq!(resolved.declared_tier, None);
        assert_eq!(resolved.tier(), Tier::T1);
    }

    #[test]
    fn test_resolve_template_keeps_order_and_modifiers() {
        let boosted = RunModifiers {
            run_chance: 0.5,
            max_iterations: 3,
            ..RunModifiers::default()
        };
        let template = LootTemplate {
            name: "EasyRupu_T2".to_string(),
            template_type: "EasyRupu_T2_C".to_string(),
            class: "BlueprintGeneratedClass".to_string(),
            super_ref: None,
            tables: vec![
                LootTableRef::named("DataTable'Ammo_T2'").with_modifiers(boosted),
                LootTableRef::named(""),
                LootTableRef {
                    reference: TableReference::Path("Data/Tier2/Food_T2.0".to_string()),
                    path: None,
                    modifiers: RunModifiers::default(),
                },
            ],
        };

        let resolved = resolve_template_tables(&template);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].table_name, "Ammo_T2");
        assert_eq!(resolved[0].modifiers, boosted);
        assert_eq!(resolved[1].table_name, "Food_T2");
        assert_eq!(resolved[1].table_path.as_deref(), Some("Data/Tier2/Food_T2.0"));
    }
}
