use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Progression bucket shared by data tables, templates and creatures
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub enum Tier {
    #[default]
    T1,
    T2,
    T3,
    T4,
}

impl Tier {
    pub fn all() -> &'static [Tier] {
        &[Tier::T1, Tier::T2, Tier::T3, Tier::T4]
    }

    /// Build a tier from its number (1-4)
    pub fn from_number(n: u32) -> Option<Tier> {
        match n {
            1 => Some(Tier::T1),
            2 => Some(Tier::T2),
            3 => Some(Tier::T3),
            4 => Some(Tier::T4),
            _ => None,
        }
    }

    pub fn number(&self) -> u32 {
        match self {
            Tier::T1 => 1,
            Tier::T2 => 2,
            Tier::T3 => 3,
            Tier::T4 => 4,
        }
    }

    /// Directory holding this tier's data tables, e.g. `Tier3`
    pub fn dir_name(&self) -> String {
        format!("Tier{}", self.number())
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tier '{0}'")]
pub struct ParseTierError(pub String);

impl FromStr for Tier {
    type Err = ParseTierError;

    /// Accepts `3`, `T3`, `t3` and `Tier3`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        let digits = lower
            .strip_prefix("tier")
            .or_else(|| lower.strip_prefix('t'))
            .unwrap_or(&lower);

        digits
            .parse::<u32>()
            .ok()
            .and_then(Tier::from_number)
            .ok_or_else(|| ParseTierError(trimmed.to_string()))
    }
}

impl From<Tier> for String {
    fn from(tier: Tier) -> Self {
        tier.to_string()
    }
}

impl TryFrom<String> for Tier {
    type Error = ParseTierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Serde adapter writing a tier as its bare number string (`"3"`), the form
/// used by data table listings.
pub mod digit {
    use super::Tier;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(tier: &Tier, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&tier.number().to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Tier, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
