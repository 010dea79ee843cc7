//! creature_core - per-creature drop catalogues
//!
//! This library provides:
//! - Creature: the exported creature record, with unknown fields preserved
//! - CreatureEnricher: resolves a creature's template into loot tables and drops
//! - SummaryIndex: which creatures drop each item, and how likely
//! - Pipeline: one run over templates, data tables and creature files
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use creature_core::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::load_from_path(Path::new("enricher.toml"))?;
//! let report = Pipeline::new(config).run()?;
//! println!("Enriched {} creatures", report.creatures_enriched);
//! ```

pub mod config;
pub mod creature;
pub mod enricher;
pub mod pipeline;
pub mod summary;

pub use config::PipelineConfig;
pub use creature::{BasicInfo, Creature, CreatureLoot};
pub use enricher::{CreatureEnricher, EnrichOutcome, Enrichment};
pub use pipeline::{Pipeline, RunContext, RunReport};
pub use summary::{DropSource, ItemDrops, SummaryIndex};

use std::path::PathBuf;
use thiserror::Error;

/// Error from a pipeline run or one of its files
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error on '{path:?}': {error}")]
    Io {
        error: std::io::Error,
        path: PathBuf,
    },
    #[error("JSON error in '{path:?}': {error}")]
    Json {
        error: serde_json::Error,
        path: PathBuf,
    },
    #[error("Config error in '{path:?}': {error}")]
    Config {
        error: toml::de::Error,
        path: PathBuf,
    },
    #[error(transparent)]
    Tables(#[from] tables_core::TableError),
}
