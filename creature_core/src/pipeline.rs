//! One enrichment run, from data tables and templates to the summary report

use crate::config::PipelineConfig;
use crate::enricher::CreatureEnricher;
use crate::summary::{read_creature, SummaryIndex};
use crate::PipelineError;
use loot_core::{resolve_template_tables, TableRepository, TemplateIndex};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tables_core::{read_contents, write_contents, ContentsEntry, ContentsTable};

/// Counts from a finished run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Tables held by the cache at the end of the run
    pub tables_loaded: usize,
    pub disk_reads: usize,
    pub templates_loaded: usize,
    pub creatures_processed: usize,
    pub creatures_enriched: usize,
    /// Files that could not be read, parsed or written
    pub failures: Vec<PathBuf>,
}

/// Everything a run shares between its steps. Dropped when the run ends.
#[derive(Debug)]
pub struct RunContext {
    pub config: PipelineConfig,
    pub tables: TableRepository,
    pub templates: TemplateIndex,
    report: RunReport,
}

impl RunContext {
    pub fn new(config: PipelineConfig) -> Self {
        let tables = TableRepository::new(&config.data_tables_dir);
        RunContext {
            config,
            tables,
            templates: TemplateIndex::new(),
            report: RunReport::default(),
        }
    }

    fn create_output_dirs(&self) -> Result<(), PipelineError> {
        for dir in [&self.config.output_dir, &self.config.enriched_dir()] {
            std::fs::create_dir_all(dir).map_err(|e| PipelineError::Io {
                error: e,
                path: dir.clone(),
            })?;
        }
        Ok(())
    }

    /// Seed the table cache from a previous contents listing, if there is one
    pub fn reuse_contents(&mut self) {
        let path = self.config.contents_path();
        if !path.exists() {
            tracing::debug!("No contents listing at {}", path.display());
            return;
        }

        match read_contents(&path) {
            Ok(entries) => {
                let seeded = self.tables.seed_from_contents(&entries);
                tracing::info!("Seeded {} tables from {}", seeded, path.display());
            }
            Err(e) => tracing::warn!("Ignoring contents listing: {}", e),
        }
    }

    pub fn load_templates(&mut self) {
        let failures = self.templates.load_dir(&self.config.templates_dir);
        tracing::info!("Loaded {} loot templates", self.templates.len());
        self.report.failures.extend(failures);
    }

    /// Resolve every template's tables and write the contents listing
    pub fn write_contents(&mut self) -> Result<Vec<ContentsEntry>, PipelineError> {
        let mut entries = Vec::with_capacity(self.templates.len());

        for template in self.templates.templates() {
            let tables = resolve_template_tables(template)
                .iter()
                .map(|resolved| {
                    let table = self.tables.get_table(&resolved.table_name, resolved.tier());
                    ContentsTable::from(table.as_ref())
                })
                .collect();
            entries.push(ContentsEntry {
                name: template.name.clone(),
                tables,
            });
        }

        write_contents(&self.config.contents_path(), &entries)?;
        tracing::info!(
            "Loaded {} data tables ({} read from disk)",
            self.tables.len(),
            self.tables.disk_reads()
        );
        Ok(entries)
    }

    /// Enrich every creature file and write the results under the enriched
    /// directory with the same file names
    pub fn enrich_creatures(&mut self) -> Result<(), PipelineError> {
        let source_dir = self.config.creatures_dir.clone();
        if !source_dir.exists() {
            tracing::warn!("Creature directory not found: {}", source_dir.display());
            return Ok(());
        }

        let target_dir = self.config.enriched_dir();
        let mut enricher = CreatureEnricher::new(&self.templates, &mut self.tables);

        for path in json_files(&source_dir)? {
            let creature = match read_creature(&path) {
                Ok(creature) => creature,
                Err(e) => {
                    tracing::error!("Skipping creature: {}", e);
                    self.report.failures.push(path);
                    continue;
                }
            };
            self.report.creatures_processed += 1;

            let enrichment = match enricher.enrich(creature) {
                Ok(enrichment) => enrichment,
                Err(e) => {
                    tracing::error!("Cannot enrich {}: {}", path.display(), e);
                    self.report.failures.push(path);
                    continue;
                }
            };

            let Some(file_name) = path.file_name() else {
                continue;
            };
            let target = target_dir.join(file_name);
            if let Err(e) = write_json(&target, &enrichment.creature) {
                tracing::error!("Cannot write enriched creature: {}", e);
                self.report.failures.push(target);
                continue;
            }

            if enrichment.outcome.is_enriched() {
                self.report.creatures_enriched += 1;
            }
        }

        tracing::info!(
            "Processed {} creatures, enriched {}",
            self.report.creatures_processed,
            self.report.creatures_enriched
        );
        Ok(())
    }

    /// Index the enriched directory and write the summary report
    pub fn write_summary(&mut self) -> Result<SummaryIndex, PipelineError> {
        let (summary, failures) = SummaryIndex::scan_dir(&self.config.enriched_dir())?;
        self.report.failures.extend(failures);
        write_json(&self.config.summary_path(), &summary)?;
        Ok(summary)
    }

    /// Final counts. Table load failures are folded into the file failures.
    pub fn into_report(self) -> RunReport {
        let mut report = self.report;
        report.tables_loaded = self.tables.len();
        report.disk_reads = self.tables.disk_reads();
        report.templates_loaded = self.templates.len();
        report.failures.extend(self.tables.failures().iter().cloned());
        report.failures.sort();
        report.failures.dedup();
        report
    }
}

/// Runs the whole enrichment for one configuration
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every step in order.
    ///
    /// Bad input files are skipped and listed in the report. Only failing
    /// to create the output directories or to write the contents listing or
    /// the summary ends the run with an error.
    pub fn run(&self) -> Result<RunReport, PipelineError> {
        let mut ctx = RunContext::new(self.config.clone());

        ctx.create_output_dirs()?;
        if ctx.config.reuse_contents {
            ctx.reuse_contents();
        }
        ctx.load_templates();
        ctx.write_contents()?;
        ctx.enrich_creatures()?;
        ctx.write_summary()?;

        let report = ctx.into_report();
        if !report.failures.is_empty() {
            tracing::warn!("{} files failed to process", report.failures.len());
            for path in &report.failures {
                tracing::warn!("  {}", path.display());
            }
        }
        Ok(report)
    }
}

/// `.json` files directly inside `dir`, sorted by path
pub(crate) fn json_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let entries = std::fs::read_dir(dir).map_err(|e| PipelineError::Io {
        error: e,
        path: dir.to_path_buf(),
    })?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

/// Write pretty JSON through a temporary file so a crash never leaves a
/// half-written output
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| PipelineError::Json {
        error: e,
        path: path.to_path_buf(),
    })?;

    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, json).map_err(|e| PipelineError::Io {
        error: e,
        path: temp_path.clone(),
    })?;
    std::fs::rename(&temp_path, path).map_err(|e| PipelineError::Io {
        error: e,
        path: path.to_path_buf(),
    })
}
