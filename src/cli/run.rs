//! Run Driver
//!
//! Applies CLI overrides on top of the loaded configuration, builds the
//! store client and pipeline, and drives the analyse -> render ->
//! snapshot -> diff cycle (once, or repeatedly under `--watch`).

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tracing::{debug, info};

use crate::compare;
use crate::config::{Config, ConfigLoader};
use crate::output::{self, OutputFormat};
use crate::pipeline::{AnalysisPipeline, CancelFlag, PipelineOptions};
use crate::relations::ConfidenceOptions;
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::store::{CosmosClient, CosmosClientConfig, DocumentStore};
use crate::types::{AnalysisReport, ComparisonReport, MapError, Result};

use super::output::Output;

// =============================================================================
// Options
// =============================================================================

/// Resolved CLI flags; `None` means "keep the configured value"
#[derive(Debug, Default)]
pub struct RunOptions {
    pub config_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub sample_size: Option<usize>,
    pub databases: Vec<String>,
    pub container: Option<String>,
    pub format: Option<String>,
    pub validate: Option<bool>,
    /// `Some(None)` saves an unnamed snapshot, `Some(Some(name))` a named one
    pub snapshot: Option<Option<String>>,
    pub diff: bool,
    pub diff_from: Option<String>,
    pub fail_on_breaking: bool,
    pub watch: bool,
    pub watch_interval_secs: u64,
    pub list_snapshots: bool,
    pub prune_snapshots: Option<usize>,
}

/// What the run concluded, for exit-code mapping
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub breaking_changes: bool,
}

// =============================================================================
// Entry Point
// =============================================================================

pub async fn run(options: RunOptions) -> Result<RunOutcome> {
    let out = Output::new();
    let config = load_config(&options)?;
    let snapshot_store = SnapshotStore::new(&config.snapshot.cache_dir);

    if options.list_snapshots {
        list_snapshots(&out, &snapshot_store)?;
        return Ok(RunOutcome::default());
    }
    if let Some(keep) = options.prune_snapshots {
        let removed = snapshot_store.prune(keep)?;
        out.success(&format!("Pruned {} snapshot(s)", removed.len()));
        return Ok(RunOutcome::default());
    }

    let store = build_store(&config)?;
    let cancel = CancelFlag::new();
    spawn_ctrl_c_handler(cancel.clone());

    let mut outcome = RunOutcome::default();
    loop {
        let pipeline = AnalysisPipeline::with_cancel(
            Arc::clone(&store),
            pipeline_options(&config),
            cancel.clone(),
        );

        let report = match pipeline.run().await {
            Ok(report) => report,
            // a Ctrl-C mid-run is a clean stop, not a failure
            Err(MapError::Cancelled) => break,
            Err(e) => return Err(e),
        };
        let comparison = diff_against_baseline(&options, &snapshot_store, &report)?;

        if let Some(comparison) = &comparison
            && comparison.has_breaking_changes()
        {
            outcome.breaking_changes = true;
        }

        if let Some(name) = &options.snapshot {
            let snapshot = Snapshot::from_report(&report, name.clone())?;
            snapshot_store.save(&snapshot)?;
        }

        write_report(&out, &config, &report, comparison.as_ref())?;
        print_summary(&out, &report, comparison.as_ref());

        if !options.watch || cancel.is_cancelled() {
            break;
        }
        out.info(&format!(
            "Watching; next run in {}s (Ctrl-C to stop)",
            options.watch_interval_secs
        ));
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(options.watch_interval_secs)) => {}
            _ = wait_for_cancel(cancel.clone()) => break,
        }
    }

    Ok(outcome)
}

async fn wait_for_cancel(cancel: CancelFlag) {
    while !cancel.is_cancelled() {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

fn spawn_ctrl_c_handler(cancel: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Cancellation requested");
            cancel.cancel();
        }
    });
}

// =============================================================================
// Configuration Assembly
// =============================================================================

fn load_config(options: &RunOptions) -> Result<Config> {
    let mut config = ConfigLoader::load(options.config_path.as_deref())?;

    if let Some(dir) = &options.output_dir {
        config.output.dir = dir.clone();
    }
    if let Some(sample_size) = options.sample_size {
        config.analysis.sample_size = sample_size;
    }
    if !options.databases.is_empty() {
        config.analysis.databases = options.databases.clone();
    }
    if let Some(container) = &options.container {
        config.analysis.container = Some(container.clone());
    }
    if let Some(format) = &options.format {
        config.output.format = format.clone();
    }
    if let Some(validate) = options.validate {
        config.analysis.validate_relationships = validate;
    }

    config.validate()?;
    Ok(config)
}

fn build_store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    let endpoint = config.require_endpoint()?.to_string();
    let key = config.cosmos.key.clone().ok_or_else(|| {
        MapError::Config("no account key configured; set cosmos.key or COSMOS_KEY".to_string())
    })?;

    let client = CosmosClient::new(CosmosClientConfig {
        endpoint,
        key: SecretString::from(key),
        timeout: config.cosmos.timeout(),
        accept_invalid_certs: config.cosmos.accept_invalid_certs,
    })?;
    Ok(Arc::new(client))
}

fn pipeline_options(config: &Config) -> PipelineOptions {
    let inference = crate::inference::InferenceOptions {
        detect_enums: config.analysis.detect_enums,
        max_unique_values: config.analysis.max_unique_values,
        min_enum_frequency: config.analysis.min_enum_frequency,
        ..Default::default()
    };

    PipelineOptions {
        sample_size: config.analysis.sample_size,
        databases: config.analysis.databases.clone(),
        container: config.analysis.container.clone(),
        validate: config.analysis.validate_relationships,
        concurrency: config.analysis.concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        }),
        call_timeout: config.cosmos.timeout(),
        inference,
        custom_patterns: config
            .analysis
            .custom_patterns
            .iter()
            .map(|p| (p.name.clone(), p.pattern.clone()))
            .collect(),
        confidence: ConfidenceOptions {
            sample_size: config.analysis.sample_size,
            call_timeout: config.cosmos.timeout(),
            ..ConfidenceOptions::default()
        },
    }
}

// =============================================================================
// Diff & Snapshots
// =============================================================================

fn diff_against_baseline(
    options: &RunOptions,
    store: &SnapshotStore,
    report: &AnalysisReport,
) -> Result<Option<ComparisonReport>> {
    let baseline = if let Some(id_or_name) = &options.diff_from {
        Some(store.load(id_or_name)?)
    } else if options.diff {
        store.load_latest()?
    } else {
        None
    };

    let Some(baseline) = baseline else {
        if options.diff {
            debug!("No baseline snapshot found; skipping diff");
        }
        return Ok(None);
    };

    Ok(Some(compare::compare(&baseline.to_report(), report)))
}

fn list_snapshots(out: &Output, store: &SnapshotStore) -> Result<()> {
    let snapshots = store.list()?;
    if snapshots.is_empty() {
        out.info("No snapshots stored");
        return Ok(());
    }
    out.section("Snapshots");
    for metadata in snapshots {
        let label = metadata.name.as_deref().unwrap_or(&metadata.id);
        println!(
            "  {}  {}  ({} containers, {} relationships)",
            metadata.created_at.format("%Y-%m-%d %H:%M:%S"),
            label,
            metadata.container_count,
            metadata.relationship_count,
        );
    }
    Ok(())
}

// =============================================================================
// Reporting
// =============================================================================

fn write_report(
    out: &Output,
    config: &Config,
    report: &AnalysisReport,
    comparison: Option<&ComparisonReport>,
) -> Result<()> {
    let format: OutputFormat = config.format()?;
    let rendered = output::render(format, report, comparison)?;

    fs::create_dir_all(&config.output.dir)?;
    let path = config
        .output
        .dir
        .join(format!("schema-map.{}", format.extension()));
    fs::write(&path, rendered)?;
    out.success(&format!("Wrote {}", path.display()));
    Ok(())
}

fn print_summary(out: &Output, report: &AnalysisReport, comparison: Option<&ComparisonReport>) {
    out.info(&format!(
        "{} databases, {} containers, {} relationships",
        report.databases.len(),
        report.container_count(),
        report.relationships.len()
    ));

    for failure in &report.failures {
        out.warning(&format!(
            "Skipped {}/{}: {}",
            failure.database, failure.container, failure.message
        ));
    }

    if let Some(comparison) = comparison {
        let summary = &comparison.summary;
        if summary.total_changes == 0 {
            out.success("No changes since baseline");
        } else if summary.breaking_changes > 0 {
            out.warning(&format!(
                "{} change(s) since baseline, {} breaking",
                summary.total_changes, summary.breaking_changes
            ));
        } else {
            out.info(&format!(
                "{} additive change(s) since baseline",
                summary.total_changes
            ));
        }
    }
}
