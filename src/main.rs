use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cosmomap::cli::{RunOptions, run};

#[derive(Parser)]
#[command(name = "cosmomap")]
#[command(
    version,
    about = "Schema and relationship mapper for Cosmos-style document stores"
)]
struct Cli {
    #[arg(long, short = 'o', help = "Output directory for the rendered report")]
    output: Option<PathBuf>,

    #[arg(long, help = "Documents to sample per container")]
    sample_size: Option<usize>,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Databases to analyse (comma-separated; default: all)"
    )]
    databases: Vec<String>,

    #[arg(long, help = "Restrict analysis to a single container")]
    container: Option<String>,

    #[arg(
        long,
        short = 'f',
        help = "Output format: markdown, html, mermaid, json-schema, json"
    )]
    format: Option<String>,

    #[arg(long, help = "Validate relationships against the live store")]
    validate: bool,

    #[arg(long, conflicts_with = "validate", help = "Skip live validation")]
    no_validate: bool,

    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "",
        help = "Save a snapshot after the run, optionally under a name"
    )]
    snapshot: Option<String>,

    #[arg(long, help = "Compare against the most recent snapshot")]
    diff: bool,

    #[arg(long, value_name = "ID|NAME", help = "Compare against a specific snapshot")]
    diff_from: Option<String>,

    #[arg(long, help = "Exit non-zero when breaking changes are detected")]
    fail_on_breaking: bool,

    #[arg(long, short = 'q', help = "Only log errors")]
    quiet: bool,

    #[arg(long, short = 'v', help = "Verbose logging")]
    verbose: bool,

    #[arg(long, short = 'w', help = "Re-run on an interval until cancelled")]
    watch: bool,

    #[arg(long, default_value = "300", help = "Watch interval in seconds")]
    watch_interval: u64,

    #[arg(long, short = 'c', help = "Path to a config file")]
    config: Option<PathBuf>,

    #[arg(long, help = "List stored snapshots and exit")]
    list_snapshots: bool,

    #[arg(
        long,
        value_name = "KEEP",
        help = "Delete old unnamed snapshots, keeping the newest KEEP"
    )]
    prune_snapshots: Option<usize>,
}

impl Cli {
    fn into_run_options(self) -> RunOptions {
        let validate = if self.validate {
            Some(true)
        } else if self.no_validate {
            Some(false)
        } else {
            None
        };
        let snapshot = self.snapshot.map(|name| {
            if name.is_empty() { None } else { Some(name) }
        });

        RunOptions {
            config_path: self.config,
            output_dir: self.output,
            sample_size: self.sample_size,
            databases: self.databases,
            container: self.container,
            format: self.format,
            validate,
            snapshot,
            diff: self.diff || self.diff_from.is_some(),
            diff_from: self.diff_from,
            fail_on_breaking: self.fail_on_breaking,
            watch: self.watch,
            watch_interval_secs: self.watch_interval,
            list_snapshots: self.list_snapshots,
            prune_snapshots: self.prune_snapshots,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match execute(cli) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => {
            eprintln!("Breaking changes detected");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the run should fail because of breaking changes
fn execute(cli: Cli) -> anyhow::Result<bool> {
    let fail_on_breaking = cli.fail_on_breaking;
    let runtime = tokio::runtime::Runtime::new()?;
    let outcome = runtime.block_on(run(cli.into_run_options()))?;
    Ok(fail_on_breaking && outcome.breaking_changes)
}
