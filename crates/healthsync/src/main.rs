use std::path::PathBuf;

use clap::{Parser, Subcommand};
use healthsync::cli::{commands, ConfigOverrides, OutputFormat};

#[derive(Parser)]
#[command(name = "healthsync")]
#[command(author, version, about = "Unify health exports into a daily SQLite record", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Config file (defaults to <config dir>/healthsync/config.toml)
    #[arg(short, long, global = true, env = "HEALTHSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Database file path
    #[arg(long, global = true, env = "HEALTHSYNC_DB")]
    db: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process exports into the database
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Show recent daily summaries
    Summary {
        /// Number of days to show
        #[arg(short, long, default_value = "14")]
        days: u32,
    },
    /// List stored workouts
    Workouts {
        /// Start date (YYYY-MM-DD), defaults to 30 days before --to
        #[arg(long)]
        from: Option<String>,
        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<String>,
        /// Include per-set details
        #[arg(long)]
        sets: bool,
    },
}

#[derive(Subcommand)]
enum SyncCommands {
    /// Run the pipeline if any export changed since the last run
    Run {
        /// Exports directory
        #[arg(long, env = "HEALTHSYNC_EXPORTS")]
        exports: Option<PathBuf>,
        /// Process even if nothing changed
        #[arg(long)]
        force: bool,
        /// Report the decision only, don't execute
        #[arg(long)]
        dry_run: bool,
        /// Rewrite metrics of workout sessions that are already stored
        #[arg(long)]
        overwrite_sessions: bool,
    },
    /// Show stored data, export files and run history
    Status {
        /// Exports directory
        #[arg(long, env = "HEALTHSYNC_EXPORTS")]
        exports: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "healthsync=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut overrides = ConfigOverrides {
        config: cli.config,
        db: cli.db,
        exports: None,
    };
    if let Commands::Sync {
        command: SyncCommands::Run { exports, .. } | SyncCommands::Status { exports },
    } = &cli.command
    {
        overrides.exports = exports.clone();
    }

    let result = overrides.resolve().and_then(|config| match cli.command {
        Commands::Sync { command } => match command {
            SyncCommands::Run {
                force,
                dry_run,
                overwrite_sessions,
                ..
            } => commands::sync_run(config, force, dry_run, overwrite_sessions),
            SyncCommands::Status { .. } => commands::sync_status(config, cli.format),
        },
        Commands::Summary { days } => commands::show_summary(config, days, cli.format),
        Commands::Workouts { from, to, sets } => {
            commands::list_workouts(config, from, to, sets, cli.format)
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", healthsync::error::format_user_error(&e));
        std::process::exit(1);
    }
}
