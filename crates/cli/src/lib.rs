//! Command layer for stagewise migrations
//!
//! The host application owns the binary (and with it the migration
//! registry); this crate provides the argument surface and the command
//! implementations so embedding looks like:
//!
//! ```ignore
//! let cli = Cli::parse();
//! let service = build_service()?; // registry, config, pool
//! let exit_code = stagewise_cli::run_cli(&service, cli).await?;
//! std::process::exit(exit_code);
//! ```

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use stagewise::{MigrationPhase, MigrationResult, MigrationService};

pub use commands::check::{EXIT_AWAITING_MIGRATION, EXIT_ENTITIES_NOT_SYNCED, EXIT_OK, EXIT_UNKNOWN_MIGRATION};

/// Phase selection for the run command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PhaseArg {
    Before,
    After,
    Both,
}

impl PhaseArg {
    /// Phases to execute, in execution order
    pub fn phases(&self) -> &'static [MigrationPhase] {
        match self {
            PhaseArg::Before => &[MigrationPhase::Before],
            PhaseArg::After => &[MigrationPhase::After],
            PhaseArg::Both => &MigrationPhase::ALL,
        }
    }
}

#[derive(Parser)]
#[command(name = "migration")]
#[command(about = "Two-phase database migration runner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the migration ledger table in the database
    Init,

    /// Generate a migration file from the schema diff
    Generate {
        /// Generate an empty migration without consulting the schema diff
        #[arg(long)]
        empty_only: bool,
    },

    /// Run all not-yet-executed migrations for the given phase
    Run {
        #[arg(value_enum)]
        phase: PhaseArg,
    },

    /// Check that migrations are executed and the schema is in sync
    Check,

    /// Mark all not-yet-executed migrations as executed in both phases
    Skip,
}

/// Dispatch a parsed command against the service, returning the process
/// exit code.
pub async fn run_cli(service: &MigrationService, cli: Cli) -> MigrationResult<i32> {
    match cli.command {
        Commands::Init => commands::init::execute(service).await,
        Commands::Generate { empty_only } => commands::generate::execute(service, empty_only).await,
        Commands::Run { phase } => commands::run::execute(service, phase.phases()).await,
        Commands::Check => commands::check::execute(service).await,
        Commands::Skip => commands::skip::execute(service).await,
    }
}

/// Install a default tracing subscriber honoring `RUST_LOG`
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
