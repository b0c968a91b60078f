//! Fleetgate CLI.
//!
//! Inspects what a membership payload grants, the same way the dashboard
//! resolves it.
//!
//! # Quick Start
//!
//! ```bash
//! # Flat capabilities for a tenant
//! fleetgate permissions --membership memberships.json --tenant acme
//!
//! # Allowed attributes for one subject/action
//! fleetgate attributes vehicle read --membership memberships.json --tenant acme
//!
//! # Visible columns of a configured table
//! fleetgate columns vehicles --tenant acme --select plate,status
//! ```

mod commands;
mod style;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Fleetgate - attribute-level permission resolution for fleet dashboards.
#[derive(Parser)]
#[command(name = "fleetgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Disable colored output (also honors NO_COLOR).
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the membership payload and configuration come from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Membership JSON file (defaults to `fetch.membership_file`).
    #[arg(short, long)]
    pub membership: Option<PathBuf>,

    /// Tenant slug to resolve permissions for.
    #[arg(short, long)]
    pub tenant: String,

    /// Project directory containing fleetgate.toml.
    #[arg(short, long, default_value = ".")]
    pub project: PathBuf,

    /// Emit JSON instead of tables.
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ConfigFormat {
    Text,
    Toml,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// List flat `subject:action` permissions.
    Permissions {
        #[command(flatten)]
        source: SourceArgs,

        /// Only check these permissions (exit code 1 if any is missing).
        #[arg(long, value_delimiter = ',')]
        check: Vec<String>,
    },

    /// List effective and licensed modules.
    Modules {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Resolve allowed attributes for a subject and action.
    Attributes {
        /// Subject class (e.g. vehicle).
        subject: String,

        /// Action (e.g. read).
        action: String,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Resolve visible columns for a configured table.
    Columns {
        /// Table id from `[tables.<id>]`.
        table: String,

        /// Persisted column selection to apply (comma separated fields).
        #[arg(long, value_delimiter = ',')]
        select: Vec<String>,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show the effective configuration.
    Config {
        /// Project directory containing fleetgate.toml.
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// Output format.
        #[arg(short, long, value_enum, default_value = "text")]
        format: ConfigFormat,
    },
}

fn main() {
    // Initialize logging (stderr keeps stdout clean for --json)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    style::set_no_color(cli.no_color || std::env::var_os("NO_COLOR").is_some());

    if let Err(e) = run(cli.command) {
        style::print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Permissions { source, check } => commands::permissions::run(&source, &check),
        Commands::Modules { source } => commands::modules::run(&source),
        Commands::Attributes {
            subject,
            action,
            source,
        } => commands::attributes::run(&source, &subject, &action),
        Commands::Columns {
            table,
            select,
            source,
        } => commands::columns::run(&source, &table, &select),
        Commands::Config { project, format } => commands::config::show(&project, format),
    }
}
