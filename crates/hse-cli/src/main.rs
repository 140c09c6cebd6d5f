//! HSE Inspections CLI
//!
//! Command-line front end for inspection templates, inspections and
//! assignments stored in a local JSON data file.
//!
//! # Usage
//!
//! ```bash
//! hse seed
//! hse users add --id m1 --name "Mo Manager" --role manager
//! hse --as m1 templates list --category safety
//! hse --as m1 assign --template <ID> --to i1 --priority high --due 2026-11-01
//! hse --as i1 assignments start <ID>
//! hse --as i1 inspections respond <ID> hazards_identified false
//! hse --as i1 inspections submit <ID> --issues 2 --score 87.5
//! ```

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "hse")]
#[command(version)]
#[command(about = "HSE Inspections Command Line Interface", long_about = None)]
struct Cli {
    /// JSON data file holding templates, inspections, assignments and users
    #[arg(long, env = "HSE_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// Act as this user id
    #[arg(long = "as", env = "HSE_USER")]
    acting_as: Option<String>,

    /// Output format
    #[arg(long, short)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    /// Log filter, e.g. `debug` or `hse_inspect=trace`
    #[arg(long, env = "HSE_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the prebuilt templates
    Seed,
    /// Manage templates
    Templates {
        #[command(subcommand)]
        action: TemplateCommands,
    },
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Work on inspections
    Inspections {
        #[command(subcommand)]
        action: InspectionCommands,
    },
    /// Assign a template or an existing inspection to an inspector
    Assign(AssignArgs),
    /// Manage assignments
    Assignments {
        #[command(subcommand)]
        action: AssignmentCommands,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// List templates
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Case-insensitive match on title and description
        #[arg(long)]
        search: Option<String>,
        /// Only prebuilt templates
        #[arg(long)]
        prebuilt: bool,
    },
    /// Show template details
    Show { id: String },
    /// Create a template from a JSON document
    Import { file: PathBuf },
    /// Replace a template with a JSON document
    Update { id: String, file: PathBuf },
    /// Delete a template
    Delete { id: String },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List users
    List {
        #[arg(long)]
        role: Option<String>,
    },
    /// Show the acting user and their capabilities
    Whoami,
    /// Add or replace a user
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "inspector")]
        role: String,
    },
}

#[derive(Subcommand)]
enum InspectionCommands {
    /// List inspections by status
    List {
        #[arg(long, default_value = "pending")]
        status: String,
    },
    /// Show an inspection with its progress
    Show { id: String },
    /// Start an ad-hoc inspection from a template
    New {
        #[arg(long)]
        template: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        priority: Option<String>,
    },
    /// Move a pending inspection to in-progress
    Start { id: String },
    /// Record an answer; VALUE is parsed as JSON, else taken as text
    Respond { id: String, field: String, value: String },
    /// Check whether an inspection can be submitted
    Check { id: String },
    /// Submit a completed inspection
    Submit {
        id: String,
        #[arg(long)]
        issues: Option<u32>,
        #[arg(long)]
        score: Option<f64>,
    },
    /// Attach a photo reference
    Photo { id: String, uri: String },
}

#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).args(["template", "inspection"])))]
struct AssignArgs {
    /// Materialize this template into a new inspection
    #[arg(long)]
    template: Option<String>,
    /// Assign an existing inspection
    #[arg(long)]
    inspection: Option<String>,
    /// Assignee user id
    #[arg(long)]
    to: String,
    #[arg(long, default_value = "medium")]
    priority: String,
    /// RFC 3339 timestamp or YYYY-MM-DD
    #[arg(long)]
    due: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Subcommand)]
enum AssignmentCommands {
    /// List assignments; defaults to the acting user's own
    List {
        /// Assignments given to the acting user
        #[arg(long, conflicts_with_all = ["by", "all"])]
        mine: bool,
        /// Assignments made by this manager
        #[arg(long, conflicts_with = "all")]
        by: Option<String>,
        /// Every assignment
        #[arg(long)]
        all: bool,
    },
    /// Show one assignment
    Show { id: String },
    /// Start work on an assignment
    Start { id: String },
    /// Remove an assignment; the inspection is kept
    Remove { id: String },
}

fn init_tracing(level: Option<&str>) {
    let filter = level
        .map(String::from)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::Config::load(cli.profile.as_deref())?;
    init_tracing(cli.log_level.as_deref().or(config.log_level.as_deref()));

    let settings = commands::Settings {
        data_file: cli.data_file.unwrap_or_else(|| config.data_file()),
        acting_as: cli.acting_as.or_else(|| config.user.clone()),
        format: match cli.format {
            Some(format) => format,
            None => config.format()?.unwrap_or(output::OutputFormat::Table),
        },
        core: config.core,
    };
    let ctx = commands::Context::open(settings).await?;

    match cli.command {
        Commands::Seed => commands::templates::seed(&ctx).await,
        Commands::Templates { action } => commands::templates::handle(action, &ctx).await,
        Commands::Users { action } => commands::users::handle(action, &ctx).await,
        Commands::Inspections { action } => commands::inspections::handle(action, &ctx).await,
        Commands::Assign(args) => commands::assignments::assign(args, &ctx).await,
        Commands::Assignments { action } => commands::assignments::handle(action, &ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_assign_requires_exactly_one_target() {
        assert!(Cli::try_parse_from(["hse", "assign", "--to", "i1"]).is_err());
        let both = ["hse", "assign", "--to", "i1", "--template", "t", "--inspection", "x"];
        assert!(Cli::try_parse_from(both).is_err());
        assert!(Cli::try_parse_from(["hse", "assign", "--to", "i1", "--template", "t"]).is_ok());
    }

    #[test]
    fn test_acting_user_flag() {
        let cli = Cli::try_parse_from(["hse", "--as", "m1", "seed"]).unwrap();
        assert_eq!(cli.acting_as.as_deref(), Some("m1"));
    }
}
