//! Fleet Hunt CLI
//!
//! Operator interface for creating, inspecting and driving fleet-wide hunts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;
mod config;
mod runtime;
mod validator;

use commands::{cmd_create, cmd_list, cmd_modify, cmd_show, run_server, CreateArgs, OutputFormat};
use config::AppConfig;
use fh_core::{AccessContext, HuntId, HuntModification, ListHuntsRequest};
use runtime::Runtime;
use validator::ConfigValidator;

#[derive(Parser)]
#[command(name = "fleet-hunt")]
#[command(version)]
#[command(about = "Create and manage fleet-wide artifact collection hunts", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Principal the command acts as
    #[arg(long, default_value = "admin", global = true)]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a hunt
    Create {
        /// Artifact to collect (repeatable)
        #[arg(short, long = "artifact", required = true)]
        artifacts: Vec<String>,

        /// Parameter override as Artifact.Name.param=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Hunt description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Hours until the hunt expires
        #[arg(long)]
        expires_in_hours: Option<u64>,

        /// Start the hunt immediately instead of creating it paused
        #[arg(long)]
        start: bool,
    },

    /// List hunts, newest first
    List {
        /// Number of matching hunts to skip
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Maximum number of hunts to show
        #[arg(short = 'n', long, default_value = "50")]
        count: usize,

        /// Include archived hunts
        #[arg(long)]
        include_archived: bool,
    },

    /// Show hunt details
    Show {
        /// Hunt ID
        id: HuntId,
    },

    /// Start a paused hunt
    Start {
        /// Hunt ID
        id: HuntId,
    },

    /// Stop a hunt
    Stop {
        /// Hunt ID
        id: HuntId,
    },

    /// Archive a hunt
    Archive {
        /// Hunt ID
        id: HuntId,
    },

    /// Change a hunt's description
    Describe {
        /// Hunt ID
        id: HuntId,

        /// New description
        description: String,
    },

    /// Run the dispatcher refresh loop until interrupted
    Serve,

    /// Validate configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone();
    let config = AppConfig::load_or_default(config_path.as_deref(), &default_config_path())?;

    fh_observability::init_logging_with_config(
        config.logging_config(cli.verbose, cli.format == OutputFormat::Json),
    )
    .context("Failed to initialize logging")?;

    if let Commands::Validate = cli.command {
        return cmd_validate(&config);
    }

    let validation = ConfigValidator::validate(&config);
    if validation.has_errors() {
        validation.print();
        eprintln!();
        eprintln!(
            "{}",
            "Aborted due to configuration errors. Fix the errors above and try again."
                .red()
                .bold()
        );
        std::process::exit(1);
    }
    if cli.verbose && validation.has_warnings() {
        validation.print();
    }

    if let Commands::Serve = cli.command {
        return run_server(&config).await;
    }

    let runtime = Runtime::open(&config).await?;
    let service = &runtime.service;
    let access = AccessContext::administrator(cli.user.clone());

    match cli.command {
        Commands::Create {
            artifacts,
            params,
            description,
            expires_in_hours,
            start,
        } => {
            let args = CreateArgs {
                artifacts,
                params,
                description,
                expires_in_hours,
                start,
            };
            cmd_create(service, args, &access, cli.format).await
        }
        Commands::List {
            offset,
            count,
            include_archived,
        } => {
            let mut request = ListHuntsRequest::new(offset, count);
            if include_archived {
                request = request.include_archived();
            }
            cmd_list(service, request, cli.format).await
        }
        Commands::Show { id } => cmd_show(service, &id, cli.format).await,
        Commands::Start { id } => {
            cmd_modify(service, &id, HuntModification::start(), &cli.user, cli.format).await
        }
        Commands::Stop { id } => {
            cmd_modify(service, &id, HuntModification::stop(), &cli.user, cli.format).await
        }
        Commands::Archive { id } => {
            cmd_modify(service, &id, HuntModification::archive(), &cli.user, cli.format).await
        }
        Commands::Describe { id, description } => {
            let modification = HuntModification::describe(description);
            cmd_modify(service, &id, modification, &cli.user, cli.format).await
        }
        Commands::Serve | Commands::Validate => Ok(()),
    }
}

fn default_config_path() -> PathBuf {
    if let Some(dirs) = directories::ProjectDirs::from("com", "fleet-hunt", "fleet-hunt") {
        dirs.config_dir().join("config.yaml")
    } else {
        PathBuf::from("config/default.yaml")
    }
}

fn cmd_validate(config: &AppConfig) -> Result<()> {
    let validation = ConfigValidator::validate(config);
    validation.print();

    eprintln!();
    eprintln!("{}", "Configuration Summary".bold());
    eprintln!("─────────────────────");
    eprintln!("  Data dir: {}", config.storage.data_dir.display());
    eprintln!("  Artifacts: {}", config.artifacts.definitions_dir.display());
    eprintln!(
        "  Refresh: every {}s",
        config.dispatcher.refresh_interval_secs
    );
    eprintln!(
        "  Default expiry: {}h",
        config.dispatcher.default_expiry_hours
    );
    eprintln!("  Wake-up pattern: {}", config.notifier.wakeup_pattern);

    eprintln!();
    if validation.has_errors() {
        eprintln!(
            "{}",
            "Configuration validation failed. Fix the errors above."
                .red()
                .bold()
        );
        std::process::exit(1);
    } else if validation.has_warnings() {
        eprintln!(
            "{}",
            "Configuration is valid with warnings. Review the warnings above."
                .yellow()
                .bold()
        );
    } else {
        eprintln!("{}", "Configuration is valid.".green().bold());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_create_requires_artifact() {
        assert!(Cli::try_parse_from(["fleet-hunt", "create"]).is_err());

        let cli = Cli::try_parse_from([
            "fleet-hunt",
            "create",
            "-a",
            "Generic.Client.Info",
            "--start",
            "--format",
            "json",
        ])
        .unwrap();
        assert!(cli.format == OutputFormat::Json);
        match cli.command {
            Commands::Create { artifacts, start, .. } => {
                assert_eq!(artifacts, vec!["Generic.Client.Info"]);
                assert!(start);
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn test_hunt_ids_are_validated_by_parser() {
        assert!(Cli::try_parse_from(["fleet-hunt", "show", "H.1234"]).is_ok());
        assert!(Cli::try_parse_from(["fleet-hunt", "show", "../etc"]).is_err());
    }
}
