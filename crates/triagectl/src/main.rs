//! triagectl - interactive error triage from the terminal

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use triage_shared::TriageConfig;
use triagectl::commands::{self, FilterArgs};
use triagectl::{logging, output, repl, Dashboard};

#[derive(Parser)]
#[command(name = "triagectl")]
#[command(about = "Error triage dashboard client", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: $TRIAGECTL_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server base URL, overrides the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log level, overrides the config file (RUST_LOG wins over both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session (default)
    Repl,

    /// Print count, groups and rows once
    Search {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Build every matching row, wait for all of them and print the output
    Build {
        #[command(flatten)]
        filters: FilterArgs,

        /// Clean instead of build
        #[arg(long)]
        clean: bool,

        /// Build level appended to each target
        #[arg(long)]
        level: Option<String>,
    },

    /// Print the encoded query string without contacting the server
    Query {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Write the effective configuration to the config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = TriageConfig::load(cli.config.as_deref()).context("loading config")?;
    if let Some(base_url) = cli.base_url {
        config.server.base_url = base_url;
    }
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    logging::init(&config.log.level);
    debug!(base_url = %config.server.base_url, "config loaded");

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Repl => repl::run(Dashboard::connect(&config)).await,
        Commands::Search { filters } => {
            commands::search(&Dashboard::connect(&config), &filters).await
        }
        Commands::Build {
            filters,
            clean,
            level,
        } => commands::build(&Dashboard::connect(&config), &filters, clean, level).await,
        Commands::Query { filters } => {
            let mut view = triage_shared::ViewState::from_config(&config.view);
            let query = commands::query(&mut view, &filters, config.view.effective_max_number())?;
            println!("{}", query);
            Ok(())
        }
        Commands::InitConfig { force } => {
            let path = TriageConfig::discover_path(cli.config.as_deref())
                .context("no config directory on this system")?;
            commands::init_config(&config, &path, force)?;
            output::display_success(&format!("wrote {}", path.display()));
            Ok(())
        }
    }
}
