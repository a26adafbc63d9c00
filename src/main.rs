mod commands;
mod common;
mod config;
mod db;
mod error;
mod import;
mod models;
mod normalize;
mod search;
mod subtitle;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::Shell;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::ui::prelude::*;

/// Search video subtitles and jump straight to the spoken line
#[derive(Parser, Debug)]
#[command(name = "subseek", author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Message format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Database file to use instead of the configured one
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add new subtitles for a video (replaces lines from earlier imports)
    Add {
        /// Video file
        #[arg(value_hint = ValueHint::FilePath)]
        video: PathBuf,
        /// Subtitle file (.srt or .vtt)
        #[arg(value_hint = ValueHint::FilePath)]
        subtitle: PathBuf,
    },
    /// Search subtitles interactively
    Search,
    /// List imported videos
    List,
    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    ui::init(cli.output, !cli.no_color);
    ui::set_debug_mode(cli.debug);

    if let Err(err) = run(cli) {
        emit(Level::Error, "subseek.error", &format!("Error: {err:#}"), None);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let flag = cli.database.as_deref();
    match &cli.command {
        Commands::Add { video, subtitle } => {
            let (_, database) = load_config(flag)?;
            commands::handle_add(&database, video, subtitle)
        }
        Commands::Search => {
            let (config, database) = load_config(flag)?;
            commands::handle_search(&database, &config.player)
        }
        Commands::List => {
            let (_, database) = load_config(flag)?;
            commands::handle_list(&database)
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(*shell, &mut command, "subseek", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn load_config(flag: Option<&Path>) -> Result<(Config, PathBuf)> {
    let config = Config::load().context("loading configuration")?;
    let database = config.database_path(flag);
    emit(
        Level::Debug,
        "config.database",
        &format!("Using database {}", database.display()),
        None,
    );
    Ok((config, database))
}
