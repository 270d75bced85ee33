use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod build;
mod commands;
mod config;
mod logging;
mod util;

#[derive(Parser)]
#[command(version, about = "Build a personal website from markdown and templates")]
struct Args {
    /// The command to execute (defaults to `build`)
    #[command(subcommand)]
    command: Option<FolioCommand>,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the project in
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser, Default)]
struct BuildArgs {
    /// The path to the configuration file (defaults to `folio.yaml` if present)
    #[arg(short, long)]
    config_file: Option<PathBuf>,
}

#[derive(Parser)]
struct CleanArgs {
    /// The path to the configuration file (defaults to `folio.yaml` if present)
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Print what would be deleted without deleting it
    #[arg(long, default_value = "false")]
    dry_run: bool,
}

#[derive(Subcommand)]
enum FolioCommand {
    /// Initialize a new site
    Init(InitArgs),

    /// Build the site
    Build(BuildArgs),

    /// Delete the output directory
    Clean(CleanArgs),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    logging::init()?;

    match args.command {
        Some(FolioCommand::Init(args)) => {
            commands::init::run(&args).await?;
        }
        Some(FolioCommand::Build(args)) => {
            commands::build::run(&args).await?;
        }
        Some(FolioCommand::Clean(args)) => {
            commands::clean::run(&args).await?;
        }
        None => {
            commands::build::run(&BuildArgs::default()).await?;
        }
    }

    Ok(())
}
