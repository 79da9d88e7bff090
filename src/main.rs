use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

mod build;
mod commands;
mod config;
mod server;
mod shutdown;
mod util;

#[derive(Parser)]
#[command(name = "satisficer")]
#[command(about = "A small static site generator with a live preview server")]
#[command(version)]
struct Args {
    /// The command to execute
    #[command(subcommand)]
    command: SatisficerCommand,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Parser)]
struct NewArgs {
    /// The directory to create the project in (must not exist)
    dir: PathBuf,
}

#[derive(Parser)]
struct BuildArgs {
    /// The project directory containing `content/` and `layout/`
    project: PathBuf,

    /// The directory to write the site to
    output: PathBuf,
}

#[derive(Parser)]
struct ServeArgs {
    /// The project directory containing `content/` and `layout/`
    #[arg(default_value = ".")]
    project: PathBuf,

    /// The address to bind to [default: dev.bind from config]
    #[arg(short, long)]
    bind: Option<String>,

    /// The port to bind to [default: dev.port from config]
    #[arg(short, long)]
    port: Option<u16>,

    /// Open the site in the default browser
    #[arg(short, long, default_value = "false")]
    open: bool,
}

#[derive(Subcommand)]
enum SatisficerCommand {
    /// Create a new project from the starter template
    New(NewArgs),

    /// Build the site once
    Build(BuildArgs),

    /// Serve the site locally, rebuilding on every change
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_target(false).init();

    match args.command {
        SatisficerCommand::New(args) => {
            commands::new::run(&args).await?;
        }
        SatisficerCommand::Build(args) => {
            commands::build::run(&args).await?;
        }
        SatisficerCommand::Serve(args) => {
            commands::serve::run(&args).await?;
        }
    }

    Ok(())
}
