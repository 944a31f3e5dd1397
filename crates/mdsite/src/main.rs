//! mdsite CLI - serve a tree of markdown documents as a browsable site.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "mdsite")]
#[command(about = "Serve a tree of markdown documents as a browsable static site")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to mdsite.toml config file
    #[arg(short, long, default_value = "mdsite.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site into memory and serve it over HTTP
    Serve {
        /// Root of the markdown source tree
        #[arg(short, long)]
        root_dir: Option<PathBuf>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Open browser once listening
        #[arg(long)]
        open: bool,
    },

    /// Build the site into memory and list the generated artifacts
    Build {
        /// Root of the markdown source tree
        #[arg(short, long)]
        root_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let file_config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Serve {
            root_dir,
            port,
            host,
            open,
        } => {
            let overrides = config::ServeOverrides {
                root_dir,
                port,
                host,
                open,
            };
            commands::serve::run(&file_config, overrides).await?;
        }
        Commands::Build { root_dir } => {
            commands::build::run(&file_config, root_dir)?;
        }
    }

    Ok(())
}
