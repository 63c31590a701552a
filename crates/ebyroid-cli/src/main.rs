//! CLI entry point — the composition root.
//!
//! This is the only place where the engine backend, the coordinator and the
//! HTTP adapter are wired together.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use ebyroid_axum::ServerContext;
use ebyroid_core::{Ebyroid, NullEngine};

#[derive(Parser)]
#[command(name = "ebyroid", version, about = "VOICEROID audiostream server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a template voiceroid config file to edit by hand.
    Configure {
        /// Where to write the config.
        #[arg(short, long, default_value = "ebyroid.conf.json")]
        output: PathBuf,
    },
    /// Load the config, bootstrap the default voice and serve the API.
    Start {
        /// Path to the voiceroid config file.
        #[arg(short, long, default_value = "ebyroid.conf.json")]
        config: PathBuf,
        /// Port to listen on.
        #[arg(short, long, default_value_t = 4090, env = "EBYROID_PORT")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Configure { output } => {
            config::write_template(&output)?;
            println!("Wrote a template config to \"{}\".", output.display());
            println!("Edit it to match your VOICEROID install, then run `ebyroid start`.");
            Ok(())
        }
        Commands::Start { config, port } => start(&config, port).await,
    }
}

async fn start(config_path: &Path, port: u16) -> Result<()> {
    let (voiceroids, default_name) = config::load(config_path)?;
    info!(
        count = voiceroids.len(),
        default = %default_name,
        "loaded voiceroid config"
    );

    // TODO: swap in the native VOICEROID FFI backend once it is bound;
    // until then the null engine serves silence with correct framing.
    let ebyroid = Arc::new(Ebyroid::new(Arc::new(NullEngine), voiceroids)?);

    // Bootstrap load: requests must never observe an engine with no
    // library in memory.
    ebyroid.use_voiceroid(&default_name).await?;

    let ctx = Arc::new(ServerContext {
        ebyroid,
        default_name,
    });
    ebyroid_axum::serve(ctx, port).await
}
