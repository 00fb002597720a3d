//! LANDREG Node Binary

use clap::{Parser, Subcommand};
use landreg_core::{NodeConfig, StorageBackend};
use landreg_node::NodeBuilder;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "landreg-node")]
#[command(about = "LANDREG Node - Property Ownership Registry")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the node
    Run {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// API listen address
        #[arg(long)]
        api_addr: Option<String>,

        /// Data directory
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// World state backend (memory or sled)
        #[arg(long)]
        backend: Option<StorageBackend>,

        /// Seed demonstration records when the ledger is empty
        #[arg(long)]
        seed: bool,
    },

    /// Write the default configuration
    Config {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            api_addr,
            data_dir,
            backend,
            seed,
        } => {
            let config = match config {
                Some(path) => NodeConfig::load(&path)?,
                None => NodeConfig::default(),
            };
            init_logging(&config.log_level);

            info!("Starting LANDREG Node...");

            let mut builder = NodeBuilder::new().config(config);
            if let Some(addr) = api_addr {
                builder = builder.api_addr(&addr);
            }
            if let Some(dir) = data_dir {
                builder = builder.data_dir(dir);
            }
            if let Some(backend) = backend {
                builder = builder.backend(backend);
            }
            if seed {
                builder = builder.seed_on_start();
            }

            let node = builder.build()?;
            node.start().await?;
        }

        Commands::Config { output } => {
            let json = NodeConfig::default().to_json()?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &json)?;
                    println!("Configuration saved to: {}", path.display());
                }
                None => {
                    println!("{}", json);
                }
            }
        }
    }

    Ok(())
}
