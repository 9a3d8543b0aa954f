use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

pub mod demo;
pub mod validate;

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the declared collection schemas
    Validate {
        /// Configuration file (defaults to the standard search path)
        #[arg(short, long, value_name = "PATH", env = "DOCSTORE_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Walk a collection through its lifecycle on an in-memory store
    Demo {
        /// Configuration file (defaults to the standard search path)
        #[arg(short, long, value_name = "PATH", env = "DOCSTORE_CONFIG")]
        config: Option<PathBuf>,

        /// Collection to exercise
        #[arg(long, value_name = "NAME")]
        collection: Option<String>,
    },
}

pub async fn execute(command: Commands, verbose: bool) -> Result<()> {
    match command {
        Commands::Validate { config } => validate::execute(config.as_deref(), verbose).await,
        Commands::Demo { config, collection } => {
            demo::execute(config.as_deref(), collection.as_deref(), verbose).await
        }
    }
}
