use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "xwing-data-tools")]
#[command(version, about = "Normalize the X-Wing card dataset and derive JSON schemas from it")]
pub struct Cli {
    /// Config file (defaults to config.toml in the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the collection files
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory the schema documents are written to
    #[arg(long, global = true)]
    pub schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the normalization passes over the dataset
    Normalize {
        /// Only run these passes and their prerequisites (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Skip these passes and everything depending on them (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Also put record fields in canonical order
        #[arg(long)]
        order_fields: bool,

        /// Use cached reserved ids instead of fetching them
        #[arg(long)]
        no_fetch: bool,
    },

    /// Write a JSON schema for every collection plus the shared definitions
    Schema,

    /// Fetch reserved ids for a collection into the local cache
    FetchIds {
        /// Collection the ids belong to
        collection: String,

        /// URL returning [{"name": .., "id": ..}]
        url: String,
    },

    /// List all available passes
    ListPasses,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
