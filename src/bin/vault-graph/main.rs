//! vault-graph CLI tool
//!
//! Command-line interface over a local vault directory. Every command prints pretty JSON on
//! stdout; logs go to stderr and are filtered with `RUST_LOG` (default `info`).
//!
//! ## Commands
//!
//! - `graph`: the whole-vault link graph
//! - `traverse <path>`: the neighbourhood of one note
//! - `backlinks <path>`: notes referring to one note
//! - `search <query>`: notes whose path or name contains the query
//! - `index`: every note and the reference targets it contains

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use vault_graph::{
    config::VaultConfig, engine::PhantomPolicy, repository::FsRepository, service::VaultService,
};

#[derive(Parser)]
#[command(name = "vault-graph")]
#[command(author, version, about = "Explore the wikilink graph of a markdown vault", long_about = None)]
struct Cli {
    /// Vault root directory
    #[arg(short, long, default_value = ".", global = true)]
    vault: PathBuf,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the link graph of the whole vault
    Graph {
        /// Keep unresolved references as phantom nodes
        #[arg(long)]
        phantoms: bool,
    },

    /// Build the graph around one note, breadth-first
    Traverse {
        /// Storage path of the start note, relative to the vault root
        path: String,

        /// Reference hops to follow (clamped to the configured maximum)
        #[arg(short, long)]
        depth: Option<u32>,
    },

    /// List the notes that link to a note
    Backlinks {
        /// Storage path of the target note
        path: String,
    },

    /// Find notes by name or path
    Search {
        query: String,

        /// Maximum number of results (never above the configured search limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List every note with the reference targets it contains
    Index,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match cli.config.as_ref() {
        Some(path) => VaultConfig::from_file(path)?,
        None => VaultConfig::default(),
    };
    let repo = FsRepository::new(&cli.vault, config.naming())?;
    tracing::debug!("Opened vault at {}", repo.root().display());
    let service = VaultService::new(repo, config)?;

    match cli.command {
        Commands::Graph { phantoms } => {
            let policy = if phantoms {
                PhantomPolicy::Create
            } else {
                PhantomPolicy::Drop
            };
            let graph = service.build_full_graph_with(policy).await?;
            tracing::info!("{:?}", graph.stats());
            print_json(&graph)?;
        }
        Commands::Traverse { path, depth } => {
            print_json(&service.traverse_from_node(&path, depth).await?)?;
        }
        Commands::Backlinks { path } => {
            print_json(&service.find_backlinks(&path).await?)?;
        }
        Commands::Search { query, limit } => {
            print_json(&service.search(&query, limit).await?)?;
        }
        Commands::Index => {
            print_json(&service.build_index().await?)?;
        }
    }
    Ok(())
}
