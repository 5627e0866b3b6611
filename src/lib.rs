//! # vault-graph
//!
//! A Rust library for turning a vault of interlinked markdown notes into a queryable link graph.
//!
//! ## Overview
//!
//! Notes reference each other with wikilinks (`[[target]]` or `[[target|alias]]`). vault-graph
//! extracts those references, resolves each one to a concrete note despite partial paths, missing
//! extensions, case differences and duplicate basenames, and assembles a directed graph that a
//! force-directed viewer can render as-is.
//!
//! ### Key Features
//!
//! - **Tiered resolution**: exact identity, then basename, then path suffix, optionally substring
//! - **One engine, two shapes**: whole-vault graphs and depth-bounded neighbourhoods share a
//!   single breadth-first walk configured by [`engine::TraversalConfig`]
//! - **Phantom nodes**: unresolved references can become first-class `exists = false` nodes
//! - **Backlinks with context**: reverse references plus the line that mentions the target
//! - **Partial-failure tolerance**: unreadable notes are skipped and reported as diagnostics
//! - **Order-preserving concurrency**: note fetches overlap, output order never depends on timing
//!
//! ## Architecture
//!
//! - **[`wikilink`]**: reference extraction and markdown link rendering
//! - **[`resolve`]**: tiered target resolution ([`resolve::PathResolver`])
//! - **[`engine`]**: graph building and bounded traversal ([`engine::GraphEngine`])
//! - **[`backlinks`]**: reverse references with context
//! - **[`search`]**: name/path search and the vault reference index
//! - **[`repository`]**: the backing-store contract plus in-memory and filesystem adapters
//! - **[`service`]**: the caller-facing surface with input clamping and request timeouts
//! - **[`autosave`]**: debounced save scheduling for editors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vault_graph::{config::VaultConfig, repository::FsRepository, service::VaultService};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = VaultConfig::default();
//!     let repo = FsRepository::new("./vault", config.naming())?;
//!     let service = VaultService::new(repo, config)?;
//!
//!     let graph = service.build_full_graph().await?;
//!     for skipped in graph.diagnostics.iter() {
//!         eprintln!("skipped {}", skipped);
//!     }
//!
//!     let around = service.traverse_from_node("index.md", Some(2)).await?;
//!     println!("{} notes within two hops", around.nodes.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **default**: the library
//! - **bin**: the `vault-graph` command line tool

pub mod autosave;
pub mod backlinks;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod graph;
pub mod paths;
pub mod repository;
pub mod resolve;
pub mod search;
pub mod service;
#[cfg(test)]
mod tests;
pub mod wikilink;

pub use error::*;
