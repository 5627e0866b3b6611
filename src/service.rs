//! The caller-facing query surface.
//!
//! [`VaultService`] pairs a repository handle with a [`VaultConfig`] and is what a front end (the
//! CLI, an HTTP handler) calls. It validates and clamps caller input and bounds every operation
//! with the configured request timeout. An expired timeout fails the whole operation; no partial
//! result is returned.
use std::future::Future;

use crate::{
    backlinks::BacklinkReport,
    config::VaultConfig,
    engine::{GraphEngine, PhantomPolicy, TraversalConfig},
    error::VaultError,
    graph::GraphData,
    repository::{NoteContent, NoteRepository, WriteReceipt},
    resolve::ResolveMode,
    search::{self, SearchHit, VaultIndex},
};

/// Content of a note created without explicit content.
pub const NEW_NOTE_TEMPLATE: &str = "# New Note\n\n";

#[derive(Debug, Clone)]
pub struct VaultService<R: NoteRepository> {
    repo: R,
    config: VaultConfig,
    engine: GraphEngine,
}

impl<R: NoteRepository> VaultService<R> {
    pub fn new(repo: R, config: VaultConfig) -> Result<VaultService<R>, VaultError> {
        config.validate()?;
        let engine = GraphEngine::from_config(&config);
        Ok(VaultService {
            repo,
            config,
            engine,
        })
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T, VaultError>
    where
        F: Future<Output = Result<T, VaultError>>,
    {
        let limit = self.config.request_timeout();
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("{} timed out after {:?}", operation, limit);
                Err(VaultError::Timeout(limit.as_millis() as u64))
            }
        }
    }

    pub async fn build_full_graph(&self) -> Result<GraphData, VaultError> {
        self.build_full_graph_with(PhantomPolicy::Drop).await
    }

    pub async fn build_full_graph_with(
        &self,
        phantoms: PhantomPolicy,
    ) -> Result<GraphData, VaultError> {
        let traversal = TraversalConfig::full_graph()
            .with_phantoms(phantoms)
            .tuned_by(&self.config);
        self.bounded(
            "full graph build",
            self.engine.build_full_graph(&self.repo, &traversal),
        )
        .await
    }

    /// Neighbourhood of `start`, `depth` clamped to `[1, max_depth]` (default `default_depth`).
    pub async fn traverse_from_node(
        &self,
        start: &str,
        depth: Option<u32>,
    ) -> Result<GraphData, VaultError> {
        let start = non_empty("start path", start)?;
        let depth = self.config.clamp_depth(depth);
        let traversal = TraversalConfig::bounded(depth).tuned_by(&self.config);
        self.bounded(
            "traversal",
            self.engine.traverse_from_node(&self.repo, start, &traversal),
        )
        .await
    }

    pub async fn find_backlinks(&self, target_path: &str) -> Result<BacklinkReport, VaultError> {
        let target_path = non_empty("target path", target_path)?;
        self.bounded(
            "backlink scan",
            self.engine.find_backlinks(
                &self.repo,
                target_path,
                ResolveMode::Permissive,
                self.config.fetch_concurrency,
            ),
        )
        .await
    }

    /// `limit` defaults to the configured `search_limit` and never exceeds it.
    pub async fn search(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>, VaultError> {
        let limit = limit
            .unwrap_or(self.config.search_limit)
            .min(self.config.search_limit);
        self.bounded(
            "search",
            search::search_by_name_or_path(&self.repo, query, self.engine.naming(), limit),
        )
        .await
    }

    pub async fn build_index(&self) -> Result<VaultIndex, VaultError> {
        self.bounded(
            "index build",
            search::build_index(
                &self.repo,
                self.config.fetch_concurrency,
                self.config.progress_interval,
            ),
        )
        .await
    }

    pub async fn read_note(&self, path: &str) -> Result<NoteContent, VaultError> {
        let path = non_empty("path", path)?;
        self.bounded("read", self.repo.get_content_with_revision(path))
            .await
    }

    pub async fn create_note(
        &self,
        path: &str,
        content: Option<&str>,
    ) -> Result<WriteReceipt, VaultError> {
        let path = non_empty("path", path)?;
        let content = content.unwrap_or(NEW_NOTE_TEMPLATE);
        let receipt = self
            .bounded("create", self.repo.create_note(path, content))
            .await?;
        tracing::info!("Created {}", receipt.path);
        Ok(receipt)
    }

    pub async fn update_note(
        &self,
        path: &str,
        content: &str,
        revision: &str,
    ) -> Result<WriteReceipt, VaultError> {
        let path = non_empty("path", path)?;
        let revision = non_empty("revision", revision)?;
        let receipt = self
            .bounded("update", self.repo.update_note(path, content, revision))
            .await?;
        tracing::info!("Updated {}", receipt.path);
        Ok(receipt)
    }
}

fn non_empty<'a>(what: &str, value: &'a str) -> Result<&'a str, VaultError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(VaultError::InvalidRequest(format!("missing {what}")))
    } else {
        Ok(trimmed)
    }
}
