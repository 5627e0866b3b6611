//! Shared test utilities for repository-backed tests

use std::time::Duration;

use crate::{
    error::VaultError,
    repository::{MemoryRepository, NoteContent, NoteRepository, WriteReceipt},
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A small vault touching every group prefix, with a cycle, a self-link, an alias and two
/// references that resolve nowhere.
pub fn sample_vault() -> MemoryRepository {
    init_logging();
    MemoryRepository::from_notes([
        ("index.md", "# Index\n[[Projects/Alpha]] and [[log/2024-01-01|today]]\n[[ghost]]"),
        ("projects/alpha.md", "Alpha links back to [[index]] and to [[beta]]"),
        ("projects/beta.md", "Beta is a leaf. See [[Beta]] itself."),
        ("log/2024-01-01.md", "Worked on [[alpha]].\nThought about [[nothing here]]"),
        ("diary/monday.md", "quiet day"),
        ("sketch/shapes.md", "[[database/schema]]"),
        ("database/schema.md", "columns"),
    ])
}

/// Delays every call to the wrapped repository. Pair with a paused tokio clock.
#[derive(Debug, Clone)]
pub struct SlowRepository {
    inner: MemoryRepository,
    delay: Duration,
}

impl SlowRepository {
    pub fn new(inner: MemoryRepository, delay: Duration) -> SlowRepository {
        SlowRepository { inner, delay }
    }
}

impl NoteRepository for SlowRepository {
    async fn list_all_notes(&self) -> Result<Vec<String>, VaultError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_all_notes().await
    }

    async fn get_content(&self, path: &str) -> Result<String, VaultError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_content(path).await
    }

    async fn get_content_with_revision(&self, path: &str) -> Result<NoteContent, VaultError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_content_with_revision(path).await
    }

    async fn create_note(&self, path: &str, content: &str) -> Result<WriteReceipt, VaultError> {
        tokio::time::sleep(self.delay).await;
        self.inner.create_note(path, content).await
    }

    async fn update_note(
        &self,
        path: &str,
        content: &str,
        revision: &str,
    ) -> Result<WriteReceipt, VaultError> {
        tokio::time::sleep(self.delay).await;
        self.inner.update_note(path, content, revision).await
    }
}
