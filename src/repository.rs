//! The note repository contract and two adapters.
//!
//! [`NoteRepository`] is the narrow interface every graph operation talks through. The core never
//! reads ambient state: callers hand a repository handle to each operation.
//!
//! - [`MemoryRepository`]: ordered in-memory vault, with fault injection for tests
//! - [`FsRepository`]: a vault directory on the local filesystem
//!
//! Revisions are opaque tokens used for optimistic concurrency. Both adapters derive them from the
//! note content the same way git names blobs, so identical content always carries the same
//! revision.
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    collections::{BTreeMap, BTreeSet},
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};
use walkdir::WalkDir;

use crate::{
    error::VaultError,
    paths::{os_path_to_string, validate_storage_path, NoteNaming},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteContent {
    pub text: String,
    pub revision: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt {
    pub path: String,
    pub revision: String,
}

/// Consumed contract of the backing store.
///
/// Implementations report transport or authorization problems as
/// [`VaultError::RepositoryUnavailable`], absent notes as [`VaultError::NotFound`] and stale or
/// clashing writes as [`VaultError::Conflict`].
pub trait NoteRepository: Sync {
    /// Every note path under the vault root, in the repository's enumeration order.
    fn list_all_notes(&self) -> impl Future<Output = Result<Vec<String>, VaultError>> + Send;

    fn get_content(&self, path: &str) -> impl Future<Output = Result<String, VaultError>> + Send;

    fn get_content_with_revision(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<NoteContent, VaultError>> + Send;

    /// Fails with [`VaultError::Conflict`] when `path` already exists.
    fn create_note(
        &self,
        path: &str,
        content: &str,
    ) -> impl Future<Output = Result<WriteReceipt, VaultError>> + Send;

    /// Fails with [`VaultError::Conflict`] when `revision` is not the stored revision.
    fn update_note(
        &self,
        path: &str,
        content: &str,
        revision: &str,
    ) -> impl Future<Output = Result<WriteReceipt, VaultError>> + Send;
}

/// Git-style blob hash of `content`, hex encoded.
pub fn content_revision(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("blob {}\0", content.len()).as_bytes());
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

fn conflict(path: &str, expected: Option<&str>, actual: Option<String>) -> VaultError {
    VaultError::Conflict {
        path: path.to_string(),
        expected: expected.map(str::to_string),
        actual,
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    order: Vec<String>,
    notes: BTreeMap<String, String>,
    failing: BTreeSet<String>,
    unavailable: bool,
}

/// In-memory vault. Listing order is insertion order. Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryRepository {
    pub fn new() -> MemoryRepository {
        MemoryRepository::default()
    }

    pub fn from_notes<I, P, C>(notes: I) -> MemoryRepository
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let repo = MemoryRepository::new();
        for (path, content) in notes {
            repo.insert(path, content);
        }
        repo
    }

    /// Insert or overwrite a note without revision checks.
    pub fn insert(&self, path: impl Into<String>, content: impl Into<String>) {
        let path = path.into();
        let mut state = self.state.write();
        if !state.notes.contains_key(&path) {
            state.order.push(path.clone());
        }
        state.notes.insert(path, content.into());
    }

    /// Make every read of `path` fail with an I/O error while it stays listed.
    pub fn fail_note(&self, path: &str) {
        self.state.write().failing.insert(path.to_string());
    }

    /// Make every operation fail with [`VaultError::RepositoryUnavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unavailable = unavailable;
    }

    fn check_available(&self) -> Result<(), VaultError> {
        if self.state.read().unavailable {
            Err(VaultError::RepositoryUnavailable(
                "memory repository marked unavailable".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn read(&self, path: &str) -> Result<String, VaultError> {
        self.check_available()?;
        let state = self.state.read();
        if state.failing.contains(path) {
            return Err(VaultError::Io(format!("injected read failure for {path}")));
        }
        state
            .notes
            .get(path)
            .cloned()
            .ok_or_else(|| VaultError::NotFound(path.to_string()))
    }
}

impl NoteRepository for MemoryRepository {
    async fn list_all_notes(&self) -> Result<Vec<String>, VaultError> {
        self.check_available()?;
        Ok(self.state.read().order.clone())
    }

    async fn get_content(&self, path: &str) -> Result<String, VaultError> {
        self.read(path)
    }

    async fn get_content_with_revision(&self, path: &str) -> Result<NoteContent, VaultError> {
        let text = self.read(path)?;
        Ok(NoteContent {
            revision: content_revision(&text),
            size: text.len(),
            text,
        })
    }

    async fn create_note(&self, path: &str, content: &str) -> Result<WriteReceipt, VaultError> {
        self.check_available()?;
        let mut state = self.state.write();
        if let Some(existing) = state.notes.get(path) {
            return Err(conflict(path, None, Some(content_revision(existing))));
        }
        state.order.push(path.to_string());
        state.notes.insert(path.to_string(), content.to_string());
        Ok(WriteReceipt {
            path: path.to_string(),
            revision: content_revision(content),
        })
    }

    async fn update_note(
        &self,
        path: &str,
        content: &str,
        revision: &str,
    ) -> Result<WriteReceipt, VaultError> {
        self.check_available()?;
        let mut state = self.state.write();
        let current = state
            .notes
            .get(path)
            .map(|text| content_revision(text))
            .ok_or_else(|| VaultError::NotFound(path.to_string()))?;
        if current != revision {
            return Err(conflict(path, Some(revision), Some(current)));
        }
        state.notes.insert(path.to_string(), content.to_string());
        Ok(WriteReceipt {
            path: path.to_string(),
            revision: content_revision(content),
        })
    }
}

/// A vault rooted at a local directory.
///
/// Listing walks the tree in file-name order, skips hidden entries (`.git`, `.obsidian`) and keeps
/// only files carrying the note extension.
#[derive(Debug, Clone)]
pub struct FsRepository {
    root: PathBuf,
    naming: NoteNaming,
}

impl FsRepository {
    pub fn new(root: impl AsRef<Path>, naming: NoteNaming) -> Result<FsRepository, VaultError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(VaultError::RepositoryUnavailable(format!(
                "vault root {root:?} is not a directory"
            )));
        }
        Ok(FsRepository { root, naming })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_path(&self, path: &str) -> Result<PathBuf, VaultError> {
        let path = validate_storage_path(path)?;
        Ok(path
            .split('/')
            .fold(self.root.clone(), |acc, segment| acc.join(segment)))
    }

    fn walk(&self) -> Result<Vec<String>, VaultError> {
        let mut notes = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
            });
        for entry in walker {
            let entry = entry.map_err(|e| {
                VaultError::RepositoryUnavailable(format!("failed to walk vault: {e}"))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = os_path_to_string(entry.path().strip_prefix(&self.root)?);
            if self.naming.is_note(&relative) {
                notes.push(relative);
            }
        }
        Ok(notes)
    }
}

impl NoteRepository for FsRepository {
    async fn list_all_notes(&self) -> Result<Vec<String>, VaultError> {
        let repo = self.clone();
        tokio::task::spawn_blocking(move || repo.walk())
            .await
            .map_err(|e| VaultError::RepositoryUnavailable(format!("listing task failed: {e}")))?
    }

    async fn get_content(&self, path: &str) -> Result<String, VaultError> {
        let file = self.resolve_path(path)?;
        tracing::debug!("Reading {:?}", file);
        Ok(tokio::fs::read_to_string(&file).await?)
    }

    async fn get_content_with_revision(&self, path: &str) -> Result<NoteContent, VaultError> {
        let text = self.get_content(path).await?;
        Ok(NoteContent {
            revision: content_revision(&text),
            size: text.len(),
            text,
        })
    }

    async fn create_note(&self, path: &str, content: &str) -> Result<WriteReceipt, VaultError> {
        let file = self.resolve_path(path)?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut handle = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file)
            .await
        {
            Ok(handle) => handle,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let existing = tokio::fs::read_to_string(&file).await.ok();
                return Err(conflict(path, None, existing.map(|t| content_revision(&t))));
            }
            Err(e) => return Err(e.into()),
        };
        tokio::io::AsyncWriteExt::write_all(&mut handle, content.as_bytes()).await?;
        tokio::io::AsyncWriteExt::flush(&mut handle).await?;
        Ok(WriteReceipt {
            path: path.to_string(),
            revision: content_revision(content),
        })
    }

    async fn update_note(
        &self,
        path: &str,
        content: &str,
        revision: &str,
    ) -> Result<WriteReceipt, VaultError> {
        let file = self.resolve_path(path)?;
        let current = content_revision(&tokio::fs::read_to_string(&file).await?);
        if current != revision {
            return Err(conflict(path, Some(revision), Some(current)));
        }
        tokio::fs::write(&file, content).await?;
        Ok(WriteReceipt {
            path: path.to_string(),
            revision: content_revision(content),
        })
    }
}
