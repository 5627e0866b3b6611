//! Name/path lookup and the whole-vault reference index.
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashSet},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    diagnostic::{isolate, ScanDiagnostic},
    error::VaultError,
    paths::{fold_case, NoteNaming},
    repository::NoteRepository,
    wikilink,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub path: String,
    pub name: String,
}

/// Case-insensitive substring match of `query` against each path and display name, in listing
/// order, capped at `limit`. A blank query matches nothing.
pub fn search_paths<S: AsRef<str>>(
    query: &str,
    all_paths: &[S],
    naming: &NoteNaming,
    limit: usize,
) -> Vec<SearchHit> {
    let query = fold_case(query.trim());
    if query.is_empty() {
        return Vec::new();
    }
    all_paths
        .iter()
        .map(AsRef::as_ref)
        .filter_map(|path| {
            let name = naming.display_name(path);
            if fold_case(path).contains(&query) || fold_case(&name).contains(&query) {
                Some(SearchHit {
                    path: path.to_string(),
                    name,
                })
            } else {
                None
            }
        })
        .take(limit)
        .collect()
}

pub async fn search_by_name_or_path<R: NoteRepository>(
    repo: &R,
    query: &str,
    naming: &NoteNaming,
    limit: usize,
) -> Result<Vec<SearchHit>, VaultError> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }
    let all_paths = repo.list_all_notes().await?;
    let hits = search_paths(query, &all_paths, naming, limit);
    tracing::debug!("search '{}': {} hits", query.trim(), hits.len());
    Ok(hits)
}

/// Every note and the raw reference targets it contains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultIndex {
    pub files: Vec<String>,
    /// Raw targets per note, in occurrence order. Notes without references are omitted.
    pub wikilinks: BTreeMap<String, Vec<String>>,
    /// Distinct targets across the vault, in first-seen order.
    pub all_wikilinks: Vec<String>,
    /// Milliseconds since the Unix epoch when the index was built.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<ScanDiagnostic>,
}

#[tracing::instrument(skip(repo))]
pub async fn build_index<R: NoteRepository>(
    repo: &R,
    fetch_concurrency: usize,
    progress_interval: usize,
) -> Result<VaultIndex, VaultError> {
    let files = repo.list_all_notes().await?;
    tracing::info!("Indexing {} notes", files.len());

    let mut index = VaultIndex {
        files: Vec::new(),
        timestamp: epoch_millis(),
        ..Default::default()
    };
    let mut seen = HashSet::new();

    let mut fetches = stream::iter(
        files
            .iter()
            .map(|path| async move { (path, repo.get_content(path).await) }),
    )
    .buffered(fetch_concurrency.max(1));

    let mut processed = 0;
    while let Some((path, content)) = fetches.next().await {
        processed += 1;
        match content {
            Ok(text) => {
                let targets: Vec<String> = wikilink::extract(&text)
                    .into_iter()
                    .map(|link| link.target)
                    .collect();
                for target in targets.iter() {
                    if seen.insert(target.clone()) {
                        index.all_wikilinks.push(target.clone());
                    }
                }
                if !targets.is_empty() {
                    index.wikilinks.insert(path.clone(), targets);
                }
            }
            Err(e) => isolate(&mut index.diagnostics, path, e)?,
        }
        if progress_interval > 0 && processed % progress_interval == 0 {
            tracing::info!("Index: processed {}/{} notes", processed, files.len());
        }
    }
    drop(fetches);

    tracing::info!(
        "Indexed {} notes, {} distinct targets",
        files.len(),
        index.all_wikilinks.len()
    );
    index.files = files;
    Ok(index)
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
