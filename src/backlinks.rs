//! Reverse references: which notes link to a given note, and where.
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::{
    diagnostic::{isolate, ScanDiagnostic},
    engine::GraphEngine,
    error::VaultError,
    paths::fold_case,
    repository::NoteRepository,
    resolve::{PathResolver, ResolveMode},
    wikilink,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backlink {
    pub path: String,
    pub name: String,
    /// First line of the referring note that mentions the target, trimmed. Empty when only an
    /// alias or partial path was used.
    pub context: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacklinkReport {
    pub backlinks: Vec<Backlink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<ScanDiagnostic>,
}

impl BacklinkReport {
    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Best-effort context line for a reference to a note displayed as `name`.
pub fn context_line(text: &str, name: &str) -> String {
    let bracketed = format!("[[{name}]]");
    let folded = fold_case(name);
    text.lines()
        .find(|line| line.contains(&bracketed) || fold_case(line).contains(&folded))
        .map(|line| line.trim().to_string())
        .unwrap_or_default()
}

impl GraphEngine {
    /// Every note (in listing order) with at least one reference resolving to `target_path`.
    /// Self-references count.
    #[tracing::instrument(skip(self, repo))]
    pub async fn find_backlinks<R: NoteRepository>(
        &self,
        repo: &R,
        target_path: &str,
        mode: ResolveMode,
        fetch_concurrency: usize,
    ) -> Result<BacklinkReport, VaultError> {
        let all_paths = repo.list_all_notes().await?;
        let resolver = PathResolver::new(&all_paths, self.naming(), mode);
        let target_id = self.naming().identity(target_path);
        let target_name = self.naming().display_name(target_path);

        let mut fetches = stream::iter(all_paths.iter().map(|path| async move {
            (path, repo.get_content(path).await)
        }))
        .buffered(fetch_concurrency.max(1));

        let mut report = BacklinkReport::default();
        while let Some((path, content)) = fetches.next().await {
            let text = match content {
                Ok(text) => text,
                Err(e) => {
                    isolate(&mut report.diagnostics, path, e)?;
                    continue;
                }
            };
            let links_here = wikilink::extract(&text).iter().any(|link| {
                resolver
                    .resolve(&link.target)
                    .is_some_and(|resolved| self.naming().identity(resolved) == target_id)
            });
            if links_here {
                tracing::debug!("{} links to {}", path, target_path);
                report.backlinks.push(Backlink {
                    path: path.clone(),
                    name: self.naming().display_name(path),
                    context: context_line(&text, &target_name),
                });
            }
        }
        Ok(report)
    }
}
