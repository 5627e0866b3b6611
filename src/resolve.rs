//! Wikilink target resolution against the vault's note listing.
//!
//! Tiers are tried in order and the first candidate (in listing order) that matches a tier wins.
//! There is no scoring: a later, "better" candidate never displaces an earlier match.
//!
//! 1. [`ResolveTier::Identity`]: the target's identity equals the candidate's identity.
//! 2. [`ResolveTier::Basename`]: the target equals the candidate's extension-less final segment.
//! 3. [`ResolveTier::Suffix`]: the candidate's full path ends with `target + suffix`.
//! 4. [`ResolveTier::Contains`]: the candidate's identity contains the target
//!    ([`ResolveMode::Permissive`] only).
use serde::{Deserialize, Serialize};

use crate::paths::{basename, fold_case, NoteIdentity, NoteNaming};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    /// Identity, basename and suffix tiers.
    #[default]
    Strict,
    /// Strict tiers followed by a substring-contains fallback.
    Permissive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveTier {
    Identity,
    Basename,
    Suffix,
    Contains,
}

#[derive(Debug)]
struct Candidate<'a> {
    path: &'a str,
    identity: NoteIdentity,
    stem: String,
    folded_path: String,
}

/// Resolver over a fixed listing. Candidate keys are computed once so a whole-vault scan does not
/// re-normalize the listing for every reference.
#[derive(Debug)]
pub struct PathResolver<'a> {
    candidates: Vec<Candidate<'a>>,
    naming: NoteNaming,
    folded_suffix: String,
    mode: ResolveMode,
}

impl<'a> PathResolver<'a> {
    pub fn new<S: AsRef<str>>(
        all_paths: &'a [S],
        naming: &NoteNaming,
        mode: ResolveMode,
    ) -> PathResolver<'a> {
        let candidates = all_paths
            .iter()
            .map(|p| {
                let path = p.as_ref();
                Candidate {
                    path,
                    identity: naming.identity(path),
                    stem: fold_case(naming.strip_extension(basename(path))),
                    folded_path: fold_case(path),
                }
            })
            .collect();
        PathResolver {
            candidates,
            naming: naming.clone(),
            folded_suffix: fold_case(naming.suffix()),
            mode,
        }
    }

    pub fn resolve(&self, target: &str) -> Option<&'a str> {
        self.resolve_with_tier(target).map(|(path, _)| path)
    }

    /// Resolve `target`, also reporting which tier matched.
    pub fn resolve_with_tier(&self, target: &str) -> Option<(&'a str, ResolveTier)> {
        let wanted = self.naming.identity(target.trim());
        if wanted.as_str().is_empty() {
            return None;
        }

        if let Some(c) = self.candidates.iter().find(|c| c.identity == wanted) {
            return Some((c.path, ResolveTier::Identity));
        }

        if let Some(c) = self.candidates.iter().find(|c| c.stem == wanted.as_str()) {
            return Some((c.path, ResolveTier::Basename));
        }

        let suffixed = format!("{}{}", wanted.as_str(), self.folded_suffix);
        if let Some(c) = self
            .candidates
            .iter()
            .find(|c| c.folded_path.ends_with(&suffixed))
        {
            return Some((c.path, ResolveTier::Suffix));
        }

        if self.mode == ResolveMode::Permissive {
            if let Some(c) = self
                .candidates
                .iter()
                .find(|c| c.identity.as_str().contains(wanted.as_str()))
            {
                return Some((c.path, ResolveTier::Contains));
            }
        }

        tracing::trace!("unresolved wikilink target '{}'", target);
        None
    }
}

/// One-shot resolution of `target` against `all_paths`.
pub fn resolve<'a, S: AsRef<str>>(
    target: &str,
    all_paths: &'a [S],
    naming: &NoteNaming,
    mode: ResolveMode,
) -> Option<&'a str> {
    PathResolver::new(all_paths, naming, mode).resolve(target)
}
