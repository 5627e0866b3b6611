//! Storage-path helpers: note identities, display names and extension handling.
//!
//! Storage paths are always `/`-separated and relative to the vault root (`"log/2024-01-01.md"`),
//! regardless of the host OS. [`NoteNaming`] carries the configured note suffix so every component
//! strips and appends it the same way.
use serde::{Deserialize, Serialize};
use std::{
    borrow::Cow,
    fmt::{Display, Formatter},
    path::{Component, Path},
};
use unicode_normalization::UnicodeNormalization;

use crate::error::VaultError;

pub const DEFAULT_EXTENSION: &str = "md";

/// Case-insensitive, extension-stripped key used to deduplicate notes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteIdentity(String);

impl NoteIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NoteIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NoteIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Case-fold a string the way identities are compared: NFC first so composed and decomposed
/// accents collapse onto the same key, then lowercase.
pub fn fold_case(raw: &str) -> String {
    raw.nfc().collect::<String>().to_lowercase()
}

/// The final `/`-separated segment of a storage path.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Naming rules derived from the vault's note extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteNaming {
    ext: String,
    suffix: String,
}

impl Default for NoteNaming {
    fn default() -> Self {
        NoteNaming::new(DEFAULT_EXTENSION)
    }
}

impl NoteNaming {
    /// `ext` may be given with or without its leading dot.
    pub fn new(ext: &str) -> NoteNaming {
        let ext = ext.trim_start_matches('.').to_string();
        let suffix = format!(".{ext}");
        NoteNaming { ext, suffix }
    }

    pub fn extension(&self) -> &str {
        &self.ext
    }

    /// The extension with its leading dot, e.g. `".md"`.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn is_note(&self, path: &str) -> bool {
        path.len() > self.suffix.len() && path.ends_with(&self.suffix)
    }

    pub fn strip_extension<'a>(&self, path: &'a str) -> &'a str {
        path.strip_suffix(self.suffix.as_str()).unwrap_or(path)
    }

    /// Appends the note suffix unless the path already carries it.
    pub fn with_extension(&self, path: &str) -> String {
        if path.ends_with(&self.suffix) {
            path.to_string()
        } else {
            format!("{path}{}", self.suffix)
        }
    }

    /// Identity of a storage path or of a raw reference target. Both normalize identically, so an
    /// extension-bearing target (`[[notes/a.md]]`) compares equal to the identity of `notes/a.md`.
    pub fn identity(&self, raw: &str) -> NoteIdentity {
        NoteIdentity(fold_case(self.strip_extension(raw)))
    }

    /// Basename with the extension stripped, falling back to the full path when that is empty.
    pub fn display_name(&self, path: &str) -> String {
        let name = self.strip_extension(basename(path));
        if name.is_empty() {
            path.to_string()
        } else {
            name.to_string()
        }
    }
}

/// Turn an OS path (relative to the vault root) into a `/`-separated storage path.
pub fn os_path_to_string<P: AsRef<Path>>(os_path_ref: P) -> String {
    let res = os_path_ref
        .as_ref()
        .components()
        .filter_map(|c| match c {
            Component::RootDir | Component::Prefix(_) | Component::CurDir => None,
            _ => Some(c.as_os_str().to_string_lossy()),
        })
        .collect::<Vec<Cow<'_, str>>>()
        .join("/");
    tracing::trace!(
        "os_path_to_string: turned {:?} into {}",
        os_path_ref.as_ref(),
        res
    );
    res
}

/// Validate a caller-supplied storage path: relative, no empty, `.` or `..` segments.
pub fn validate_storage_path(path: &str) -> Result<&str, VaultError> {
    if path.trim().is_empty() {
        return Err(VaultError::InvalidRequest("empty note path".to_string()));
    }
    if path.starts_with('/') || path.contains('\\') {
        return Err(VaultError::InvalidRequest(format!(
            "note path must be relative and '/'-separated: {path}"
        )));
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(VaultError::InvalidRequest(format!(
            "note path has an empty or relative segment: {path}"
        )));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_strips_extension_and_folds_case() {
        let naming = NoteNaming::default();
        assert_eq!(naming.identity("Folder/Note.md").as_str(), "folder/note");
        assert_eq!(naming.identity("Folder/Note").as_str(), "folder/note");
        // Only the configured suffix is stripped, and only at the end.
        assert_eq!(naming.identity("a.md.txt").as_str(), "a.md.txt");
        assert_eq!(naming.identity("a.MD").as_str(), "a.md");
    }

    #[test]
    fn identity_unifies_unicode_forms() {
        let naming = NoteNaming::default();
        let composed = naming.identity("Caf\u{e9}.md");
        let decomposed = naming.identity("Cafe\u{301}.md");
        assert_eq!(composed, decomposed);
    }

    #[test]
    fn display_names() {
        let naming = NoteNaming::new(".md");
        assert_eq!(naming.extension(), "md");
        assert_eq!(naming.display_name("diary/2024/Today.md"), "Today");
        assert_eq!(naming.display_name("plain"), "plain");
        assert_eq!(naming.display_name("dir/.md"), "dir/.md");
        assert_eq!(naming.with_extension("x"), "x.md");
        assert_eq!(naming.with_extension("x.md"), "x.md");
        assert!(naming.is_note("a.md"));
        assert!(!naming.is_note(".md"));
        assert!(!naming.is_note("a.txt"));
    }

    #[test]
    fn storage_path_validation() {
        assert!(validate_storage_path("a/b.md").is_ok());
        assert!(validate_storage_path("").is_err());
        assert!(validate_storage_path("/etc/passwd").is_err());
        assert!(validate_storage_path("a/../../b.md").is_err());
        assert!(validate_storage_path("a//b.md").is_err());
    }

    #[test]
    fn os_paths_become_slash_separated() {
        let p = Path::new("log").join("2024").join("a.md");
        assert_eq!(os_path_to_string(p), "log/2024/a.md");
    }
}
