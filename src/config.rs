use serde::{Deserialize, Serialize};
use std::{fs::read_to_string, path::Path, time::Duration};

use crate::{
    error::VaultError,
    graph::{GroupRules, PHANTOM_GROUP},
    paths::{NoteNaming, DEFAULT_EXTENSION},
};

/// Vault-level settings, typically read from a `vault-graph.toml`:
///
/// ```toml
/// extension = "md"
/// search_limit = 50
/// max_depth = 5
///
/// [[groups]]
/// prefix = "log/"
/// group = 1
/// ```
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Note extension, without the leading dot.
    pub extension: String,
    pub groups: GroupRules,
    pub search_limit: usize,
    pub default_depth: u32,
    pub max_depth: u32,
    pub request_timeout_secs: u64,
    /// Upper bound on note fetches in flight during one scan.
    pub fetch_concurrency: usize,
    /// Log build progress every this many notes.
    pub progress_interval: usize,
    pub autosave_idle_secs: u64,
    pub autosave_max_wait_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        VaultConfig {
            extension: DEFAULT_EXTENSION.to_string(),
            groups: GroupRules::default(),
            search_limit: 50,
            default_depth: 2,
            max_depth: 5,
            request_timeout_secs: 60,
            fetch_concurrency: 8,
            progress_interval: 50,
            autosave_idle_secs: 15,
            autosave_max_wait_secs: 300,
        }
    }
}

impl VaultConfig {
    pub fn from_toml_str(content: &str) -> Result<VaultConfig, VaultError> {
        let config: VaultConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<VaultConfig, VaultError> {
        tracing::debug!("Attempting to read config from: {:?}", path.as_ref());
        let content = read_to_string(path.as_ref())?;
        VaultConfig::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), VaultError> {
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(VaultError::Config("extension must not be empty".to_string()));
        }
        if let Some(rule) = self.groups.0.iter().find(|rule| rule.group < 0) {
            return Err(VaultError::Config(format!(
                "group {} for prefix '{}' is negative; negative groups ({} marks phantoms) are reserved",
                rule.group, rule.prefix, PHANTOM_GROUP
            )));
        }
        if self.max_depth == 0 {
            return Err(VaultError::Config("max_depth must be at least 1".to_string()));
        }
        if self.fetch_concurrency == 0 {
            return Err(VaultError::Config(
                "fetch_concurrency must be at least 1".to_string(),
            ));
        }
        if self.search_limit == 0 {
            return Err(VaultError::Config("search_limit must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn naming(&self) -> NoteNaming {
        NoteNaming::new(&self.extension)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn autosave_idle(&self) -> Duration {
        Duration::from_secs(self.autosave_idle_secs)
    }

    pub fn autosave_max_wait(&self) -> Duration {
        Duration::from_secs(self.autosave_max_wait_secs)
    }

    /// Clamp a caller-supplied traversal depth into `[1, max_depth]`.
    pub fn clamp_depth(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_depth)
            .clamp(1, self.max_depth.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GroupRule;

    #[test]
    fn empty_document_yields_defaults() {
        let config = VaultConfig::from_toml_str("").unwrap();
        assert_eq!(config, VaultConfig::default());
        assert_eq!(config.naming().suffix(), ".md");
    }

    #[test]
    fn parses_overrides() {
        let config = VaultConfig::from_toml_str(
            r#"
extension = "markdown"
search_limit = 10
request_timeout_secs = 5

[[groups]]
prefix = "inbox/"
group = 7
"#,
        )
        .unwrap();
        assert_eq!(config.extension, "markdown");
        assert_eq!(config.search_limit, 10);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.groups, GroupRules(vec![GroupRule::new("inbox/", 7)]));
        assert_eq!(config.max_depth, 5);
    }

    #[test]
    fn rejects_reserved_groups_and_bad_limits() {
        assert!(matches!(
            VaultConfig::from_toml_str("[[groups]]\nprefix = \"x/\"\ngroup = -1\n"),
            Err(VaultError::Config(_))
        ));
        assert!(VaultConfig::from_toml_str("fetch_concurrency = 0").is_err());
        assert!(VaultConfig::from_toml_str("max_depth = 0").is_err());
        assert!(VaultConfig::from_toml_str("extension = \"\"").is_err());
        assert!(VaultConfig::from_toml_str("search_limit = \"many\"").is_err());
    }

    #[test]
    fn depth_clamping() {
        let config = VaultConfig::default();
        assert_eq!(config.clamp_depth(None), 2);
        assert_eq!(config.clamp_depth(Some(0)), 1);
        assert_eq!(config.clamp_depth(Some(3)), 3);
        assert_eq!(config.clamp_depth(Some(99)), 5);
    }
}
