use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::VaultError;

/// A note that a multi-note scan skipped, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanDiagnostic {
    pub path: String,
    pub error: VaultError,
}

impl ScanDiagnostic {
    pub fn new(path: &str, error: VaultError) -> ScanDiagnostic {
        ScanDiagnostic {
            path: path.to_string(),
            error,
        }
    }
}

impl Display for ScanDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}

/// Record a per-note failure, or hand it back when it is fatal for the whole scan.
pub(crate) fn isolate(
    diagnostics: &mut Vec<ScanDiagnostic>,
    path: &str,
    error: VaultError,
) -> Result<(), VaultError> {
    if error.is_fatal() {
        return Err(error);
    }
    tracing::warn!("Skipping {}: {}", path, error);
    diagnostics.push(ScanDiagnostic::new(path, error));
    Ok(())
}
