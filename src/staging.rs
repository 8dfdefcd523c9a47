use crate::errors::StagingError;
use log::{debug, warn};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// What a staged secret contains. The connector consumes exactly one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Token,
    ClientSecret,
}

impl SecretKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretKind::Token => "token",
            SecretKind::ClientSecret => "client_secret",
        }
    }
}

/// Handle to a secret written to ephemeral storage.
///
/// The secret lives in a private temporary file (created `0600` on unix) so
/// that file-oriented consumers can read it. Deletion is guaranteed on every
/// exit path: `release` removes the file eagerly and is idempotent, and any
/// handle still alive when dropped (panic, request cancellation, timeout)
/// removes it then.
pub struct StagedSecret {
    kind: SecretKind,
    // None once released; TempPath deletes the file when dropped.
    path: Option<tempfile::TempPath>,
}

impl StagedSecret {
    /// Write `secret` to a fresh access-restricted temporary file.
    pub fn stage(kind: SecretKind, secret: &[u8]) -> Result<Self, StagingError> {
        let mut file = NamedTempFile::new()?;
        file.write_all(secret)?;
        file.flush()?;

        let path = file.into_temp_path();
        debug!("Staged {} secret ({} bytes)", kind.as_str(), secret.len());

        Ok(StagedSecret {
            kind,
            path: Some(path),
        })
    }

    pub fn kind(&self) -> SecretKind {
        self.kind
    }

    /// Location of the staged material, or `None` once released.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Delete the staged material. Safe to call more than once.
    pub fn release(&mut self) -> Result<(), StagingError> {
        if let Some(path) = self.path.take() {
            debug!("Releasing staged {} secret", self.kind.as_str());
            path.close()?;
        }
        Ok(())
    }
}

impl Drop for StagedSecret {
    fn drop(&mut self) {
        if self.path.is_some() {
            warn!(
                "Staged {} secret released on drop instead of explicitly",
                self.kind.as_str()
            );
        }
        // TempPath::drop deletes the file.
    }
}

impl std::fmt::Debug for StagedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedSecret")
            .field("kind", &self.kind)
            .field("released", &self.path.is_none())
            .finish()
    }
}
