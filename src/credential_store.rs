// Where the bearer token lives between runs.
//
// Reads and writes are synchronous; only the session controller writes.

use crate::error::{ConsoleError, ConsoleResult};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

/// Holds at most one bearer token.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> ConsoleResult<Option<String>>;
    fn set(&self, token: &str) -> ConsoleResult<()>;
    /// Removes the token. Clearing an empty store succeeds.
    fn clear(&self) -> ConsoleResult<()>;
}

/// Persists the token as the whole content of a single file.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> ConsoleResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => {
                let token = data.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConsoleError::Storage(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn set(&self, token: &str) -> ConsoleResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConsoleError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        std::fs::write(&self.path, token).map_err(|e| {
            ConsoleError::Storage(format!("failed to write {}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), "token persisted");
        Ok(())
    }

    fn clear(&self) -> ConsoleResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConsoleError::Storage(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

/// Process-local store; nothing survives a restart.
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> ConsoleResult<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|_| ConsoleError::Storage("token lock poisoned".into()))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> ConsoleResult<Option<String>> {
        Ok(self.slot()?.clone())
    }

    fn set(&self, token: &str) -> ConsoleResult<()> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> ConsoleResult<()> {
        *self.slot()? = None;
        Ok(())
    }
}
