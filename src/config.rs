// Console configuration, read from the environment.

use std::path::PathBuf;

/// Environment variable holding the API root URL.
pub const BACKEND_URL_VAR: &str = "CONSOLE_BACKEND_URL";
/// Environment variable overriding where the bearer token is persisted.
pub const TOKEN_FILE_VAR: &str = "CONSOLE_TOKEN_FILE";

const DEFAULT_BACKEND_URL: &str = "https://localhost:80/api";
const TOKEN_FILE_NAME: &str = ".dummy_console_token";

#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    /// API root; every endpoint path is appended to it (e.g. "https://host/api").
    pub backend_url: String,

    /// File that keeps the bearer token across runs.
    pub token_path: PathBuf,
}

impl ConsoleConfig {
    pub fn new(backend_url: impl Into<String>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            backend_url: backend_url.into(),
            token_path: token_path.into(),
        }
    }

    /// Build the config from `CONSOLE_BACKEND_URL` and `CONSOLE_TOKEN_FILE`,
    /// falling back to a local backend and a token file in the home directory.
    pub fn from_env() -> Self {
        let backend_url =
            std::env::var(BACKEND_URL_VAR).unwrap_or_else(|_| DEFAULT_BACKEND_URL.into());
        let token_path = std::env::var_os(TOKEN_FILE_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_token_path);
        Self {
            backend_url,
            token_path,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_URL, default_token_path())
    }
}

fn default_token_path() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(TOKEN_FILE_NAME)
}
