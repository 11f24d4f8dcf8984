// Session value and the controller that owns its lifecycle.
//
// The controller is the only writer of the credential store. Every other
// client receives a `Session` by reference and never reads ambient state.

use crate::api::ApiClient;
use crate::credential_store::CredentialStore;
use crate::error::{ConsoleError, ConsoleResult};
use crate::types::NewUser;
use std::fmt;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// The bearer credential of one signed-in user, or nothing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

/// Login, registration and logout. Owns the credential store.
pub struct SessionController {
    api: ApiClient,
    store: Box<dyn CredentialStore>,
    session: RwLock<Session>,
}

impl SessionController {
    /// Creates the controller, restoring a token persisted by an earlier run.
    pub fn new(api: ApiClient, store: Box<dyn CredentialStore>) -> ConsoleResult<Self> {
        let session = match store.get()? {
            Some(token) => {
                info!("restored persisted session");
                Session::with_token(token)
            }
            None => Session::anonymous(),
        };
        Ok(Self {
            api,
            store,
            session: RwLock::new(session),
        })
    }

    /// Snapshot of the current session, to pass into client calls.
    pub async fn current(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_authenticated()
    }

    /// Exchanges credentials for a token. On failure nothing stored changes.
    pub async fn login(&self, username: &str, password: &str) -> ConsoleResult<Session> {
        let resp = self.api.login(username, password).await.map_err(|e| {
            warn!(%username, "login failed: {e}");
            e
        })?;
        if resp.access_token.is_empty() {
            return Err(ConsoleError::Auth("server returned an empty token".into()));
        }

        self.store.set(&resp.access_token)?;
        let session = Session::with_token(resp.access_token);
        *self.session.write().await = session.clone();
        info!(%username, "logged in");
        Ok(session)
    }

    /// Creates an account. Does not log in.
    pub async fn register(&self, user: &NewUser) -> ConsoleResult<()> {
        self.api.register(user).await?;
        info!(username = %user.username, "registered");
        Ok(())
    }

    /// Forgets the token in memory and on disk. Safe to call repeatedly.
    pub async fn logout(&self) -> ConsoleResult<()> {
        let mut session = self.session.write().await;
        self.store.clear()?;
        if session.is_authenticated() {
            info!("logged out");
        }
        *session = Session::anonymous();
        Ok(())
    }

    /// Drops a token the server no longer accepts, provided it is still the
    /// one in use. Returns whether anything was cleared.
    pub async fn invalidate_if_current(&self, used: &Session) -> ConsoleResult<bool> {
        let mut session = self.session.write().await;
        if !used.is_authenticated() || *session != *used {
            return Ok(false);
        }
        warn!("server rejected the session token, clearing it");
        self.store.clear()?;
        *session = Session::anonymous();
        Ok(true)
    }
}
