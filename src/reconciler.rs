// Keeps the state shown to the user in line with the server.
//
// Cached lists are never patched in place. Every mutation is followed by a
// re-list of the affected collection, and the fresh list replaces the old
// one wholesale. Each list kind carries a generation counter so a slow,
// older refresh can never overwrite the result of a newer one.

use crate::api::ApiClient;
use crate::config::ConsoleConfig;
use crate::credential_store::{CredentialStore, FileCredentialStore};
use crate::draft::{EditMode, FormDraft};
use crate::error::ConsoleResult;
use crate::files::{FileClient, FileUpload, StorageTarget};
use crate::records::RecordClient;
use crate::session::{Session, SessionController};
use crate::types::{DummyRecord, NewUser, RecordId, RecordPatch};
use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Everything the presentation layer renders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    pub authenticated: bool,
    pub records: Vec<DummyRecord>,
    pub local_files: Vec<String>,
    pub remote_files: Vec<String>,
    /// Record returned by the latest successful create or update.
    pub last_saved: Option<DummyRecord>,
    /// Message of the latest failed action, cleared by the next success.
    pub last_error: Option<String>,
}

impl ViewState {
    pub fn files(&self, target: StorageTarget) -> &[String] {
        match target {
            StorageTarget::Local => &self.local_files,
            StorageTarget::RemoteObject => &self.remote_files,
        }
    }

    fn files_mut(&mut self, target: StorageTarget) -> &mut Vec<String> {
        match target {
            StorageTarget::Local => &mut self.local_files,
            StorageTarget::RemoteObject => &mut self.remote_files,
        }
    }
}

/// Monotonic request tickets for one kind of list.
#[derive(Debug, Default)]
pub struct GenerationGate {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl GenerationGate {
    /// Tags a refresh about to be sent.
    pub fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns true and records `ticket` as applied if nothing newer has
    /// been applied yet.
    pub fn try_apply(&self, ticket: u64) -> bool {
        self.applied.fetch_max(ticket, Ordering::SeqCst) < ticket
    }

    /// Makes every ticket issued so far stale.
    pub fn fence(&self) {
        let ticket = self.issue();
        self.applied.fetch_max(ticket, Ordering::SeqCst);
    }
}

/// The console's client core: session, records and files behind one
/// refresh-after-write facade.
pub struct Console {
    session: SessionController,
    records: RecordClient,
    files: FileClient,
    state: RwLock<ViewState>,
    record_gate: GenerationGate,
    local_gate: GenerationGate,
    remote_gate: GenerationGate,
}

impl Console {
    /// Console talking to `config.backend_url`, token kept in `config.token_path`.
    pub fn new(config: &ConsoleConfig) -> ConsoleResult<Self> {
        let api = ApiClient::new(config)?;
        let store = FileCredentialStore::new(config.token_path.clone());
        Self::with_store(api, Box::new(store))
    }

    pub fn with_store(api: ApiClient, store: Box<dyn CredentialStore>) -> ConsoleResult<Self> {
        Ok(Self {
            session: SessionController::new(api.clone(), store)?,
            records: RecordClient::new(api.clone()),
            files: FileClient::new(api),
            state: RwLock::new(ViewState::default()),
            record_gate: GenerationGate::default(),
            local_gate: GenerationGate::default(),
            remote_gate: GenerationGate::default(),
        })
    }

    pub async fn state(&self) -> ViewState {
        let mut state = self.state.read().await.clone();
        state.authenticated = self.session.is_authenticated().await;
        state
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    pub async fn session(&self) -> Session {
        self.session.current().await
    }

    /// Initial load. Without a session nothing is fetched and no error is
    /// raised; the caller shows the signed-out view.
    pub async fn mount(&self) -> ConsoleResult<()> {
        if !self.session.is_authenticated().await {
            debug!("mount without session, skipping refresh");
            return Ok(());
        }
        self.refresh_all().await
    }

    pub async fn login(&self, username: &str, password: &str) -> ConsoleResult<()> {
        let result = self.session.login(username, password).await;
        self.settle(result, None).await?;
        self.clear_error().await;
        if let Err(e) = self.refresh_all().await {
            warn!("refresh after login failed: {e}");
        }
        Ok(())
    }

    pub async fn register(&self, user: &NewUser) -> ConsoleResult<()> {
        let result = self.session.register(user).await;
        self.settle(result, None).await?;
        self.clear_error().await;
        Ok(())
    }

    /// Signs out and empties every list.
    pub async fn logout(&self) -> ConsoleResult<()> {
        let mut state = self.state.write().await;
        self.fence_all();
        self.session.logout().await?;
        *state = ViewState::default();
        Ok(())
    }

    pub async fn refresh_records(&self) -> ConsoleResult<()> {
        let session = self.session.current().await;
        let ticket = self.record_gate.issue();
        let result = self.records.list(&session).await;
        let records = self.settle(result, Some(&session)).await?;

        let mut state = self.state.write().await;
        if self.record_gate.try_apply(ticket) {
            state.records = records;
        } else {
            debug!(ticket, "discarding stale record list");
        }
        Ok(())
    }

    pub async fn refresh_files(&self, target: StorageTarget) -> ConsoleResult<()> {
        let session = self.session.current().await;
        let gate = self.file_gate(target);
        let ticket = gate.issue();
        let result = self.files.list(&session, target).await;
        let files = self.settle(result, Some(&session)).await?;

        let mut state = self.state.write().await;
        if gate.try_apply(ticket) {
            *state.files_mut(target) = files;
        } else {
            debug!(%target, ticket, "discarding stale file list");
        }
        Ok(())
    }

    /// Re-lists records and both storage targets. All three run even if
    /// one fails; the first error is returned.
    pub async fn refresh_all(&self) -> ConsoleResult<()> {
        let (records, local, remote) = tokio::join!(
            self.refresh_records(),
            self.refresh_files(StorageTarget::Local),
            self.refresh_files(StorageTarget::RemoteObject),
        );
        records.and(local).and(remote)
    }

    /// Creates or replaces a record depending on the draft's mode. On
    /// success the draft is reset to an empty create form.
    pub async fn submit(&self, draft: &mut FormDraft) -> ConsoleResult<DummyRecord> {
        let payload = draft.fields.to_payload();
        let payload = self.settle(payload, None).await?;
        let session = self.session.current().await;

        let result = match draft.mode {
            EditMode::Creating => self.records.create(&session, &payload).await,
            EditMode::Editing(id) => self.records.update(&session, id, &payload).await,
        };
        let saved = self.settle(result, Some(&session)).await?;
        draft.reset();

        {
            let mut state = self.state.write().await;
            state.last_saved = Some(saved.clone());
            state.last_error = None;
        }
        self.refresh_after_write(self.refresh_records(), "submit").await;
        Ok(saved)
    }

    pub async fn patch_record(&self, id: RecordId, patch: &RecordPatch) -> ConsoleResult<DummyRecord> {
        let session = self.session.current().await;
        let result = self.records.patch(&session, id, patch).await;
        let saved = self.settle(result, Some(&session)).await?;
        {
            let mut state = self.state.write().await;
            state.last_saved = Some(saved.clone());
            state.last_error = None;
        }
        self.refresh_after_write(self.refresh_records(), "patch").await;
        Ok(saved)
    }

    pub async fn delete_record(&self, id: RecordId) -> ConsoleResult<()> {
        let session = self.session.current().await;
        let result = self.records.delete(&session, id).await;
        self.settle(result, Some(&session)).await?;
        self.clear_error().await;
        self.refresh_after_write(self.refresh_records(), "delete").await;
        Ok(())
    }

    pub async fn upload(&self, target: StorageTarget, file: &FileUpload) -> ConsoleResult<()> {
        let session = self.session.current().await;
        let result = self.files.upload(&session, target, file).await;
        self.settle(result, Some(&session)).await?;
        self.clear_error().await;
        self.refresh_after_write(self.refresh_files(target), "upload").await;
        Ok(())
    }

    /// Fetches a file's bytes. Nothing is re-listed since nothing changed.
    pub async fn download(&self, target: StorageTarget, name: &str) -> ConsoleResult<Bytes> {
        let session = self.session.current().await;
        let result = self.files.download(&session, target, name).await;
        self.settle(result, Some(&session)).await
    }

    pub async fn delete_file(&self, target: StorageTarget, name: &str) -> ConsoleResult<()> {
        let session = self.session.current().await;
        let result = self.files.delete(&session, target, name).await;
        self.settle(result, Some(&session)).await?;
        self.clear_error().await;
        self.refresh_after_write(self.refresh_files(target), "delete file").await;
        Ok(())
    }

    fn file_gate(&self, target: StorageTarget) -> &GenerationGate {
        match target {
            StorageTarget::Local => &self.local_gate,
            StorageTarget::RemoteObject => &self.remote_gate,
        }
    }

    fn fence_all(&self) {
        self.record_gate.fence();
        self.local_gate.fence();
        self.remote_gate.fence();
    }

    async fn clear_error(&self) {
        self.state.write().await.last_error = None;
    }

    /// The write already succeeded; a failing re-list is only recorded.
    async fn refresh_after_write(
        &self,
        refresh: impl std::future::Future<Output = ConsoleResult<()>>,
        action: &str,
    ) {
        if let Err(e) = refresh.await {
            warn!("refresh after {action} failed: {e}");
        }
    }

    /// Records a failure for the view. A 401 means the server no longer
    /// accepts `used`, so if that is still the current session it is dropped
    /// along with every list. A 401 for a token already replaced changes
    /// nothing but the error message.
    async fn settle<T>(
        &self,
        result: ConsoleResult<T>,
        used: Option<&Session>,
    ) -> ConsoleResult<T> {
        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let mut state = self.state.write().await;
        if let Some(used) = used.filter(|_| err.is_unauthorized()) {
            match self.session.invalidate_if_current(used).await {
                Ok(true) => {
                    self.fence_all();
                    *state = ViewState::default();
                }
                Ok(false) => debug!("ignoring 401 for a session that is no longer current"),
                Err(e) => warn!("failed to clear rejected token: {e}"),
            }
        }
        state.last_error = Some(err.to_string());
        Err(err)
    }
}
