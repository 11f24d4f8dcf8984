// Authenticated CRUD against the `/dummy` collection.

use crate::api::ApiClient;
use crate::error::{ConsoleError, ConsoleResult};
use crate::session::Session;
use crate::types::{DummyRecord, RecordId, RecordPatch, RecordPayload};
use reqwest::{Method, StatusCode};
use tracing::debug;

const COLLECTION: &str = "dummy";

#[derive(Clone, Debug)]
pub struct RecordClient {
    api: ApiClient,
}

impl RecordClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetches the whole collection. The backend answers 404 when the
    /// collection is empty; that is zero records, not an error.
    pub async fn list(&self, session: &Session) -> ConsoleResult<Vec<DummyRecord>> {
        let resp = self
            .api
            .authorized(Method::GET, session, &[COLLECTION])?
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            debug!("record list not found, treating as empty");
            return Ok(Vec::new());
        }
        let resp = ApiClient::check(resp).await?;
        ApiClient::json(resp).await
    }

    pub async fn get(&self, session: &Session, id: RecordId) -> ConsoleResult<DummyRecord> {
        let id = id.to_string();
        let resp = self
            .api
            .authorized(Method::GET, session, &[COLLECTION, &id])?
            .send()
            .await?;
        ApiClient::json(ApiClient::check(resp).await?).await
    }

    pub async fn create(
        &self,
        session: &Session,
        payload: &RecordPayload,
    ) -> ConsoleResult<DummyRecord> {
        let payload = normalized(payload);
        let resp = self
            .api
            .authorized(Method::POST, session, &[COLLECTION])?
            .json(&payload)
            .send()
            .await?;
        ApiClient::json(ApiClient::check(resp).await?).await
    }

    /// Full replace of the record at `id`.
    pub async fn update(
        &self,
        session: &Session,
        id: RecordId,
        payload: &RecordPayload,
    ) -> ConsoleResult<DummyRecord> {
        let payload = normalized(payload);
        let id = id.to_string();
        let resp = self
            .api
            .authorized(Method::PUT, session, &[COLLECTION, &id])?
            .json(&payload)
            .send()
            .await?;
        ApiClient::json(ApiClient::check(resp).await?).await
    }

    /// Changes only the fields set in `patch`.
    pub async fn patch(
        &self,
        session: &Session,
        id: RecordId,
        patch: &RecordPatch,
    ) -> ConsoleResult<DummyRecord> {
        if patch.is_empty() {
            return Err(ConsoleError::Validation("patch sets no fields".into()));
        }
        let id = id.to_string();
        let resp = self
            .api
            .authorized(Method::PATCH, session, &[COLLECTION, &id])?
            .json(patch)
            .send()
            .await?;
        ApiClient::json(ApiClient::check(resp).await?).await
    }

    pub async fn delete(&self, session: &Session, id: RecordId) -> ConsoleResult<()> {
        let id = id.to_string();
        let resp = self
            .api
            .authorized(Method::DELETE, session, &[COLLECTION, &id])?
            .send()
            .await?;
        ApiClient::check(resp).await?;
        Ok(())
    }
}

// Payloads built by hand may still carry `Some("")`.
fn normalized(payload: &RecordPayload) -> RecordPayload {
    RecordPayload::new(
        payload.name.clone(),
        payload.description.clone(),
        payload.optional_field.clone(),
    )
}
