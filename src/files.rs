// File transfer against the two storage targets.
//
// Both targets expose the same four operations; only the endpoint paths
// differ, so one client serves both.

use crate::api::ApiClient;
use crate::error::{ConsoleError, ConsoleResult};
use crate::session::Session;
use crate::types::FileListing;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Extensions the backend accepts for upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "csv", "jpg", "png", "pdf"];
/// Largest upload the backend accepts.
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageTarget {
    Local,
    RemoteObject,
}

impl StorageTarget {
    pub const ALL: [StorageTarget; 2] = [StorageTarget::Local, StorageTarget::RemoteObject];

    fn list_path(self) -> &'static str {
        match self {
            StorageTarget::Local => "list_local_files",
            StorageTarget::RemoteObject => "list_s3_files",
        }
    }

    fn upload_path(self) -> &'static str {
        match self {
            StorageTarget::Local => "upload",
            StorageTarget::RemoteObject => "uploads3",
        }
    }

    fn download_path(self) -> &'static str {
        match self {
            StorageTarget::Local => "download",
            StorageTarget::RemoteObject => "download_s3",
        }
    }

    fn delete_path(self) -> &'static str {
        match self {
            StorageTarget::Local => "delete_local_file",
            StorageTarget::RemoteObject => "delete_from_s3",
        }
    }
}

impl fmt::Display for StorageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageTarget::Local => write!(f, "local"),
            StorageTarget::RemoteObject => write!(f, "remote object"),
        }
    }
}

/// One file picked for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileUpload {
    pub name: String,
    pub content: Vec<u8>,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Reads a file from disk, named after its last path component.
    pub fn from_path(path: &Path) -> ConsoleResult<Self> {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                ConsoleError::Validation(format!("{} has no usable file name", path.display()))
            })?
            .to_string();
        let content = std::fs::read(path).map_err(|e| {
            ConsoleError::Validation(format!("failed to read {}: {e}", path.display()))
        })?;
        Ok(Self { name, content })
    }

    /// Applies the backend's extension and size limits before upload.
    pub fn check(&self) -> ConsoleResult<()> {
        if self.name.is_empty() {
            return Err(ConsoleError::Validation("no file selected".into()));
        }
        let extension = self
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension) {
            return Err(ConsoleError::Validation(format!(
                "unsupported file extension for {:?}, allowed: {}",
                self.name,
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }
        if self.content.len() > MAX_UPLOAD_BYTES {
            return Err(ConsoleError::Validation(format!(
                "{} is {} bytes, the limit is {MAX_UPLOAD_BYTES}",
                self.name,
                self.content.len()
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct FileClient {
    api: ApiClient,
}

impl FileClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, session: &Session, target: StorageTarget) -> ConsoleResult<Vec<String>> {
        let resp = self
            .api
            .authorized(Method::GET, session, &[target.list_path()])?
            .send()
            .await?;
        let listing: FileListing = ApiClient::json(ApiClient::check(resp).await?).await?;
        Ok(listing.files)
    }

    /// Sends exactly one file as the multipart field `file`.
    pub async fn upload(
        &self,
        session: &Session,
        target: StorageTarget,
        file: &FileUpload,
    ) -> ConsoleResult<()> {
        file.check()?;
        let request = self
            .api
            .authorized(Method::POST, session, &[target.upload_path()])?;
        let part = Part::bytes(file.content.clone())
            .file_name(file.name.clone())
            .mime_str("application/octet-stream")?;
        let form = Form::new().part("file", part);

        debug!(%target, name = %file.name, size = file.content.len(), "uploading");
        let resp = request.multipart(form).send().await?;
        ApiClient::check(resp).await?;
        Ok(())
    }

    /// Fetches the stored bytes. Saving them is up to the caller.
    pub async fn download(
        &self,
        session: &Session,
        target: StorageTarget,
        name: &str,
    ) -> ConsoleResult<Bytes> {
        let resp = self
            .api
            .authorized(Method::GET, session, &[target.download_path(), name])?
            .send()
            .await?;
        Ok(ApiClient::check(resp).await?.bytes().await?)
    }

    pub async fn delete(
        &self,
        session: &Session,
        target: StorageTarget,
        name: &str,
    ) -> ConsoleResult<()> {
        let resp = self
            .api
            .authorized(Method::DELETE, session, &[target.delete_path(), name])?
            .send()
            .await?;
        ApiClient::check(resp).await?;
        Ok(())
    }
}
