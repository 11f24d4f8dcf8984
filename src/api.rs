// HTTP plumbing shared by every client: builds endpoint URLs under the API
// root, attaches the bearer token, and turns non-2xx responses into
// `ConsoleError::Request`. The auth endpoints live here too because they are
// the only calls made without a session.

use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, ConsoleResult};
use crate::session::Session;
use crate::types::{NewUser, TokenResponse};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Thin wrapper around a reqwest client and the API root URL.
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &ConsoleConfig) -> ConsoleResult<Self> {
        Self::from_url(&config.backend_url)
    }

    pub fn from_url(backend_url: &str) -> ConsoleResult<Self> {
        let mut base_url = Url::parse(backend_url)
            .map_err(|e| ConsoleError::Config(format!("invalid backend url {backend_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ConsoleError::Config(format!(
                "backend url {backend_url:?} cannot carry a path"
            )));
        }
        // Drop a trailing slash so joined paths never contain "//".
        if let Ok(mut segments) = base_url.path_segments_mut() {
            segments.pop_if_empty();
        }
        let client = Client::builder().build()?;
        Ok(Self { client, base_url })
    }

    /// Appends percent-encoded path segments to the API root. An empty
    /// final segment yields a trailing slash.
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    /// A request that carries no credential.
    pub fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.url(segments);
        debug!(%method, path = url.path(), "request");
        self.client.request(method, url)
    }

    /// A bearer-gated request. Fails with `AuthRequired` before anything is
    /// sent when the session holds no token.
    pub fn authorized(
        &self,
        method: Method,
        session: &Session,
        segments: &[&str],
    ) -> ConsoleResult<RequestBuilder> {
        let token = session.token().ok_or(ConsoleError::AuthRequired)?;
        Ok(self.request(method, segments).bearer_auth(token))
    }

    /// Passes 2xx responses through and converts everything else into a
    /// `Request` error carrying the status and server message.
    pub async fn check(resp: Response) -> ConsoleResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        debug!(status = status.as_u16(), %message, "request rejected");
        Err(ConsoleError::Request {
            status: status.as_u16(),
            message,
        })
    }

    /// Decodes a JSON body. A body that arrives but does not decode is a
    /// `Serialization` error, not a transport failure.
    pub async fn json<T: DeserializeOwned>(resp: Response) -> ConsoleResult<T> {
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// POST form-encoded credentials to the token endpoint.
    pub async fn login(&self, username: &str, password: &str) -> ConsoleResult<TokenResponse> {
        let resp = self
            .request(Method::POST, &["auth", "token"])
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        let resp = Self::check(resp).await.map_err(into_auth_error)?;
        Self::json(resp).await
    }

    /// POST a new user. The created user is not returned; registration
    /// never logs in.
    pub async fn register(&self, user: &NewUser) -> ConsoleResult<()> {
        let resp = self
            .request(Method::POST, &["auth", "users", ""])
            .json(user)
            .send()
            .await?;
        Self::check(resp).await.map_err(into_auth_error)?;
        Ok(())
    }
}

fn into_auth_error(err: ConsoleError) -> ConsoleError {
    match err {
        ConsoleError::Request { message, .. } => ConsoleError::Auth(message),
        other => other,
    }
}

/// Pulls a readable message out of an error body. FastAPI answers with
/// `{"detail": "..."}`, or a list of `{"msg": ...}` objects for validation
/// failures.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("detail") {
            Some(serde_json::Value::String(detail)) => return detail.clone(),
            Some(serde_json::Value::Array(items)) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if !msgs.is_empty() {
                    return msgs.join("; ");
                }
            }
            _ => {}
        }
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_under_api_root() {
        let api = ApiClient::from_url("https://example.com/api/").unwrap();
        assert_eq!(api.url(&["dummy"]).as_str(), "https://example.com/api/dummy");
        assert_eq!(
            api.url(&["dummy", "7"]).as_str(),
            "https://example.com/api/dummy/7"
        );
    }

    #[test]
    fn url_keeps_trailing_slash_when_asked() {
        let api = ApiClient::from_url("http://localhost:8000").unwrap();
        assert_eq!(
            api.url(&["auth", "users", ""]).as_str(),
            "http://localhost:8000/auth/users/"
        );
    }

    #[test]
    fn url_encodes_file_names() {
        let api = ApiClient::from_url("http://localhost/api").unwrap();
        assert_eq!(
            api.url(&["download", "my report.pdf"]).path(),
            "/api/download/my%20report.pdf"
        );
        assert_eq!(
            api.url(&["download", "../etc"]).path(),
            "/api/download/..%2Fetc"
        );
    }

    #[test]
    fn rejects_unusable_urls() {
        assert!(matches!(
            ApiClient::from_url("not a url"),
            Err(ConsoleError::Config(_))
        ));
        assert!(matches!(
            ApiClient::from_url("mailto:someone@example.com"),
            Err(ConsoleError::Config(_))
        ));
    }

    #[test]
    fn authorized_without_token_fails_closed() {
        let api = ApiClient::from_url("http://localhost/api").unwrap();
        let result = api.authorized(Method::GET, &Session::anonymous(), &["dummy"]);
        assert!(matches!(result, Err(ConsoleError::AuthRequired)));
    }

    #[test]
    fn error_message_prefers_detail() {
        let msg = error_message(StatusCode::NOT_FOUND, r#"{"detail":"Object not found"}"#);
        assert_eq!(msg, "Object not found");
    }

    #[test]
    fn error_message_joins_validation_errors() {
        let body = r#"{"detail":[{"loc":["body","name"],"msg":"field required"},{"msg":"too long"}]}"#;
        assert_eq!(
            error_message(StatusCode::UNPROCESSABLE_ENTITY, body),
            "field required; too long"
        );
    }

    #[test]
    fn error_message_falls_back_to_body_then_reason() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down"
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "Internal Server Error"
        );
    }
}
