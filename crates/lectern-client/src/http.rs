//! Authenticated JSON transport.
//!
//! Every request carries the stored bearer token. A 401 on an authenticated
//! request triggers one token refresh and one retry; if either fails the
//! session is cleared and `LecternError::SessionExpired` is returned.

use std::time::Duration;

use lectern_core::events::{EventHub, LearnerEvent, SessionEndReason};
use lectern_core::model::{Ack, RefreshResponse};
use lectern_core::{Config, LecternError, Result};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::session::SessionStore;

/// Path of the token refresh endpoint.
pub const REFRESH_PATH: &str = "/token/refresh/";

/// Whether a request carries (and may refresh) the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Attach the token; recover from a 401 by refreshing once.
    Bearer,
    /// Send without a token; a 401 is a plain error.
    Anonymous,
}

/// JSON client bound to one API base URL and one session.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    session: SessionStore,
    events: Option<EventHub>,
    refresh_lock: Mutex<()>,
}

impl HttpClient {
    /// Builds a client from the configuration.
    pub fn new(config: &Config, session: SessionStore) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LecternError::network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            session,
            events: None,
            refresh_lock: Mutex::new(()),
        })
    }

    /// Publishes `SessionEnded` on the given hub when a session is force-cleared.
    #[must_use]
    pub fn with_events(mut self, events: EventHub) -> Self {
        self.events = Some(events);
        self
    }

    /// The session store used for every request.
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    /// The event hub, if one is attached.
    #[must_use]
    pub const fn events(&self) -> Option<&EventHub> {
        self.events.as_ref()
    }

    /// Full URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ------------------------------------------------------------------------
    // Typed helpers
    // ------------------------------------------------------------------------

    /// `GET` and decode.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let text = self.execute(Method::GET, path, None, Auth::Bearer).await?;
        decode(path, &text)
    }

    /// `GET` without a token and decode.
    pub async fn get_anonymous<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let text = self.execute(Method::GET, path, None, Auth::Anonymous).await?;
        decode(path, &text)
    }

    /// `POST` a JSON body and decode.
    pub async fn post<B, T>(&self, path: &str, body: &B, auth: Auth) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let text = self.execute(Method::POST, path, Some(body), auth).await?;
        decode(path, &text)
    }

    /// `POST` with an optional body to an action endpoint; an empty reply is fine.
    pub async fn post_action(&self, path: &str, body: Option<Value>) -> Result<Ack> {
        let text = self.execute(Method::POST, path, body, Auth::Bearer).await?;
        if text.trim().is_empty() {
            return Ok(Ack::default());
        }
        decode(path, &text)
    }

    /// `PUT` a JSON body and decode.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let text = self.execute(Method::PUT, path, Some(body), Auth::Bearer).await?;
        decode(path, &text)
    }

    /// `PATCH` a JSON body and decode.
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let text = self.execute(Method::PATCH, path, Some(body), Auth::Bearer).await?;
        decode(path, &text)
    }

    /// `DELETE`; the reply body is ignored.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(Method::DELETE, path, None, Auth::Bearer).await?;
        Ok(())
    }

    /// Downloads a file the backend links to, such as a rendered PDF.
    ///
    /// `location` may be absolute or a server-relative path like
    /// `/media/certificates/x.pdf`; the latter resolves against the API host.
    #[instrument(skip(self))]
    pub async fn fetch_bytes(&self, location: &str) -> Result<Vec<u8>> {
        let url = self.resolve(location)?;
        let mut request = self.client.get(url);
        if let Some(token) = self.session.access_token().await {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(error_from_response(location, response).await);
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| LecternError::network(e.to_string()))?;
        debug!(location, size = bytes.len(), "Downloaded file");
        Ok(bytes.to_vec())
    }

    fn resolve(&self, location: &str) -> Result<Url> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| {
                LecternError::config_validation(
                    format!("invalid API base URL: {e}"),
                    "Set api_base_url to an absolute http(s) URL",
                )
            })?;
        base.join(location)
            .map_err(|e| LecternError::decode(format!("invalid download URL '{location}': {e}")))
    }

    // ------------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------------

    /// Sends a request and returns the body of a successful response.
    #[instrument(skip(self, method, body), fields(method = %method))]
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        auth: Auth,
    ) -> Result<String> {
        let token = match auth {
            Auth::Bearer => self.session.access_token().await,
            Auth::Anonymous => None,
        };

        let mut response = self
            .send_once(method.clone(), path, body.as_ref(), token.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED && auth == Auth::Bearer {
            let Some(sent_token) = token else {
                return Err(LecternError::NotAuthenticated);
            };
            let fresh = self.refresh_after_401(&sent_token).await?;
            debug!(path, "Retrying request with refreshed token");
            response = self
                .send_once(method, path, body.as_ref(), Some(&fresh))
                .await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(self.expire("retry still unauthorized").await);
            }
        }

        let status = response.status();
        if status.is_success() {
            return response
                .text()
                .await
                .map_err(|e| LecternError::network(e.to_string()));
        }
        Err(error_from_response(path, response).await)
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Response> {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(transport_error)
    }

    /// Obtains a fresh access token after `rejected` earned a 401.
    ///
    /// Concurrent 401s share one refresh: whoever gets the lock second sees
    /// that the stored token already changed and reuses it.
    async fn refresh_after_401(&self, rejected: &str) -> Result<String> {
        let _lock = self.refresh_lock.lock().await;

        match self.session.access_token().await {
            Some(current) if current != rejected => return Ok(current),
            Some(_) => {}
            None => return Err(LecternError::SessionExpired),
        }

        let Some(refresh) = self.session.refresh_token().await else {
            return Err(self.expire("no refresh token").await);
        };

        let body = serde_json::json!({ "refresh": refresh });
        let response = self
            .send_once(Method::POST, REFRESH_PATH, Some(&body), None)
            .await?;
        if !response.status().is_success() {
            return Err(self.expire("refresh rejected").await);
        }
        let text = response
            .text()
            .await
            .map_err(|e| LecternError::network(e.to_string()))?;
        let refreshed: RefreshResponse = match decode(REFRESH_PATH, &text) {
            Ok(r) => r,
            Err(_) => return Err(self.expire("malformed refresh response").await),
        };

        self.session.update_access(refreshed.access.clone()).await;
        info!("Access token refreshed");
        Ok(refreshed.access)
    }

    /// Clears the session after an unrecoverable 401.
    async fn expire(&self, reason: &str) -> LecternError {
        warn!(reason, "Session expired, logging out");
        if let Err(e) = self.session.clear().await {
            warn!(error = %e, "Failed to remove session file");
        }
        if let Some(events) = &self.events {
            events.send(LearnerEvent::session_ended(SessionEndReason::Expired));
        }
        LecternError::SessionExpired
    }
}

fn decode<T: DeserializeOwned>(path: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| LecternError::decode(format!("{path}: {e}")))
}

fn transport_error(e: reqwest::Error) -> LecternError {
    if e.is_timeout() {
        LecternError::network(format!("request timed out: {e}"))
    } else {
        LecternError::network(e.to_string())
    }
}

async fn error_from_response(path: &str, response: Response) -> LecternError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = extract_message(&text).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    debug!(path, status = status.as_u16(), %message, "Request failed");

    match status {
        StatusCode::UNAUTHORIZED => LecternError::NotAuthenticated,
        StatusCode::FORBIDDEN => LecternError::Forbidden { message },
        StatusCode::NOT_FOUND => LecternError::not_found(path),
        s if s.is_client_error() => LecternError::api(s.as_u16(), message),
        s => LecternError::server(s.as_u16(), message),
    }
}

/// Pulls a human-readable message out of an error body.
///
/// Looks at `message`, `error` and `detail`, then `non_field_errors`, then
/// the first field error (`field: message`). Non-JSON bodies are used as-is
/// when short and not HTML.
#[must_use]
pub fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        let is_html = trimmed.starts_with('<');
        return (!is_html && trimmed.len() <= 200).then(|| trimmed.to_string());
    };
    let obj = value.as_object()?;

    for key in ["message", "error", "detail"] {
        if let Some(s) = obj.get(key).and_then(Value::as_str) {
            return Some(s.to_string());
        }
    }
    if let Some(s) = obj.get("non_field_errors").and_then(first_string) {
        return Some(s);
    }
    obj.iter()
        .find_map(|(field, v)| first_string(v).map(|msg| format!("{field}: {msg}")))
}

fn first_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_string),
        _ => None,
    }
}
