// Admin API HTTP client
//
// Every backend call goes through `ApiClient::request`: URL construction
// under `/api/v1/`, bearer header from the `SessionStore`, JSON parsing,
// and normalisation of non-2xx responses into `Error::Request`. Endpoint
// methods live in per-resource modules (auth, nodes, pool_config, ...).

use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::{self, Error};
use crate::session::SessionStore;
use crate::transport::TransportConfig;

/// Path prefix of every admin endpoint.
pub const API_PREFIX: &str = "/api/v1";

/// Async client for the admin REST API.
///
/// Holds a shared handle to the [`SessionStore`] and reads the current
/// token on every call, so a login or logout elsewhere is picked up by
/// the very next request.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<SessionStore>,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a panel URL and transport config.
    ///
    /// `base_url` is the panel root (e.g. `https://panel.example:8000`);
    /// the `/api/v1/` prefix is appended unless already present.
    pub fn new(
        base_url: &str,
        session: Arc<SessionStore>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(base_url, http, session)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        base_url: &str,
        http: reqwest::Client,
        session: Arc<SessionStore>,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    /// Ensure the base URL ends with `/api/v1/` so relative joins work.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with(API_PREFIX) {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}{API_PREFIX}/"));
        }

        Ok(url)
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The normalised API base (always ends with `/api/v1/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The session store consulted on every request.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Join an endpoint path (e.g. `"nodes/"` or `"/nodes/"`) onto the base.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── Gateway ──────────────────────────────────────────────────────

    /// Issue a request and return the parsed JSON body.
    ///
    /// - Always sends `Content-Type: application/json`.
    /// - Adds `Authorization: Bearer <token>` only when a session exists;
    ///   otherwise the request goes out unauthenticated.
    /// - Non-2xx responses become [`Error::Request`] carrying the payload's
    ///   `detail`, or a generic message when the body is unusable.
    /// - A 401 clears the session and yields [`Error::SessionExpired`],
    ///   unless the session changed while the request was in flight: the
    ///   newer session is kept and the call yields [`Error::StaleSession`].
    /// - A 2xx response whose body is not JSON yields an empty object.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<Value, Error> {
        let generation = self.session.generation();
        let (status, raw) = self.send(method, path, body, extra_headers).await?;

        if status == StatusCode::UNAUTHORIZED {
            if self.session.generation() != generation {
                debug!("401 from {path} answers a previous session, ignoring");
                return Err(Error::StaleSession);
            }
            debug!("401 from {path}, clearing session");
            self.session.clear();
            return Err(Error::SessionExpired);
        }

        if !status.is_success() {
            return Err(error::request_error(status.as_u16(), &raw));
        }

        Ok(serde_json::from_str(&raw).unwrap_or_else(|_| {
            trace!("non-JSON success body from {path}, treating as empty object");
            Value::Object(serde_json::Map::new())
        }))
    }

    /// Send the request and hand back the raw status and body.
    ///
    /// Used directly only by flows that must interpret error bodies
    /// themselves (login).
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<(StatusCode, String), Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");

        let mut builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = self.session.current() {
            builder = builder.bearer_auth(token.expose_secret());
        }

        if let Some(headers) = extra_headers {
            builder = builder.headers(headers);
        }

        if let Some(body) = body {
            builder = builder.body(body.to_string());
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let raw = resp.text().await?;
        trace!(%status, bytes = raw.len(), "response received");
        Ok((status, raw))
    }

    // ── Typed helpers ────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let value = self.request(Method::GET, path, None, None).await?;
        decode(value)
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, Error> {
        let value = self.request(Method::POST, path, body, None).await?;
        decode(value)
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let value = self.request(Method::DELETE, path, None, None).await?;
        decode(value)
    }
}

/// Deserialize a gateway `Value` into a wire struct.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value::<T>(value.clone()).map_err(|e| {
        let body = value.to_string();
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

/// Serialize a request struct into the gateway's body type.
pub(crate) fn encode<T: serde::Serialize>(body: &T) -> Result<Value, Error> {
    serde_json::to_value(body).map_err(|e| Error::Deserialization {
        message: format!("failed to encode request body: {e}"),
        body: String::new(),
    })
}
