use std::fmt;

use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Method,
};
use tokio_util::sync::CancellationToken;

use crate::{
    select_transport, HttpRequest, HttpResponse, RequestExecutor, ReqwestExecutor, Result,
    Transport, TransportError, TransportOptions,
};

pub const ENV_TOKEN: &str = "RESILIENT_HTTP_TOKEN";

/// HTTP client that sends every request through the configured transport.
///
/// Requests go straight to [`ReqwestExecutor`] when retries are disabled,
/// or through the retry loop otherwise.
#[derive(Clone)]
pub struct ResilientClient {
    transport: Transport<ReqwestExecutor>,
    default_headers: HeaderMap,
    options: TransportOptions,
}

impl fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .default_headers
            .iter()
            .map(|(name, value)| {
                if *name == header::AUTHORIZATION || value.is_sensitive() {
                    (name.as_str(), "<redacted>")
                } else {
                    (name.as_str(), value.to_str().unwrap_or("<binary>"))
                }
            })
            .collect();
        f.debug_struct("ResilientClient")
            .field("default_headers", &headers)
            .field("options", &self.options)
            .finish()
    }
}

impl Default for ResilientClient {
    fn default() -> Self {
        Self::new(TransportOptions::default())
    }
}

impl ResilientClient {
    /// Creates a client with its own connection pool.
    pub fn new(options: TransportOptions) -> Self {
        Self::with_http_client(reqwest::Client::new(), options)
    }

    /// Creates a client on top of an existing `reqwest` client.
    pub fn with_http_client(http: reqwest::Client, options: TransportOptions) -> Self {
        let executor = ReqwestExecutor::with_client(http).with_timeout(options.timeout());
        Self {
            transport: select_transport(executor, options.retry_count, options.backoff),
            default_headers: HeaderMap::new(),
            options,
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads the options described on [`TransportOptions::from_env`], plus an
    /// optional `RESILIENT_HTTP_TOKEN` sent as a bearer token (the `Bearer `
    /// prefix is optional).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use resilient_http::ResilientClient;
    ///
    /// let client = ResilientClient::from_env().expect("invalid RESILIENT_HTTP_* env vars");
    /// ```
    pub fn from_env() -> Result<Self> {
        Self::new(TransportOptions::from_env()?).with_env_token(std::env::var(ENV_TOKEN).ok())
    }

    fn with_env_token(self, token: Option<String>) -> Result<Self> {
        match token {
            Some(token) if !token.trim().is_empty() => self
                .with_bearer_auth(token)
                .map_err(|err| TransportError::Config(format!("{ENV_TOKEN} is invalid: {err}"))),
            _ => Ok(self),
        }
    }

    /// Adds a header sent with every request unless the request sets it.
    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    ///
    /// If the token is missing the `Bearer ` prefix, it is added automatically.
    pub fn with_bearer_auth(self, token: impl AsRef<str>) -> Result<Self> {
        let authorization = normalize_bearer_authorization(token.as_ref());
        let mut value = HeaderValue::from_str(&authorization).map_err(|err| {
            TransportError::InvalidRequest(format!("invalid authorization header: {err}"))
        })?;
        value.set_sensitive(true);
        Ok(self.with_default_header(header::AUTHORIZATION, value))
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    pub fn transport(&self) -> &Transport<ReqwestExecutor> {
        &self.transport
    }

    /// Sends a request and returns the final response.
    ///
    /// Client-error responses (`4xx`) are returned as `Ok` without retry.
    /// When retries are exhausted the error is
    /// [`TransportError::Exhausted`].
    pub async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        if self.default_headers.is_empty() {
            return self.transport.execute(request).await;
        }
        self.transport.execute(&self.prepare(request)).await
    }

    /// Sends a request that can be aborted through `cancel`, including while
    /// waiting between retries.
    pub async fn send_with_cancel(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        if self.default_headers.is_empty() {
            return self.transport.execute_cancellable(request, cancel).await;
        }
        self.transport
            .execute_cancellable(&self.prepare(request), cancel)
            .await
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.send(&HttpRequest::parse(Method::GET, url)?).await
    }

    // The caller's request is left untouched; defaults go on a copy.
    fn prepare(&self, request: &HttpRequest) -> HttpRequest {
        let mut prepared = request.clone();
        for (name, value) in &self.default_headers {
            if !prepared.headers.contains_key(name) {
                prepared.headers.insert(name.clone(), value.clone());
            }
        }
        prepared
    }
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}
