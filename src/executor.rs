use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{HttpRequest, HttpResponse, Result, TransportError};

/// Executes one request and returns its response.
///
/// Implementations are shared between concurrent calls and must be safe to
/// invoke from several tasks at once.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;

    /// Like [`RequestExecutor::execute`], but aborts with
    /// [`TransportError::Cancelled`] as soon as `cancel` fires.
    async fn execute_cancellable(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        let call = self.execute(request);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            result = call => result,
        }
    }
}

#[async_trait]
impl<E: RequestExecutor + ?Sized> RequestExecutor for Arc<E> {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request).await
    }

    async fn execute_cancellable(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        (**self).execute_cancellable(request, cancel).await
    }
}

#[async_trait]
impl<E: RequestExecutor + ?Sized> RequestExecutor for Box<E> {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request).await
    }

    async fn execute_cancellable(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        (**self).execute_cancellable(request, cancel).await
    }
}

/// Plain executor backed by a pooled [`reqwest::Client`].
///
/// Sends exactly one request per call and reads the whole body.
#[derive(Clone, Debug, Default)]
pub struct ReqwestExecutor {
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses an existing client and its connection pool.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self {
            http,
            timeout: None,
        }
    }

    /// Sets a timeout applied to each individual request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl RequestExecutor for ReqwestExecutor {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Transport(err)
    }
}
