use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{BackoffConfig, HttpRequest, HttpResponse, RequestExecutor, Result, RetryableTransport};

/// Transport chosen once at construction time.
#[derive(Clone, Debug)]
pub enum Transport<E> {
    /// The wrapped executor, used as-is.
    Plain(E),
    /// The wrapped executor behind the retry loop.
    Retrying(RetryableTransport<E>),
}

/// Picks a transport for the configured retry count.
///
/// With `max_retries == 0` the executor is returned unwrapped and `backoff`
/// is dropped unused; otherwise it is wrapped in a [`RetryableTransport`].
pub fn select_transport<E: RequestExecutor>(
    executor: E,
    max_retries: usize,
    backoff: BackoffConfig,
) -> Transport<E> {
    if max_retries == 0 {
        Transport::Plain(executor)
    } else {
        Transport::Retrying(RetryableTransport::new(executor, max_retries, backoff))
    }
}

impl<E> Transport<E> {
    pub fn is_retrying(&self) -> bool {
        matches!(self, Self::Retrying(_))
    }
}

#[async_trait]
impl<E: RequestExecutor> RequestExecutor for Transport<E> {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        match self {
            Self::Plain(executor) => executor.execute(request).await,
            Self::Retrying(transport) => transport.execute(request).await,
        }
    }

    async fn execute_cancellable(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        match self {
            Self::Plain(executor) => executor.execute_cancellable(request, cancel).await,
            Self::Retrying(transport) => transport.execute_cancellable(request, cancel).await,
        }
    }
}
