use async_trait::async_trait;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    policy::{self, Failure, RetryDecision, RetryOutcome},
    BackoffConfig, HttpRequest, HttpResponse, RequestExecutor, Result, TransportError,
};

/// Wraps an executor with bounded retries and exponential backoff.
///
/// Configuration is fixed at construction and all per-call state lives on the
/// stack of [`RetryableTransport::execute_outcome`], so one instance can
/// serve concurrent calls without locking.
///
/// The request is re-sent unchanged on every attempt; its body is a
/// [`bytes::Bytes`] and therefore always replayable.
#[derive(Clone, Debug)]
pub struct RetryableTransport<E> {
    inner: E,
    max_retries: usize,
    backoff: BackoffConfig,
}

impl<E: RequestExecutor> RetryableTransport<E> {
    /// Allows up to `max_retries` attempts after the first one.
    pub fn new(inner: E, max_retries: usize, backoff: BackoffConfig) -> Self {
        Self {
            inner,
            max_retries,
            backoff,
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn backoff(&self) -> &BackoffConfig {
        &self.backoff
    }

    /// Runs the retry loop and reports how it ended.
    ///
    /// Attempts are strictly sequential. Between attempts the transport
    /// sleeps for [`BackoffConfig::delay`]; if `cancel` fires during the
    /// sleep or during an attempt, the loop stops with
    /// [`TransportError::Cancelled`] and no further attempt is issued.
    pub async fn execute_outcome(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> RetryOutcome {
        let mut attempt = 0usize;
        loop {
            let outcome = self.inner.execute_cancellable(request, cancel).await;
            let attempts = attempt + 1;

            match policy::classify(&outcome) {
                RetryDecision::Retry => {}
                decision => {
                    return match (decision, outcome) {
                        (RetryDecision::Success, Ok(response)) => RetryOutcome::Success {
                            response,
                            attempts,
                        },
                        (_, Ok(response)) => RetryOutcome::FatalFailure {
                            failure: Failure::Response(response),
                            attempts,
                        },
                        (_, Err(err)) => {
                            #[cfg(feature = "tracing")]
                            tracing::debug!(attempts, error = %err, "request stopped without retry");
                            RetryOutcome::FatalFailure {
                                failure: Failure::Error(err),
                                attempts,
                            }
                        }
                    };
                }
            }

            if attempt >= self.max_retries {
                #[cfg(feature = "tracing")]
                tracing::debug!(attempts, url = %request.url, "retry budget exhausted");
                return RetryOutcome::Exhausted {
                    last: policy::into_last_failure(outcome),
                    attempts,
                };
            }

            let delay = self.backoff.delay(attempt);
            #[cfg(feature = "tracing")]
            log_retry(request, attempts, delay, &outcome);
            drop(outcome);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        attempts,
                        url = %request.url,
                        "request cancelled during backoff"
                    );
                    return RetryOutcome::FatalFailure {
                        failure: Failure::Error(TransportError::Cancelled),
                        attempts,
                    };
                }
                _ = sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}

#[async_trait]
impl<E: RequestExecutor> RequestExecutor for RetryableTransport<E> {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.execute_outcome(request, &CancellationToken::new())
            .await
            .into_result()
    }

    async fn execute_cancellable(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        self.execute_outcome(request, cancel).await.into_result()
    }
}

#[cfg(feature = "tracing")]
fn log_retry(
    request: &HttpRequest,
    attempts: usize,
    delay: std::time::Duration,
    outcome: &Result<HttpResponse>,
) {
    let delay_ms = delay.as_millis() as u64;
    match outcome {
        Ok(response) => tracing::debug!(
            attempts,
            delay_ms,
            status = response.status.as_u16(),
            url = %request.url,
            "retrying request after server error"
        ),
        Err(err) => tracing::debug!(
            attempts,
            delay_ms,
            error = %err,
            url = %request.url,
            "retrying request after transport failure"
        ),
    }
}
