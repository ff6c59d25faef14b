//! Classification of attempt outcomes into retry decisions.
//!
//! Server errors and network failures are presumed transient; client errors
//! mean the request itself is wrong and are never retried.

use reqwest::StatusCode;

use crate::{HttpResponse, Result, TransportError};

/// What the retry loop should do with one attempt's outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Return the response to the caller.
    Success,
    /// Return the outcome to the caller without further attempts.
    Fatal,
    /// Try again if the retry budget allows it.
    Retry,
}

/// Classifies the outcome of a single attempt.
pub fn classify(outcome: &Result<HttpResponse>) -> RetryDecision {
    match outcome {
        Ok(response) => classify_status(response.status),
        Err(err) => classify_error(err),
    }
}

/// `>= 500` retries, `400..=499` is fatal, anything below 400 succeeds.
pub fn classify_status(status: StatusCode) -> RetryDecision {
    match status.as_u16() {
        500.. => RetryDecision::Retry,
        400..=499 => RetryDecision::Fatal,
        _ => RetryDecision::Success,
    }
}

pub fn classify_error(err: &TransportError) -> RetryDecision {
    match err {
        TransportError::Transport(err) if is_transient(err) => RetryDecision::Retry,
        TransportError::Connection(_) => RetryDecision::Retry,
        TransportError::Http { status, .. } => match StatusCode::from_u16(*status) {
            Ok(status) => match classify_status(status) {
                RetryDecision::Success => RetryDecision::Fatal,
                decision => decision,
            },
            Err(_) => RetryDecision::Fatal,
        },
        // Cancellation is the caller's decision; the rest cannot improve on retry.
        TransportError::Transport(_)
        | TransportError::Cancelled
        | TransportError::InvalidRequest(_)
        | TransportError::Exhausted { .. }
        | TransportError::Config(_)
        | TransportError::Decode(_) => RetryDecision::Fatal,
    }
}

/// Redirect loops, decode failures and the like repeat on every attempt.
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}

/// A terminal outcome that stopped the loop early.
#[derive(Debug)]
pub enum Failure {
    /// A client-error response, returned to the caller unchanged.
    Response(HttpResponse),
    /// A non-retryable error such as cancellation.
    Error(TransportError),
}

/// Result of a full retry loop for one call.
#[derive(Debug)]
pub enum RetryOutcome {
    Success {
        response: HttpResponse,
        attempts: usize,
    },
    FatalFailure {
        failure: Failure,
        attempts: usize,
    },
    Exhausted {
        last: TransportError,
        attempts: usize,
    },
}

impl RetryOutcome {
    /// Number of attempts issued to the wrapped executor.
    pub fn attempts(&self) -> usize {
        match self {
            Self::Success { attempts, .. }
            | Self::FatalFailure { attempts, .. }
            | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// Maps the outcome to what a caller of the transport observes.
    ///
    /// Fatal responses are returned as-is in `Ok`; exhaustion becomes
    /// [`TransportError::Exhausted`] carrying the attempt count.
    pub fn into_result(self) -> Result<HttpResponse> {
        match self {
            Self::Success { response, .. } => Ok(response),
            Self::FatalFailure {
                failure: Failure::Response(response),
                ..
            } => Ok(response),
            Self::FatalFailure {
                failure: Failure::Error(err),
                ..
            } => Err(err),
            Self::Exhausted { last, attempts } => Err(TransportError::Exhausted {
                attempts,
                last: Box::new(last),
            }),
        }
    }
}

/// Converts a retryable failure into the error kept as the cause of exhaustion.
pub(crate) fn into_last_failure(outcome: Result<HttpResponse>) -> TransportError {
    match outcome {
        Ok(response) => TransportError::Http {
            status: response.status.as_u16(),
            body: response.text(),
        },
        Err(err) => err,
    }
}
