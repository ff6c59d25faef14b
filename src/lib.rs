//! `resilient-http` is a retrying HTTP transport.
//!
//! It wraps a single-request executor with bounded retries, exponential
//! backoff with jitter, and cancellation:
//! - [`RetryableTransport`] runs the retry loop over any [`RequestExecutor`]
//! - [`select_transport`] enables it only when retries are configured
//! - [`ResilientClient`] puts both in front of a pooled `reqwest` client
//!
//! Server errors (`5xx`) and network failures are retried; client errors
//! (`4xx`) are returned on the first occurrence.

mod backoff;
mod client;
mod error;
mod executor;
mod options;
pub mod policy;
mod retry;
mod select;
mod types;

pub use backoff::BackoffConfig;
pub use client::{ResilientClient, ENV_TOKEN};
pub use error::TransportError;
pub use executor::{ReqwestExecutor, RequestExecutor};
pub use options::{
    TransportOptions, ENV_EXPONENT_FACTOR, ENV_INITIAL_DELAY_MS, ENV_MAX_DELAY_MS,
    ENV_MAX_JITTER_MS, ENV_RETRY_COUNT, ENV_TIMEOUT_MS,
};
pub use policy::{RetryDecision, RetryOutcome};
pub use retry::RetryableTransport;
pub use select::{select_transport, Transport};
pub use types::{HttpRequest, HttpResponse};

pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, TransportError>;
