/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Connection-level failure reported by a custom executor.
    #[error("connection error: {0}")]
    Connection(String),
    /// The request could not be built; nothing was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Server error status kept as the last failure of an exhausted call.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Every attempt failed transiently.
    #[error("request failed after {attempts} attempts: {last}")]
    Exhausted {
        /// Total number of attempts made, including the first one.
        attempts: usize,
        /// The failure observed on the final attempt.
        last: Box<TransportError>,
    },
    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
    /// Invalid transport or backoff configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Response body decoding error.
    #[error("decode error: {0}")]
    Decode(String),
}

impl TransportError {
    /// Number of attempts made when the retry budget was exhausted.
    pub fn attempts(&self) -> Option<usize> {
        match self {
            Self::Exhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
