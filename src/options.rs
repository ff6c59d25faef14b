use std::time::Duration;

use crate::{BackoffConfig, Result, TransportError};

pub const ENV_RETRY_COUNT: &str = "RESILIENT_HTTP_RETRY_COUNT";
pub const ENV_TIMEOUT_MS: &str = "RESILIENT_HTTP_TIMEOUT_MS";
pub const ENV_INITIAL_DELAY_MS: &str = "RESILIENT_HTTP_INITIAL_DELAY_MS";
pub const ENV_MAX_DELAY_MS: &str = "RESILIENT_HTTP_MAX_DELAY_MS";
pub const ENV_EXPONENT_FACTOR: &str = "RESILIENT_HTTP_EXPONENT_FACTOR";
pub const ENV_MAX_JITTER_MS: &str = "RESILIENT_HTTP_MAX_JITTER_MS";

/// Configures per-request timeout and retry behavior.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportOptions {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt. `0` disables
    /// retry wrapping entirely.
    pub retry_count: usize,
    /// Delay schedule between attempts.
    pub backoff: BackoffConfig,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            retry_count: 0,
            backoff: BackoffConfig::default(),
        }
    }
}

impl TransportOptions {
    /// Reads options from the environment, keeping defaults for unset
    /// variables.
    ///
    /// Recognized variables: `RESILIENT_HTTP_RETRY_COUNT`,
    /// `RESILIENT_HTTP_TIMEOUT_MS`, `RESILIENT_HTTP_INITIAL_DELAY_MS`,
    /// `RESILIENT_HTTP_MAX_DELAY_MS`, `RESILIENT_HTTP_EXPONENT_FACTOR` and
    /// `RESILIENT_HTTP_MAX_JITTER_MS`. A negative retry count disables
    /// retries.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let backoff = defaults.backoff;

        let retry_count = match parse_var::<i64, _>(&lookup, ENV_RETRY_COUNT)? {
            Some(count) => usize::try_from(count.max(0)).unwrap_or(usize::MAX),
            None => defaults.retry_count,
        };
        let timeout_ms = parse_var(&lookup, ENV_TIMEOUT_MS)?.unwrap_or(defaults.timeout_ms);
        let initial_delay = parse_var(&lookup, ENV_INITIAL_DELAY_MS)?
            .map(Duration::from_millis)
            .unwrap_or(backoff.initial_delay());
        let max_delay = parse_var(&lookup, ENV_MAX_DELAY_MS)?
            .map(Duration::from_millis)
            .unwrap_or(backoff.max_delay());
        let exponent_factor =
            parse_var(&lookup, ENV_EXPONENT_FACTOR)?.unwrap_or(backoff.exponent_factor());
        let max_jitter = parse_var(&lookup, ENV_MAX_JITTER_MS)?
            .map(Duration::from_millis)
            .unwrap_or(backoff.max_jitter());

        Ok(Self {
            timeout_ms,
            retry_count,
            backoff: BackoffConfig::new(initial_delay, max_delay, exponent_factor, max_jitter)?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|err| TransportError::Config(format!("{name}='{trimmed}' is invalid: {err}")))
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn unset_variables_keep_defaults() {
        let options = TransportOptions::from_lookup(lookup_from(&[])).expect("defaults are valid");
        assert_eq!(options, TransportOptions::default());
    }

    #[test]
    fn reads_all_recognized_variables() {
        let options = TransportOptions::from_lookup(lookup_from(&[
            (ENV_RETRY_COUNT, "3"),
            (ENV_TIMEOUT_MS, "2500"),
            (ENV_INITIAL_DELAY_MS, "20"),
            (ENV_MAX_DELAY_MS, "400"),
            (ENV_EXPONENT_FACTOR, "1.5"),
            (ENV_MAX_JITTER_MS, " 7 "),
        ]))
        .expect("options must parse");

        assert_eq!(options.retry_count, 3);
        assert_eq!(options.timeout(), Duration::from_millis(2500));
        assert_eq!(options.backoff.initial_delay(), Duration::from_millis(20));
        assert_eq!(options.backoff.max_delay(), Duration::from_millis(400));
        assert_eq!(options.backoff.exponent_factor(), 1.5);
        assert_eq!(options.backoff.max_jitter(), Duration::from_millis(7));
    }

    #[test]
    fn negative_retry_count_disables_retries() {
        let options = TransportOptions::from_lookup(lookup_from(&[(ENV_RETRY_COUNT, "-2")]))
            .expect("negative count is accepted");
        assert_eq!(options.retry_count, 0);
    }

    #[test]
    fn unparsable_value_is_config_error() {
        let err = TransportOptions::from_lookup(lookup_from(&[(ENV_TIMEOUT_MS, "soon")]))
            .expect_err("must fail");
        match err {
            TransportError::Config(message) => assert!(message.contains(ENV_TIMEOUT_MS)),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn inconsistent_backoff_is_rejected() {
        let err = TransportOptions::from_lookup(lookup_from(&[
            (ENV_INITIAL_DELAY_MS, "500"),
            (ENV_MAX_DELAY_MS, "100"),
        ]))
        .expect_err("must fail");
        assert!(matches!(err, TransportError::Config(_)));
    }
}
