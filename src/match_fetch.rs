use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use thiserror::Error;

use crate::store::RawMatch;

/// How a match load can go wrong, split the way the banner needs it:
/// "server unreachable" against "server returned an error".
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("unable to connect to the server: {0}")]
    Unreachable(String),
    #[error("server returned an error: http {0}")]
    Http(StatusCode),
    #[error("invalid data format received from server: {0}")]
    Format(String),
    #[error("load superseded by a newer request")]
    Superseded,
}

impl FetchError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, FetchError::Unreachable(_))
    }

    pub fn server_status(&self) -> &'static str {
        match self {
            FetchError::Unreachable(_) => "Unreachable",
            FetchError::Superseded => "Superseded",
            FetchError::Http(_) | FetchError::Format(_) => "Error",
        }
    }
}

/// Bounded exponential backoff around a single-attempt load. `max_retries`
/// counts the attempts AFTER the first one; the wait before retry `k` is
/// `base_delay * 2^(k-1)`, so the defaults wait 1s, 2s, 4s.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_before(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

/// One GET against the backend's matches endpoint. Record-level schema
/// checking is the store's job; only the envelope is validated here.
pub fn fetch_matches(client: &Client, base_url: &str) -> Result<Vec<RawMatch>, FetchError> {
    let url = format!("{base_url}/matches");
    let resp = client
        .get(&url)
        .send()
        .map_err(|err| FetchError::Unreachable(err.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Http(status));
    }
    let body = resp
        .text()
        .map_err(|err| FetchError::Unreachable(err.to_string()))?;
    parse_matches_json(&body)
}

/// Decodes the `{ "matches": [...] }` envelope. A record that does not even
/// deserialize becomes a fully empty match: it stays countable (and lands in
/// the Poor bucket) without failing the load.
pub fn parse_matches_json(raw: &str) -> Result<Vec<RawMatch>, FetchError> {
    let root: serde_json::Value = serde_json::from_str(raw.trim())
        .map_err(|err| FetchError::Format(format!("invalid json: {err}")))?;
    let Some(entries) = root.get("matches").and_then(|v| v.as_array()) else {
        return Err(FetchError::Format("missing `matches` array".to_string()));
    };
    Ok(entries
        .iter()
        .map(|entry| serde_json::from_value::<RawMatch>(entry.clone()).unwrap_or_default())
        .collect())
}

/// Retry wrapper around a single-attempt load. Performs at most
/// `1 + max_retries` attempts, sleeping the backoff in short slices while
/// watching the shared generation counter: the moment a newer load bumps it,
/// this one stops with `Superseded` and touches nothing.
pub fn load_with_retry<T>(
    policy: RetryPolicy,
    latest: &AtomicU64,
    generation: u64,
    mut attempt_load: impl FnMut() -> Result<T, FetchError>,
) -> Result<T, FetchError> {
    let mut retry = 0u32;
    loop {
        if latest.load(Ordering::SeqCst) != generation {
            return Err(FetchError::Superseded);
        }
        match attempt_load() {
            Ok(value) => return Ok(value),
            Err(FetchError::Superseded) => return Err(FetchError::Superseded),
            Err(err) => {
                retry += 1;
                if retry > policy.max_retries {
                    return Err(err);
                }
                let delay = policy.delay_before(retry) + backoff_jitter();
                if !wait_unless_superseded(delay, latest, generation) {
                    return Err(FetchError::Superseded);
                }
            }
        }
    }
}

pub fn fetch_matches_with_retry(
    client: &Client,
    base_url: &str,
    policy: RetryPolicy,
    latest: &AtomicU64,
    generation: u64,
) -> Result<Vec<RawMatch>, FetchError> {
    load_with_retry(policy, latest, generation, || {
        fetch_matches(client, base_url)
    })
}

fn backoff_jitter() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(0..250))
}

fn wait_unless_superseded(total: Duration, latest: &AtomicU64, generation: u64) -> bool {
    const SLICE: Duration = Duration::from_millis(100);
    let mut remaining = total;
    while remaining > Duration::ZERO {
        if latest.load(Ordering::SeqCst) != generation {
            return false;
        }
        let step = remaining.min(SLICE);
        thread::sleep(step);
        remaining -= step;
    }
    latest.load(Ordering::SeqCst) == generation
}
