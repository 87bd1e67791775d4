//! Shared HTTP plumbing for the data providers.
//!
//! Every provider client wraps a [`RetryingClient`], which spaces requests
//! by a per-provider minimum interval and retries transient failures with
//! exponential backoff plus jitter.

use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Longest wait honoured from a `Retry-After` header.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Timeout and retry limits shared by all providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

/// HTTP client with request spacing and retry.
pub struct RetryingClient {
    name: &'static str,
    client: Client,
    max_retries: u32,
    base_delay: Duration,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RetryingClient {
    pub fn new(
        name: &'static str,
        settings: HttpSettings,
        min_interval: Duration,
    ) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            name,
            client,
            max_retries: settings.max_retries,
            base_delay: Duration::from_secs(1),
            min_interval,
            last_request: Mutex::new(None),
        })
    }

    /// Override the first retry delay.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wait until `min_interval` has passed since the previous request.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Delay before retry number `attempt` (1-based).
    fn backoff(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1));
        let jitter_ms = self.base_delay.as_millis() as u64 / 2;
        let jitter = if jitter_ms > 0 {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        } else {
            Duration::ZERO
        };
        exponential + jitter
    }

    /// GET `url` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, String> {
        let mut last_error = String::from("max retries exceeded");
        let mut retry_after: Option<Duration> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = retry_after.take().unwrap_or_else(|| self.backoff(attempt));
                debug!(
                    "{}: retry {}/{} in {:?}",
                    self.name, attempt, self.max_retries, delay
                );
                tokio::time::sleep(delay).await;
            }

            self.throttle().await;
            debug!("{}: GET {}", self.name, redact(url));

            let response = match self.client.get(url).send().await {
                Ok(response) => response,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = format!("Request failed: {}", e);
                    continue;
                }
                Err(e) => return Err(format!("Request failed: {}", e)),
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER));
                last_error = format!("API error: {}", status);
                continue;
            }
            if status.is_server_error() {
                last_error = format!("API error: {}", status);
                continue;
            }
            if !status.is_success() {
                return Err(format!("API error: {}", status));
            }

            return response
                .json::<T>()
                .await
                .map_err(|e| format!("Parse error: {}", e));
        }

        warn!("{}: giving up after {} retries: {}", self.name, self.max_retries, last_error);
        Err(last_error)
    }
}

/// Strip the query string so API keys never reach the logs.
fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
