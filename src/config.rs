use std::time::Duration;

use serde::Deserialize;

/// Client configuration, assembled from CLI arguments and `POLLVOTE_*`
/// environment variables by the binary, or constructed directly by library
/// callers.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    api_url: String,
    request_timeout: u64,
}

impl Config {
    pub fn new(api_url: impl Into<String>, request_timeout: u64) -> Self {
        Self {
            api_url: api_url.into(),
            request_timeout,
        }
    }

    /// Base URL of the question/voting service, e.g. `http://localhost:8080/api`.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Deadline applied to every outgoing request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
