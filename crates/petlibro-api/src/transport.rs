// Transport configuration for building the reqwest::Client.
//
// The PETLIBRO API is a single public HTTPS endpoint, so the only knobs are
// the request timeout and the user agent.

use std::time::Duration;

const DEFAULT_USER_AGENT: &str = concat!("petlibro-rs/", env!("CARGO_PKG_VERSION"));

/// Transport configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout. Always finite.
    pub timeout: Duration,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl TransportConfig {
    /// Config with a custom request timeout and defaults otherwise.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str())
            .build()?;
        Ok(client)
    }
}
