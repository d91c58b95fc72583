// ── Runtime hub configuration ──
//
// Describes *how* to reach the PETLIBRO cloud: account, region, timing.
// Carries credential data but never touches disk. The host binary builds
// a `HubConfig` from its own config sources and hands it in.

use std::time::Duration;

use petlibro_api::Region;
use secrecy::SecretString;
use url::Url;

/// Default polling period between device refresh cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Configuration for one PETLIBRO account.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: SecretString,
    /// Session token from a previous run. Installed instead of logging in.
    pub token: Option<SecretString>,
    /// Account region, which selects the API host.
    pub region: Region,
    /// Overrides the region's API host (proxies, tests).
    pub base_url: Option<Url>,
    /// IANA time zone reported to the API.
    pub time_zone: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Period of the background refresh. Zero disables polling.
    pub poll_interval: Duration,
    /// Portions dispensed by a manual feed when none are specified.
    pub manual_feed_portions: u32,
}

impl HubConfig {
    /// Config for the given account with all other settings defaulted.
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
            ..Self::default()
        }
    }

    /// The API base URL in effect: the override, or the region's host.
    pub fn api_url(&self) -> Result<Url, url::ParseError> {
        match self.base_url {
            Some(ref url) => Ok(url.clone()),
            None => Url::parse(self.region.base_url()),
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: SecretString::from(String::new()),
            token: None,
            region: Region::default(),
            base_url: None,
            time_zone: "UTC".into(),
            timeout: Duration::from_secs(30),
            poll_interval: DEFAULT_POLL_INTERVAL,
            manual_feed_portions: 1,
        }
    }
}
