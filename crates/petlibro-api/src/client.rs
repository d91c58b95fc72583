// PETLIBRO API HTTP client
//
// Wraps `reqwest::Client` with the vendor's fixed headers, session token
// handling, envelope unwrapping, and the single re-login retry on session
// expiry. Endpoint methods live in `devices.rs` to keep this module focused
// on transport mechanics.

use std::sync::{Arc, PoisonError, RwLock};

use arc_swap::ArcSwapOption;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::auth::{Credentials, Region, hash_password};
use crate::error::Error;
use crate::models::{Envelope, LoginData};
use crate::transport::TransportConfig;

// ── Vendor protocol constants ────────────────────────────────────────

pub(crate) const CODE_OK: i64 = 0;
pub(crate) const CODE_SESSION_EXPIRED: i64 = 1009;
pub(crate) const CODE_INVALID_CREDENTIALS: i64 = 1102;

const APP_ID: u32 = 1;
const APP_SN: &str = "c35772530d1041699c87fe62348507a8";
const HEADER_SOURCE: &str = "ANDROID";
const HEADER_LANGUAGE: &str = "EN";
const HEADER_VERSION: &str = "1.3.45";

const LOGIN_PATH: &str = "/member/auth/login";
const LOGOUT_PATH: &str = "/member/auth/logout";

/// Longest body excerpt carried in error values.
const BODY_PREVIEW_CHARS: usize = 200;

/// Async client for the PETLIBRO cloud API.
///
/// Every request is a JSON `POST` carrying the fixed app headers and, once
/// authenticated, the session `token` header. Responses are unwrapped from
/// the `{code, msg, data}` envelope before the caller sees them.
///
/// The token is swapped atomically so concurrent requests never observe a
/// torn value. When a request reports an expired session, the client logs in
/// again with the cached credentials and retries that request once.
pub struct PetLibroClient {
    http: reqwest::Client,
    base_url: Url,
    region: Region,
    time_zone: String,
    token: ArcSwapOption<SecretString>,
    /// Cached for transparent re-login. Set by a successful `login()`.
    credentials: RwLock<Option<Credentials>>,
    /// Serializes re-authentication across concurrent requests.
    relogin: Mutex<()>,
}

impl PetLibroClient {
    /// Create a client for the region's API host.
    pub fn new(region: Region, time_zone: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(region.base_url())?;
        Self::with_base_url(base_url, region, time_zone, transport)
    }

    /// Create a client against an explicit base URL (proxies, tests).
    pub fn with_base_url(
        base_url: Url,
        region: Region,
        time_zone: &str,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, region, time_zone))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, region: Region, time_zone: &str) -> Self {
        Self {
            http,
            base_url,
            region,
            time_zone: time_zone.to_owned(),
            token: ArcSwapOption::empty(),
            credentials: RwLock::new(None),
            relogin: Mutex::new(()),
        }
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The account region.
    pub fn region(&self) -> Region {
        self.region
    }

    /// The IANA time zone reported to the API.
    pub fn time_zone(&self) -> &str {
        &self.time_zone
    }

    /// Whether a session token is currently installed.
    pub fn is_authenticated(&self) -> bool {
        self.token.load().is_some()
    }

    /// The current session token, for hosts that persist it between runs.
    pub fn token(&self) -> Option<SecretString> {
        self.token
            .load_full()
            .map(|t| SecretString::from(t.expose_secret().to_owned()))
    }

    /// Install a previously issued session token without logging in.
    pub fn set_token(&self, token: Option<SecretString>) {
        self.token.store(token.map(Arc::new));
    }

    /// Cache credentials for re-login without logging in now.
    ///
    /// Used alongside [`set_token`](Self::set_token) so a stored token that
    /// later expires can still be renewed transparently.
    pub fn remember_credentials(&self, credentials: Credentials) {
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credentials);
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Log in with email and password.
    ///
    /// `POST /member/auth/login`. The password is sent as its MD5 digest
    /// because that is what the vendor endpoint expects. On success the
    /// token is installed and the credentials cached for re-login.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<(), Error> {
        debug!(email, "logging in");

        let body = json!({
            "appId": APP_ID,
            "appSn": APP_SN,
            "country": self.region.code(),
            "email": email,
            "password": hash_password(password.expose_secret()),
            "phoneBrand": "",
            "phoneSystemVersion": "",
            "timezone": self.time_zone,
            "thirdId": null,
            "type": null,
        });

        let data: Option<LoginData> = self.send(LOGIN_PATH, &body, None).await?;
        let token = data
            .and_then(|d| d.token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Authentication {
                message: "login response carried no token".into(),
            })?;

        self.token.store(Some(Arc::new(SecretString::from(token))));
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Credentials {
            email: email.to_owned(),
            password: password.clone(),
        });

        info!("login successful");
        Ok(())
    }

    /// End the current session.
    ///
    /// `POST /member/auth/logout`. The local token and cached credentials
    /// are dropped even if the remote call fails.
    pub async fn logout(&self) -> Result<(), Error> {
        let token = self.token.swap(None);
        self.credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(token) = token else {
            debug!("logout without a session, nothing to do");
            return Ok(());
        };

        let _: Value = self.send(LOGOUT_PATH, &json!({}), Some(&token)).await?;
        debug!("logout complete");
        Ok(())
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Authenticated `POST`, unwrapped, with one re-login on session expiry.
    pub(crate) async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, Error> {
        let token = self.token.load_full();
        let Some(ref current) = token else {
            return Err(Error::NotAuthenticated);
        };

        match self.send(path, body, Some(current)).await {
            Err(Error::SessionExpired) => {
                warn!(path, "session expired, re-authenticating");
                self.reauthenticate(current).await?;

                let retry_token = self.token.load_full();
                match self.send(path, body, retry_token.as_ref()).await {
                    Err(Error::SessionExpired) => Err(Error::Authentication {
                        message: "session expired again after re-authentication".into(),
                    }),
                    other => other,
                }
            }
            other => other,
        }
    }

    /// Replace `stale` with a fresh token.
    ///
    /// If another request already swapped the token while we waited for the
    /// lock, the new token is reused instead of logging in a second time.
    async fn reauthenticate(&self, stale: &Arc<SecretString>) -> Result<(), Error> {
        let _guard = self.relogin.lock().await;

        if let Some(current) = self.token.load_full() {
            if !Arc::ptr_eq(&current, stale) {
                debug!("token already refreshed by a concurrent request");
                return Ok(());
            }
        }

        let credentials = self
            .credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::SessionExpired)?;

        self.login(&credentials.email, &credentials.password).await
    }

    /// Send one `POST` with the fixed headers and unwrap the envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
        token: Option<&Arc<SecretString>>,
    ) -> Result<T, Error> {
        let url = self.base_url.join(path)?;
        debug!("POST {}", url);

        let mut builder = self
            .http
            .post(url)
            .header("source", HEADER_SOURCE)
            .header("language", HEADER_LANGUAGE)
            .header("timezone", self.time_zone.as_str())
            .header("version", HEADER_VERSION)
            .json(body);
        if let Some(token) = token {
            builder = builder.header("token", token.expose_secret());
        }

        let resp = builder.send().await?;
        Self::parse_envelope(resp).await
    }

    /// Parse the `{code, msg, data}` envelope, returning `data` on success.
    async fn parse_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        let body = resp.text().await?;

        let envelope: Envelope = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })?;

        trace!(code = envelope.code, "received envelope");

        match envelope.code {
            CODE_OK => serde_json::from_value(envelope.data).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            }),
            CODE_INVALID_CREDENTIALS => Err(Error::InvalidCredentials),
            CODE_SESSION_EXPIRED => Err(Error::SessionExpired),
            code => Err(Error::Api {
                code,
                message: envelope.msg.unwrap_or_else(|| format!("code={code}")),
            }),
        }
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundaries() {
        let body = "é".repeat(BODY_PREVIEW_CHARS + 10);
        assert_eq!(preview(&body).chars().count(), BODY_PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn new_client_is_unauthenticated() {
        let client = PetLibroClient::with_client(
            reqwest::Client::new(),
            Url::parse(Region::Us.base_url()).expect("static URL"),
            Region::Us,
            "Europe/Paris",
        );
        assert!(!client.is_authenticated());
        assert!(client.token().is_none());

        client.set_token(Some(SecretString::from("abc".to_string())));
        assert!(client.is_authenticated());
        assert_eq!(client.token().map(|t| t.expose_secret().to_owned()).as_deref(), Some("abc"));
    }
}
