use md5::{Digest, Md5};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// PETLIBRO account region. Each region is served by its own API host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum Region {
    #[default]
    #[strum(serialize = "US")]
    #[serde(rename = "US")]
    Us,
}

impl Region {
    /// The API base URL for this region.
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Us => "https://api.us.petlibro.com",
        }
    }

    /// The two-letter country code sent in the login body.
    pub fn code(self) -> &'static str {
        match self {
            Self::Us => "US",
        }
    }
}

/// Account credentials kept by the client for transparent re-login.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// Hex-encoded MD5 digest of the password.
///
/// The PETLIBRO login endpoint only accepts this form. It is a constraint of
/// the vendor protocol and offers no protection of the password in transit
/// beyond what TLS already provides.
pub fn hash_password(password: &str) -> String {
    hex::encode(Md5::digest(password.as_bytes()))
}
