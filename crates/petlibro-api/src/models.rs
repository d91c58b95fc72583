// PETLIBRO API response types
//
// Every endpoint wraps its payload in the `{code, msg, data}` envelope.
// Device payloads are loosely specified and vary by product, so they stay
// as raw JSON maps; only the fields needed for discovery are typed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw field mapping returned by a device-scoped endpoint.
pub type RawFields = Map<String, Value>;

// ── Response Envelope ────────────────────────────────────────────────

/// Standard PETLIBRO response envelope.
///
/// ```json
/// { "code": 0, "msg": null, "data": { ... } }
/// ```
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Value,
}

// ── Auth ─────────────────────────────────────────────────────────────

/// Payload of `/member/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub token: Option<String>,
}

// ── Device ───────────────────────────────────────────────────────────

/// One entry of `/device/device/list`.
///
/// Discovery only needs the serial and the product identity. Everything
/// else lands in `extra` and is merged into the device's property bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(rename = "deviceSn")]
    pub serial: String,
    #[serde(default, rename = "productName", skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(
        default,
        rename = "productIdentifier",
        skip_serializing_if = "Option::is_none"
    )]
    pub product_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Catch-all for the remaining fields.
    #[serde(flatten)]
    pub extra: RawFields,
}

impl DeviceRecord {
    /// Flatten back into the raw vendor field mapping.
    pub fn into_fields(self) -> RawFields {
        let mut fields = self.extra;
        fields.insert("deviceSn".into(), Value::String(self.serial));
        if let Some(product_name) = self.product_name {
            fields.insert("productName".into(), Value::String(product_name));
        }
        if let Some(identifier) = self.product_identifier {
            fields.insert("productIdentifier".into(), Value::String(identifier));
        }
        if let Some(name) = self.name {
            fields.insert("name".into(), Value::String(name));
        }
        fields
    }

    /// Short label for logs: product name, then identifier.
    pub fn product_label(&self) -> &str {
        self.product_name
            .as_deref()
            .or(self.product_identifier.as_deref())
            .unwrap_or("<unknown>")
    }
}
