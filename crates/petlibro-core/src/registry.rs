// ── Product registry ──
//
// Static table mapping the vendor's product name and model identifier to a
// supported `DeviceKind`. Resolved once per device, at discovery.

use strum::IntoEnumIterator;

use crate::error::CoreError;
use crate::model::DeviceKind;

/// Resolve a device list entry to a supported kind.
///
/// The product name is tried first, then the model identifier. Matching is
/// exact; the vendor reports both verbatim.
pub fn lookup(product_name: Option<&str>, identifier: Option<&str>) -> Result<DeviceKind, CoreError> {
    let by_name = product_name.and_then(|name| DeviceKind::iter().find(|k| k.product_name() == name));
    let by_identifier =
        || identifier.and_then(|id| DeviceKind::iter().find(|k| k.identifier() == id));

    by_name
        .or_else(by_identifier)
        .ok_or_else(|| CoreError::UnsupportedDevice {
            product: product_name
                .or(identifier)
                .unwrap_or("<unknown>")
                .to_owned(),
        })
}
