// ── Device ──
//
// One discovered PETLIBRO device: its raw property bag, the typed snapshot
// derived from it, and the commands it accepts. A refresh merges fresh API
// payloads into the bag and notifies subscribers once.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use petlibro_api::{DeviceRecord, PetLibroClient, RawFields};
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::error::CoreError;
use crate::event::{DeviceEvent, EventEmitter, Subscription};
use crate::model::{
    DeviceKind, DeviceSnapshot, FEEDING_PLAN_TODAY_KEY, FeederState, FountainState,
    GRAIN_STATUS_KEY, RfidState,
};

struct DeviceState {
    fields: RawFields,
    snapshot: Arc<DeviceSnapshot>,
    last_refresh: Option<DateTime<Utc>>,
}

/// A supported PETLIBRO device.
///
/// Shared as `Arc<Device>` between the hub and hosts. State is read through
/// [`snapshot()`](Self::snapshot) and the typed accessors; it only changes
/// through [`refresh()`](Self::refresh) and the command methods.
pub struct Device {
    serial: String,
    kind: DeviceKind,
    api: Arc<PetLibroClient>,
    state: RwLock<DeviceState>,
    events: EventEmitter,
    revision: watch::Sender<u64>,
}

impl Device {
    /// Build a device from its device-list entry. No request is made.
    pub fn new(record: DeviceRecord, kind: DeviceKind, api: Arc<PetLibroClient>) -> Self {
        let serial = record.serial.clone();
        let fields = record.into_fields();
        let snapshot = Arc::new(DeviceSnapshot::from_fields(kind, &fields));
        let (revision, _) = watch::channel(0);

        Self {
            serial,
            kind,
            api,
            state: RwLock::new(DeviceState {
                fields,
                snapshot,
                last_refresh: None,
            }),
            events: EventEmitter::new(),
            revision,
        }
    }

    // ── Identity ─────────────────────────────────────────────────────

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    // ── State ────────────────────────────────────────────────────────

    /// The typed view as of the last merge.
    pub fn snapshot(&self) -> Arc<DeviceSnapshot> {
        Arc::clone(&self.read_state().snapshot)
    }

    /// Copy of the raw property bag.
    pub fn raw_fields(&self) -> RawFields {
        self.read_state().fields.clone()
    }

    /// One raw field by its vendor key.
    pub fn raw_field(&self, key: &str) -> Option<Value> {
        self.read_state().fields.get(key).cloned()
    }

    /// When the last successful refresh was merged.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.read_state().last_refresh
    }

    pub fn name(&self) -> String {
        self.snapshot().info.name.clone()
    }

    pub fn feeder(&self) -> Option<FeederState> {
        self.snapshot().feeder().cloned()
    }

    pub fn fountain(&self) -> Option<FountainState> {
        self.snapshot().fountain().cloned()
    }

    pub fn rfid(&self) -> Option<RfidState> {
        self.snapshot().rfid().cloned()
    }

    /// Whether the food bowl door is open. `false` for devices without one.
    pub fn door_state(&self) -> bool {
        self.snapshot().rfid().is_some_and(|r| r.door_state)
    }

    pub fn food_low(&self) -> bool {
        self.snapshot().rfid().is_some_and(|r| r.food_low)
    }

    pub fn battery_low(&self) -> bool {
        self.snapshot().rfid().is_some_and(|r| r.battery_low)
    }

    // ── Notifications ────────────────────────────────────────────────

    /// Register a callback for `event`. See [`EventEmitter::on`].
    pub fn on<F>(&self, event: DeviceEvent, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.events.on(event, callback)
    }

    /// Revision counter, bumped once per merge.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Fetch the device's current state and merge it.
    ///
    /// Issues base and real info plus the kind's extra reads concurrently.
    /// If any call fails nothing is merged and no notification is emitted.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let serial = self.serial.as_str();
        let kind = self.kind;

        let grain_status = async {
            if kind.reads_grain_status() {
                self.api.device_grain_status(serial).await.map(Some)
            } else {
                Ok(None)
            }
        };
        let feeding_plan = async {
            if kind.reads_feeding_plan() {
                self.api.device_feeding_plan_today(serial).await.map(Some)
            } else {
                Ok(None)
            }
        };

        let (base, real, grain_status, feeding_plan) = tokio::try_join!(
            self.api.device_base_info(serial),
            self.api.device_real_info(serial),
            grain_status,
            feeding_plan,
        )?;

        let mut update = base;
        update.extend(real);
        if let Some(grain_status) = grain_status {
            update.insert(GRAIN_STATUS_KEY.into(), Value::Object(grain_status));
        }
        if let Some(feeding_plan) = feeding_plan {
            update.insert(FEEDING_PLAN_TODAY_KEY.into(), Value::Object(feeding_plan));
        }

        self.merge(update);
        debug!(serial, %kind, "device refreshed");
        Ok(())
    }

    /// Merge `update` over the bag, re-derive the snapshot, and notify.
    ///
    /// Keys absent from `update` keep their previous values.
    pub(crate) fn merge(&self, update: RawFields) {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.fields.extend(update);
            state.snapshot = Arc::new(DeviceSnapshot::from_fields(self.kind, &state.fields));
            state.last_refresh = Some(Utc::now());
        }

        self.revision.send_modify(|rev| *rev += 1);
        self.events.emit(DeviceEvent::Update);
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Dispense `portions` now, then refresh.
    pub async fn manual_feed(&self, portions: u32) -> Result<(), CoreError> {
        self.require_feeder("manual feed")?;
        self.api.manual_feed(&self.serial, portions).await?;
        self.refresh().await
    }

    /// Turn the scheduled feeding plan on or off, then refresh.
    pub async fn set_feeding_plan(&self, enabled: bool) -> Result<(), CoreError> {
        self.require_feeder("feeding plan")?;
        self.api.set_feeding_plan(&self.serial, enabled).await?;
        self.refresh().await
    }

    /// Enable or skip all of today's plan entries, then refresh.
    pub async fn set_feeding_plan_today_all(&self, enabled: bool) -> Result<(), CoreError> {
        self.require_feeder("today's feeding plans")?;
        self.api
            .set_feeding_plan_today_all(&self.serial, enabled)
            .await?;
        self.refresh().await
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn require_feeder(&self, operation: &str) -> Result<(), CoreError> {
        if self.kind.is_feeder() {
            Ok(())
        } else {
            Err(CoreError::Unsupported {
                operation: operation.to_owned(),
                kind: self.kind.to_string(),
            })
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, DeviceState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("serial", &self.serial)
            .field("kind", &self.kind)
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use petlibro_api::Region;
    use serde_json::json;
    use url::Url;

    fn offline_device(kind: DeviceKind, record: Value) -> Device {
        let api = PetLibroClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:9").unwrap(),
            Region::Us,
            "UTC",
        );
        let record: DeviceRecord = serde_json::from_value(record).unwrap();
        Device::new(record, kind, Arc::new(api))
    }

    fn fields(value: Value) -> RawFields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn new_device_derives_snapshot_from_list_entry() {
        let device = offline_device(
            DeviceKind::GranaryFeeder,
            json!({ "deviceSn": "GF1", "productName": "Granary Feeder", "name": "Hall" }),
        );

        assert_eq!(device.serial(), "GF1");
        assert_eq!(device.name(), "Hall");
        assert_eq!(device.snapshot().info.model_name, "Granary Feeder");
        assert_eq!(device.revision(), 0);
        assert!(device.last_refresh().is_none());
    }

    #[test]
    fn merge_preserves_absent_keys_and_overwrites_present_ones() {
        let device = offline_device(
            DeviceKind::OneRfidSmartFeeder,
            json!({ "deviceSn": "ABC123", "name": "Kitchen" }),
        );

        device.merge(fields(json!({ "barnDoorState": true, "electricQuantity": 90 })));
        device.merge(fields(json!({ "electricQuantity": 85 })));

        assert!(device.door_state());
        assert_eq!(device.raw_field("electricQuantity"), Some(json!(85)));
        assert_eq!(device.name(), "Kitchen");
        assert_eq!(device.revision(), 2);
        assert!(device.last_refresh().is_some());
    }

    #[test]
    fn merge_emits_one_update_per_call() {
        let device = offline_device(DeviceKind::GranaryFeeder, json!({ "deviceSn": "GF1" }));
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let sub = device.on(DeviceEvent::Update, move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        device.merge(fields(json!({ "unitType": 1 })));
        device.merge(fields(json!({ "unitType": 1 })));
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        sub.dispose();
        device.merge(RawFields::new());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn callback_can_read_state_during_emit() {
        let device = Arc::new(offline_device(
            DeviceKind::OneRfidSmartFeeder,
            json!({ "deviceSn": "ABC123" }),
        ));
        let seen = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&device);
        let s = Arc::clone(&seen);
        let _sub = device.on(DeviceEvent::Update, move || {
            if let Some(device) = weak.upgrade() {
                if device.door_state() {
                    s.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        device.merge(fields(json!({ "barnDoorState": true })));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn feeder_commands_are_unsupported_on_fountains() {
        let device = offline_device(
            DeviceKind::DockstreamSmartFountain,
            json!({ "deviceSn": "WF1" }),
        );

        let err = device.manual_feed(1).await.unwrap_err();
        assert!(matches!(err, CoreError::Unsupported { .. }));
        let err = device.set_feeding_plan(true).await.unwrap_err();
        assert!(matches!(err, CoreError::Unsupported { .. }));
        assert_eq!(device.revision(), 0);
    }
}
