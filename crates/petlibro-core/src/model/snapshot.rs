// ── Typed device snapshot ──
//
// Pure mapping from the merged raw property bag to an explicit record.
// Every field has a defined default when its key is missing, so hosts never
// branch on the presence of vendor keys.

use petlibro_api::RawFields;
use serde::Serialize;
use serde_json::Value;

use super::duration::parse_eating_time;
use super::fields;
use super::kind::DeviceKind;
use super::units::{FeederUnit, FountainUnit, convert, convert_volume};

/// Bag key holding the `/device/data/grainStatus` payload.
pub const GRAIN_STATUS_KEY: &str = "grainStatus";
/// Bag key holding the `/device/feedingPlan/todayNew` payload.
pub const FEEDING_PLAN_TODAY_KEY: &str = "feedingPlanToday";

/// Attributes every device carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub serial: String,
    /// Vendor model code (`productIdentifier`).
    pub model: String,
    /// Vendor product name (`productName`).
    pub model_name: String,
    pub name: String,
    pub mac: String,
    pub software_version: String,
    pub hardware_version: String,
    pub online: Option<bool>,
    pub wifi_rssi: Option<i64>,
    pub time_zone: Option<String>,
}

/// One entry of today's feeding plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedingPlanEntry {
    pub id: Option<i64>,
    /// Scheduled time as reported, e.g. `"08:30"`.
    pub time: String,
    pub portions: u32,
    pub enabled: bool,
}

/// Fields only the One RFID Smart Feeder reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RfidState {
    /// Today's total eating time in seconds.
    pub today_eating_time: u32,
    /// `true` when the food bowl door is open.
    pub door_state: bool,
    pub door_blocked: bool,
    /// `true` when the food outlet is working normally.
    pub food_dispenser_state: bool,
    pub food_low: bool,
    pub battery_percent: Option<i64>,
    pub battery_state: Option<String>,
    pub battery_low: bool,
}

/// Feeder family state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeederState {
    pub unit: Option<FeederUnit>,
    /// Today's dispensed quantity, converted to `unit`.
    pub today_feeding_quantity: f64,
    pub today_feeding_times: u32,
    pub manual_feed_enabled: Option<bool>,
    pub feeding_plan_enabled: bool,
    pub feeding_plans_today: Vec<FeedingPlanEntry>,
    pub remaining_desiccant_days: Option<i64>,
    pub rfid: Option<RfidState>,
}

/// Fountain family state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FountainState {
    pub unit: Option<FountainUnit>,
    /// Today's total water volume, converted to `unit`.
    pub today_total_volume: f64,
    pub remaining_cleaning_days: Option<i64>,
    pub remaining_replacement_days: Option<i64>,
    pub weight_percent: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum FamilyState {
    Feeder(FeederState),
    Fountain(FountainState),
}

/// Everything known about one device after its last merge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    pub kind: DeviceKind,
    pub info: DeviceInfo,
    pub state: FamilyState,
}

impl DeviceSnapshot {
    /// Derive the typed view of `fields` for a device of `kind`.
    pub fn from_fields(kind: DeviceKind, fields: &RawFields) -> Self {
        let state = if kind.is_feeder() {
            FamilyState::Feeder(feeder_state(kind, fields))
        } else {
            FamilyState::Fountain(fountain_state(fields))
        };

        Self {
            kind,
            info: device_info(fields),
            state,
        }
    }

    pub fn feeder(&self) -> Option<&FeederState> {
        match self.state {
            FamilyState::Feeder(ref f) => Some(f),
            FamilyState::Fountain(_) => None,
        }
    }

    pub fn fountain(&self) -> Option<&FountainState> {
        match self.state {
            FamilyState::Fountain(ref f) => Some(f),
            FamilyState::Feeder(_) => None,
        }
    }

    pub fn rfid(&self) -> Option<&RfidState> {
        self.feeder().and_then(|f| f.rfid.as_ref())
    }
}

fn device_info(fields: &RawFields) -> DeviceInfo {
    let text = |key: &str| fields::string(fields, key).unwrap_or_default();

    DeviceInfo {
        serial: text("deviceSn"),
        model: text("productIdentifier"),
        model_name: text("productName"),
        name: text("name"),
        mac: text("mac"),
        software_version: text("softwareVersion"),
        hardware_version: text("hardwareVersion"),
        online: fields::flag(fields, "online"),
        wifi_rssi: fields::int(fields, "wifiRssi"),
        time_zone: fields::string(fields, "timezone"),
    }
}

fn feeder_state(kind: DeviceKind, fields: &RawFields) -> FeederState {
    let unit_code = fields::int(fields, "unitType");
    let grain = fields::object(fields, GRAIN_STATUS_KEY);

    let quantity = grain
        .and_then(|g| fields::float(g, "todayFeedingQuantity"))
        .unwrap_or_default();
    let times = grain
        .and_then(|g| fields::int(g, "todayFeedingTimes"))
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or_default();

    FeederState {
        unit: unit_code.and_then(FeederUnit::from_code),
        today_feeding_quantity: unit_code.map_or(quantity, |code| convert(quantity, code)),
        today_feeding_times: times,
        manual_feed_enabled: fields::flag(fields, "enableManualFeeding"),
        feeding_plan_enabled: fields::flag(fields, "enableFeedingPlan").unwrap_or_default(),
        feeding_plans_today: feeding_plans(fields),
        remaining_desiccant_days: fields::int(fields, "remainingDesiccantDays"),
        rfid: kind.has_rfid_fields().then(|| rfid_state(fields)),
    }
}

fn feeding_plans(fields: &RawFields) -> Vec<FeedingPlanEntry> {
    let Some(plans) = fields::object(fields, FEEDING_PLAN_TODAY_KEY)
        .and_then(|p| p.get("plans"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    plans
        .iter()
        .filter_map(Value::as_object)
        .map(|plan| FeedingPlanEntry {
            id: fields::int(plan, "id"),
            time: fields::string(plan, "executionTime").unwrap_or_default(),
            portions: fields::int(plan, "grainNum")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or_default(),
            enabled: fields::flag(plan, "enable").unwrap_or_default(),
        })
        .collect()
}

fn rfid_state(fields: &RawFields) -> RfidState {
    let battery_state = fields::string(fields, "batteryState");

    RfidState {
        today_eating_time: fields::string(fields, "eatingTime")
            .map(|raw| parse_eating_time(&raw))
            .unwrap_or_default(),
        door_state: fields::flag(fields, "barnDoorState").unwrap_or_default(),
        door_blocked: fields::flag(fields, "doorBlockingFlag").unwrap_or_default(),
        food_dispenser_state: fields::flag(fields, "grainOutletState").unwrap_or_default(),
        food_low: !fields::flag(fields, "surplusGrain").unwrap_or(true),
        battery_percent: fields::int(fields, "electricQuantity"),
        battery_low: battery_state
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("low")),
        battery_state,
    }
}

fn fountain_state(fields: &RawFields) -> FountainState {
    let unit_code = fields::int(fields, "unitType");
    let volume = fields::float(fields, "todayTotalMl")
        .or_else(|| fields::object(fields, GRAIN_STATUS_KEY).and_then(|g| fields::float(g, "todayTotalMl")))
        .unwrap_or_default();

    FountainState {
        unit: unit_code.and_then(FountainUnit::from_code),
        today_total_volume: unit_code.map_or(volume, |code| convert_volume(volume, code)),
        remaining_cleaning_days: fields::int(fields, "remainingCleaningDays"),
        remaining_replacement_days: fields::int(fields, "remainingReplacementDays"),
        weight_percent: fields::int(fields, "weightPercent"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn bag(value: Value) -> RawFields {
        match value {
            Value::Object(map) => map,
            _ => RawFields::new(),
        }
    }

    #[test]
    fn empty_bag_yields_defaults() {
        let snap = DeviceSnapshot::from_fields(DeviceKind::GranarySmartFeeder, &RawFields::new());

        assert_eq!(snap.info, DeviceInfo::default());
        let feeder = snap.feeder().cloned().unwrap_or_default();
        assert_eq!(feeder, FeederState::default());
        assert!(snap.fountain().is_none());
        assert!(snap.rfid().is_none());
    }

    #[test]
    fn rfid_feeder_booleans() {
        let fields = bag(json!({
            "deviceSn": "ABC123",
            "barnDoorState": true,
            "doorBlockingFlag": false,
            "grainOutletState": true,
            "surplusGrain": false,
            "batteryState": "LOW",
            "electricQuantity": 12,
            "eatingTime": "2'30''"
        }));
        let snap = DeviceSnapshot::from_fields(DeviceKind::OneRfidSmartFeeder, &fields);
        let rfid = snap.rfid().cloned().unwrap_or_default();

        assert_eq!(snap.info.serial, "ABC123");
        assert!(rfid.door_state);
        assert!(!rfid.door_blocked);
        assert!(rfid.food_dispenser_state);
        assert!(rfid.food_low);
        assert!(rfid.battery_low);
        assert_eq!(rfid.battery_percent, Some(12));
        assert_eq!(rfid.today_eating_time, 150);
    }

    #[test]
    fn missing_surplus_grain_is_not_low() {
        let snap = DeviceSnapshot::from_fields(DeviceKind::OneRfidSmartFeeder, &RawFields::new());
        let rfid = snap.rfid().cloned().unwrap_or_default();
        assert!(!rfid.food_low);
        assert!(!rfid.battery_low);
        assert_eq!(rfid.today_eating_time, 0);
    }

    #[test]
    fn feeder_quantity_is_unit_converted() {
        let fields = bag(json!({
            "unitType": 3,
            "enableFeedingPlan": true,
            "remainingDesiccantDays": "14",
            "grainStatus": { "todayFeedingQuantity": 4, "todayFeedingTimes": 2 },
            "feedingPlanToday": { "plans": [
                { "id": 7, "executionTime": "08:00", "grainNum": 2, "enable": true },
                { "id": 8, "executionTime": "18:00", "grainNum": 1, "enable": false }
            ]}
        }));
        let snap = DeviceSnapshot::from_fields(DeviceKind::GranarySmartFeeder, &fields);
        let feeder = snap.feeder().cloned().unwrap_or_default();

        assert_eq!(feeder.unit, Some(FeederUnit::Gram));
        assert!((feeder.today_feeding_quantity - 40.0).abs() < 1e-9);
        assert_eq!(feeder.today_feeding_times, 2);
        assert!(feeder.feeding_plan_enabled);
        assert_eq!(feeder.remaining_desiccant_days, Some(14));
        assert_eq!(feeder.feeding_plans_today.len(), 2);
        assert_eq!(feeder.feeding_plans_today[1].time, "18:00");
        assert!(!feeder.feeding_plans_today[1].enabled);
        assert!(feeder.rfid.is_none());
    }

    #[test]
    fn fountain_fields() {
        let fields = bag(json!({
            "unitType": 1,
            "todayTotalMl": 320,
            "remainingCleaningDays": 3,
            "remainingReplacementDays": 21,
            "weightPercent": 64
        }));
        let snap = DeviceSnapshot::from_fields(DeviceKind::DockstreamSmartFountain, &fields);
        let fountain = snap.fountain().cloned().unwrap_or_default();

        assert_eq!(fountain.unit, Some(FountainUnit::Millilitre));
        assert!((fountain.today_total_volume - 320.0).abs() < 1e-9);
        assert_eq!(fountain.remaining_cleaning_days, Some(3));
        assert_eq!(fountain.remaining_replacement_days, Some(21));
        assert_eq!(fountain.weight_percent, Some(64));
        assert!(snap.feeder().is_none());
    }
}
