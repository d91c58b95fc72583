// ── Domain model ──
//
// Device kinds, units, and the typed snapshot derived from a device's raw
// property bag.

pub mod duration;
mod fields;
pub mod kind;
pub mod snapshot;
pub mod units;

pub use duration::parse_eating_time;
pub use kind::{DeviceFamily, DeviceKind};
pub use snapshot::{
    DeviceInfo, DeviceSnapshot, FEEDING_PLAN_TODAY_KEY, FamilyState, FeederState,
    FeedingPlanEntry, FountainState, GRAIN_STATUS_KEY, RfidState,
};
pub use units::{FeederUnit, FountainUnit, convert, convert_volume};
