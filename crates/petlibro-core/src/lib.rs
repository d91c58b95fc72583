// petlibro-core: Device-state sync hub between petlibro-api and hosts (CLI, integrations).

pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod hub;
pub mod model;
pub mod registry;
mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_POLL_INTERVAL, HubConfig};
pub use device::Device;
pub use error::CoreError;
pub use event::{DeviceEvent, EventEmitter, Subscription};
pub use hub::{DiscoveryReport, Hub, HubState, RefreshFailure, RefreshReport, UnsupportedDevice};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    DeviceFamily, DeviceInfo, DeviceKind, DeviceSnapshot, FamilyState, FeederState, FeederUnit,
    FeedingPlanEntry, FountainState, FountainUnit, RfidState,
};

// Hosts configure the region without depending on the API crate.
pub use petlibro_api::Region;
