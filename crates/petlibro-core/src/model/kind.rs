use serde::Serialize;
use strum::{Display, EnumIter};

/// Device family: what the device dispenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeviceFamily {
    Feeder,
    Fountain,
}

/// Concrete supported product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
pub enum DeviceKind {
    #[strum(serialize = "Granary Feeder")]
    GranaryFeeder,
    #[strum(serialize = "Granary Smart Feeder")]
    GranarySmartFeeder,
    #[strum(serialize = "One RFID Smart Feeder")]
    OneRfidSmartFeeder,
    #[strum(serialize = "Dockstream Smart Fountain")]
    DockstreamSmartFountain,
}

impl DeviceKind {
    pub fn family(self) -> DeviceFamily {
        match self {
            Self::GranaryFeeder | Self::GranarySmartFeeder | Self::OneRfidSmartFeeder => {
                DeviceFamily::Feeder
            }
            Self::DockstreamSmartFountain => DeviceFamily::Fountain,
        }
    }

    pub fn is_feeder(self) -> bool {
        self.family() == DeviceFamily::Feeder
    }

    /// Vendor `productName` as reported by the device list.
    pub fn product_name(self) -> &'static str {
        match self {
            Self::GranaryFeeder => "Granary Feeder",
            Self::GranarySmartFeeder => "Granary Smart Feeder",
            Self::OneRfidSmartFeeder => "One RFID Smart Feeder",
            Self::DockstreamSmartFountain => "Dockstream Smart Fountain",
        }
    }

    /// Vendor `productIdentifier` (model code).
    pub fn identifier(self) -> &'static str {
        match self {
            Self::GranaryFeeder => "PLAF103",
            Self::GranarySmartFeeder => "PLAF108",
            Self::OneRfidSmartFeeder => "PLAF301",
            Self::DockstreamSmartFountain => "PLWF105",
        }
    }

    /// Whether a refresh also reads `/device/data/grainStatus`.
    pub fn reads_grain_status(self) -> bool {
        !matches!(self, Self::GranaryFeeder)
    }

    /// Whether a refresh also reads today's feeding plan.
    pub fn reads_feeding_plan(self) -> bool {
        self.is_feeder()
    }

    /// Whether the snapshot carries the RFID feeder's door, battery and
    /// eating-time fields.
    pub fn has_rfid_fields(self) -> bool {
        matches!(self, Self::OneRfidSmartFeeder)
    }
}
