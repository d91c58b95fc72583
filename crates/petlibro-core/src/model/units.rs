// ── Units of measure ──
//
// Devices report quantities in their native portion unit together with a
// `unitType` code. Conversion is a fixed ratio per code.

use serde::Serialize;
use strum::{Display, EnumString};

/// Unit a feeder reports dispensed food in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
pub enum FeederUnit {
    #[strum(serialize = "cup")]
    #[serde(rename = "cup")]
    Cup,
    #[strum(serialize = "oz")]
    #[serde(rename = "oz")]
    Ounce,
    #[strum(serialize = "g")]
    #[serde(rename = "g")]
    Gram,
    #[strum(serialize = "mL")]
    #[serde(rename = "mL")]
    Millilitre,
}

impl FeederUnit {
    /// Map a vendor `unitType` code. Unknown codes yield `None`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Cup),
            2 => Some(Self::Ounce),
            3 => Some(Self::Gram),
            4 => Some(Self::Millilitre),
            _ => None,
        }
    }

    /// Native portions to this unit.
    pub fn ratio(self) -> f64 {
        match self {
            Self::Cup => 1.0 / 12.0,
            Self::Ounce => 0.35,
            Self::Gram => 10.0,
            Self::Millilitre => 20.0,
        }
    }
}

/// Unit a fountain reports water volume in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
pub enum FountainUnit {
    #[strum(serialize = "mL")]
    #[serde(rename = "mL")]
    Millilitre,
    #[strum(serialize = "oz")]
    #[serde(rename = "oz")]
    FluidOunce,
}

impl FountainUnit {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Millilitre),
            2 => Some(Self::FluidOunce),
            _ => None,
        }
    }

    /// Millilitres to this unit.
    pub fn ratio(self) -> f64 {
        match self {
            Self::Millilitre => 1.0,
            Self::FluidOunce => 0.033_814,
        }
    }
}

/// Convert a feeder quantity by its `unitType` code.
///
/// An unknown code leaves the value unchanged.
pub fn convert(value: f64, code: i64) -> f64 {
    FeederUnit::from_code(code).map_or(value, |unit| value * unit.ratio())
}

/// Convert a fountain volume by its `unitType` code.
pub fn convert_volume(value: f64, code: i64) -> f64 {
    FountainUnit::from_code(code).map_or(value, |unit| value * unit.ratio())
}
