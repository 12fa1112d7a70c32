//! Shared domain types for case generation.
//!
//! These types mirror the values stored in the configuration database. Their
//! serde names match the stored strings so that snapshots can be read
//! directly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Material phase of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Fluid,
    Solid,
}

/// Declared type of a boundary patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoundaryType {
    VelocityInlet,
    FlowRateInlet,
    PressureInlet,
    AblInlet,
    OpenChannelInlet,
    FreeStream,
    FarFieldRiemann,
    SubsonicInflow,
    SupersonicInflow,
    PressureOutlet,
    OpenChannelOutlet,
    Outflow,
    SubsonicOutflow,
    SupersonicOutflow,
    Wall,
    ThermoCoupledWall,
    PorousJump,
    Fan,
    Symmetry,
    Interface,
    Empty,
    Cyclic,
    Wedge,
}

impl BoundaryType {
    pub const ALL: [BoundaryType; 23] = [
        BoundaryType::VelocityInlet,
        BoundaryType::FlowRateInlet,
        BoundaryType::PressureInlet,
        BoundaryType::AblInlet,
        BoundaryType::OpenChannelInlet,
        BoundaryType::FreeStream,
        BoundaryType::FarFieldRiemann,
        BoundaryType::SubsonicInflow,
        BoundaryType::SupersonicInflow,
        BoundaryType::PressureOutlet,
        BoundaryType::OpenChannelOutlet,
        BoundaryType::Outflow,
        BoundaryType::SubsonicOutflow,
        BoundaryType::SupersonicOutflow,
        BoundaryType::Wall,
        BoundaryType::ThermoCoupledWall,
        BoundaryType::PorousJump,
        BoundaryType::Fan,
        BoundaryType::Symmetry,
        BoundaryType::Interface,
        BoundaryType::Empty,
        BoundaryType::Cyclic,
        BoundaryType::Wedge,
    ];

    /// Stored (camelCase) name.
    pub fn as_str(self) -> &'static str {
        match self {
            BoundaryType::VelocityInlet => "velocityInlet",
            BoundaryType::FlowRateInlet => "flowRateInlet",
            BoundaryType::PressureInlet => "pressureInlet",
            BoundaryType::AblInlet => "ablInlet",
            BoundaryType::OpenChannelInlet => "openChannelInlet",
            BoundaryType::FreeStream => "freeStream",
            BoundaryType::FarFieldRiemann => "farFieldRiemann",
            BoundaryType::SubsonicInflow => "subsonicInflow",
            BoundaryType::SupersonicInflow => "supersonicInflow",
            BoundaryType::PressureOutlet => "pressureOutlet",
            BoundaryType::OpenChannelOutlet => "openChannelOutlet",
            BoundaryType::Outflow => "outflow",
            BoundaryType::SubsonicOutflow => "subsonicOutflow",
            BoundaryType::SupersonicOutflow => "supersonicOutflow",
            BoundaryType::Wall => "wall",
            BoundaryType::ThermoCoupledWall => "thermoCoupledWall",
            BoundaryType::PorousJump => "porousJump",
            BoundaryType::Fan => "fan",
            BoundaryType::Symmetry => "symmetry",
            BoundaryType::Interface => "interface",
            BoundaryType::Empty => "empty",
            BoundaryType::Cyclic => "cyclic",
            BoundaryType::Wedge => "wedge",
        }
    }
}

impl fmt::Display for BoundaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coupling mode of an `interface` boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterfaceMode {
    InternalInterface,
    RotationalPeriodic,
    TranslationalPeriodic,
    RegionInterface,
}

/// One boundary patch of a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BoundaryType,
}

/// A mesh region with its boundaries. `name` is empty for single-region cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub phase: Phase,
    pub boundaries: Vec<Boundary>,
}

/// Flags describing the active solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverCapability {
    /// Solver solves for `p_rgh` and derives `p`.
    pub use_prgh: bool,
    /// `p_rgh` carries gauge pressure (operating pressure excluded).
    pub gauge_pressure_in_prgh: bool,
}

/// Pressure variable written by the pressure builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureField {
    P,
    PRgh,
}

impl PressureField {
    pub fn object(self) -> &'static str {
        match self {
            PressureField::P => "p",
            PressureField::PRgh => "p_rgh",
        }
    }
}

/// Pressure-velocity coupling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouplingScheme {
    Simple,
    Simplec,
}

/// How a boundary's temperature is specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureProfile {
    Constant,
    SpatialDistribution,
    TemporalDistribution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalDistribution {
    PiecewiseLinear,
    Polynomial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowRateSpecification {
    VolumeFlowRate,
    MassFlowRate,
}

/// Error for stored strings that match no known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

macro_rules! stored_names {
    ($ty:ty { $($name:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($variant),)+
                    other => Err(UnknownVariant(other.to_string())),
                }
            }
        }
    };
}

stored_names!(Phase {
    "fluid" => Phase::Fluid,
    "solid" => Phase::Solid,
});

stored_names!(InterfaceMode {
    "internalInterface" => InterfaceMode::InternalInterface,
    "rotationalPeriodic" => InterfaceMode::RotationalPeriodic,
    "translationalPeriodic" => InterfaceMode::TranslationalPeriodic,
    "regionInterface" => InterfaceMode::RegionInterface,
});

stored_names!(CouplingScheme {
    "SIMPLE" => CouplingScheme::Simple,
    "SIMPLEC" => CouplingScheme::Simplec,
});

stored_names!(TemperatureProfile {
    "constant" => TemperatureProfile::Constant,
    "spatialDistribution" => TemperatureProfile::SpatialDistribution,
    "temporalDistribution" => TemperatureProfile::TemporalDistribution,
});

stored_names!(TemporalDistribution {
    "piecewiseLinear" => TemporalDistribution::PiecewiseLinear,
    "polynomial" => TemporalDistribution::Polynomial,
});

stored_names!(FlowRateSpecification {
    "volumeFlowRate" => FlowRateSpecification::VolumeFlowRate,
    "massFlowRate" => FlowRateSpecification::MassFlowRate,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_type_names_match_serde() {
        for kind in BoundaryType::ALL {
            let json = serde_json::to_string(&kind).expect("serialize");
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn stored_names_parse_and_reject_unknown() {
        assert_eq!("regionInterface".parse(), Ok(InterfaceMode::RegionInterface));
        assert_eq!("SIMPLEC".parse(), Ok(CouplingScheme::Simplec));
        assert_eq!(
            "sideways".parse::<TemperatureProfile>(),
            Err(UnknownVariant("sideways".to_string()))
        );
    }
}
