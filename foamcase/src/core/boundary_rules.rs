//! Boundary rule resolution shared by the field builders.
//!
//! Two layers:
//! - [`PatchKind`]: the geometric patch a boundary type maps to. Used when a
//!   field is computed by the solver and only needs a structurally valid entry.
//! - Fragment constructors: the condition dictionaries themselves.
//!
//! `interface` boundaries need a secondary lookup of their interface mode;
//! a region interface couples physics across regions, every other mode is a
//! generic AMI coupling.

use std::str::FromStr;

use crate::core::config_db::{ConfigDb, keys, require_choice, require_f64, require_vector};
use crate::core::dictionary::{Dictionary, Value};
use crate::core::error::BuildError;
use crate::core::types::{Boundary, BoundaryType, InterfaceMode, Phase, UnknownVariant};

/// Geometric patch kind of a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    Calculated,
    Cyclic,
    Symmetry,
    CyclicAmi,
    Empty,
    Wedge,
}

/// Patch kind for a boundary type. `mode` is consulted only for `interface`.
pub fn patch_kind_of(kind: BoundaryType, mode: Option<InterfaceMode>) -> PatchKind {
    match kind {
        BoundaryType::VelocityInlet
        | BoundaryType::FlowRateInlet
        | BoundaryType::PressureInlet
        | BoundaryType::AblInlet
        | BoundaryType::OpenChannelInlet
        | BoundaryType::FreeStream
        | BoundaryType::FarFieldRiemann
        | BoundaryType::SubsonicInflow
        | BoundaryType::SupersonicInflow
        | BoundaryType::PressureOutlet
        | BoundaryType::OpenChannelOutlet
        | BoundaryType::Outflow
        | BoundaryType::SubsonicOutflow
        | BoundaryType::SupersonicOutflow
        | BoundaryType::Wall
        | BoundaryType::ThermoCoupledWall => PatchKind::Calculated,
        BoundaryType::PorousJump | BoundaryType::Fan | BoundaryType::Cyclic => PatchKind::Cyclic,
        BoundaryType::Symmetry => PatchKind::Symmetry,
        BoundaryType::Interface => match mode {
            Some(InterfaceMode::RegionInterface) => PatchKind::Calculated,
            _ => PatchKind::CyclicAmi,
        },
        BoundaryType::Empty => PatchKind::Empty,
        BoundaryType::Wedge => PatchKind::Wedge,
    }
}

/// Resolves boundary-level settings for one field.
pub struct BoundaryRuleResolver<'a> {
    db: &'a dyn ConfigDb,
    field: &'static str,
}

impl<'a> BoundaryRuleResolver<'a> {
    pub fn new(db: &'a dyn ConfigDb, field: &'static str) -> Self {
        Self { db, field }
    }

    pub fn db(&self) -> &'a dyn ConfigDb {
        self.db
    }

    /// Settings path below `boundaries/<id>/`.
    pub fn path(&self, boundary: &Boundary, relative: &str) -> String {
        format!("{}/{relative}", keys::boundary(boundary.id))
    }

    pub fn interface_mode(&self, boundary: &Boundary) -> Result<InterfaceMode, BuildError> {
        self.choice(boundary, "interface/mode")
    }

    /// Patch kind, reading the interface mode only for `interface` boundaries.
    pub fn patch_kind(&self, boundary: &Boundary) -> Result<PatchKind, BuildError> {
        let mode = match boundary.kind {
            BoundaryType::Interface => Some(self.interface_mode(boundary)?),
            _ => None,
        };
        Ok(patch_kind_of(boundary.kind, mode))
    }

    /// Choice-valued setting below the boundary; unknown values have no rule.
    pub fn choice<T>(&self, boundary: &Boundary, relative: &str) -> Result<T, BuildError>
    where
        T: FromStr<Err = UnknownVariant>,
    {
        require_choice(
            self.db,
            &self.path(boundary, relative),
            self.field,
            &boundary.name,
        )
    }

    pub fn number(&self, boundary: &Boundary, relative: &str) -> Result<f64, BuildError> {
        require_f64(self.db, &self.path(boundary, relative))
    }

    /// `operating + <relative>`: absolute pressure from a user-entered gauge value.
    pub fn pressure(
        &self,
        boundary: &Boundary,
        relative: &str,
        operating: f64,
    ) -> Result<f64, BuildError> {
        Ok(operating + self.number(boundary, relative)?)
    }

    pub fn far_field_riemann(
        &self,
        boundary: &Boundary,
        operating: f64,
    ) -> Result<Dictionary, BuildError> {
        Ok(Dictionary::new()
            .with("type", "farfieldRiemann")
            .with(
                "flowDir",
                Value::vector(require_vector(
                    self.db,
                    &self.path(boundary, "farFieldRiemann/flowDirection"),
                )?),
            )
            .with("MInf", self.number(boundary, "farFieldRiemann/machNumber")?)
            .with(
                "pInf",
                self.pressure(boundary, "farFieldRiemann/staticPressure", operating)?,
            )
            .with(
                "TInf",
                self.number(boundary, "farFieldRiemann/staticTemperature")?,
            ))
    }

    pub fn subsonic_inflow(
        &self,
        boundary: &Boundary,
        operating: f64,
    ) -> Result<Dictionary, BuildError> {
        Ok(Dictionary::new()
            .with("type", "subsonicInflow")
            .with(
                "flowDir",
                Value::vector(require_vector(
                    self.db,
                    &self.path(boundary, "subsonicInflow/flowDirection"),
                )?),
            )
            .with(
                "p0",
                self.pressure(boundary, "subsonicInflow/totalPressure", operating)?,
            )
            .with(
                "T0",
                self.number(boundary, "subsonicInflow/totalTemperature")?,
            ))
    }

    pub fn subsonic_outflow(
        &self,
        boundary: &Boundary,
        operating: f64,
    ) -> Result<Dictionary, BuildError> {
        Ok(Dictionary::new().with("type", "subsonicOutflow").with(
            "pExit",
            self.pressure(boundary, "subsonicOutflow/staticPressure", operating)?,
        ))
    }
}

/// `{ type <name>; }`
pub fn patch_type(name: &str) -> Dictionary {
    Dictionary::new().with("type", name)
}

pub fn zero_gradient() -> Dictionary {
    patch_type("zeroGradient")
}

pub fn fixed_value(value: f64) -> Dictionary {
    Dictionary::new()
        .with("type", "fixedValue")
        .with("value", Value::uniform(value))
}

pub fn calculated(value: f64) -> Dictionary {
    Dictionary::new()
        .with("type", "calculated")
        .with("value", Value::uniform(value))
}

/// Structural entry for a patch kind; `initial` fills calculated patches.
pub fn forced(kind: PatchKind, initial: f64) -> Dictionary {
    match kind {
        PatchKind::Calculated => calculated(initial),
        PatchKind::Cyclic => patch_type("cyclic"),
        PatchKind::Symmetry => patch_type("symmetry"),
        PatchKind::CyclicAmi => patch_type("cyclicAMI"),
        PatchKind::Empty => patch_type("empty"),
        PatchKind::Wedge => patch_type("wedge"),
    }
}

/// Conjugate heat transfer coupling to the neighbouring region's `T`.
pub fn coupled_temperature_baffle(phase: Phase) -> Dictionary {
    let kappa_method = match phase {
        Phase::Solid => "solidThermo",
        Phase::Fluid => "fluidThermo",
    };
    Dictionary::new()
        .with("type", "turbulentTemperatureCoupledBaffleMixed")
        .with("Tnbr", "T")
        .with("kappaMethod", kappa_method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::render_value;
    use crate::test_support::{ConfigBuilder, boundary};

    #[test]
    fn every_type_has_a_patch_kind() {
        for kind in BoundaryType::ALL {
            let _ = patch_kind_of(kind, None);
            let _ = patch_kind_of(kind, Some(InterfaceMode::RegionInterface));
        }
        assert_eq!(
            patch_kind_of(BoundaryType::Fan, None),
            PatchKind::Cyclic
        );
        assert_eq!(
            patch_kind_of(BoundaryType::Interface, Some(InterfaceMode::InternalInterface)),
            PatchKind::CyclicAmi
        );
        assert_eq!(
            patch_kind_of(BoundaryType::Interface, Some(InterfaceMode::RegionInterface)),
            PatchKind::Calculated
        );
    }

    #[test]
    fn patch_kind_reads_interface_mode() {
        let db = ConfigBuilder::new()
            .value("boundaries/4/interface/mode", "regionInterface")
            .build();
        let resolver = BoundaryRuleResolver::new(&db, "p");
        let kind = resolver
            .patch_kind(&boundary(4, "coupling", BoundaryType::Interface))
            .expect("kind");
        assert_eq!(kind, PatchKind::Calculated);
    }

    #[test]
    fn interface_without_mode_fails_loudly() {
        let db = ConfigBuilder::new().build();
        let resolver = BoundaryRuleResolver::new(&db, "p");
        let err = resolver
            .patch_kind(&boundary(4, "coupling", BoundaryType::Interface))
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingValue(_)));
    }

    #[test]
    fn far_field_adds_operating_pressure() {
        let db = ConfigBuilder::new()
            .value("boundaries/2/farFieldRiemann/flowDirection", "1 0 0")
            .value("boundaries/2/farFieldRiemann/machNumber", "0.8")
            .value("boundaries/2/farFieldRiemann/staticPressure", "500")
            .value("boundaries/2/farFieldRiemann/staticTemperature", "288")
            .build();
        let resolver = BoundaryRuleResolver::new(&db, "p");
        let dict = resolver
            .far_field_riemann(&boundary(2, "far", BoundaryType::FarFieldRiemann), 100000.0)
            .expect("far field");
        assert_eq!(dict.get("pInf"), Some(&Value::Number(100500.0)));
        assert_eq!(
            render_value(dict.get("flowDir").expect("flowDir")),
            "(1 0 0)"
        );
    }

    #[test]
    fn coupled_baffle_kappa_follows_phase() {
        let solid = coupled_temperature_baffle(Phase::Solid);
        let fluid = coupled_temperature_baffle(Phase::Fluid);
        assert_eq!(solid.get("kappaMethod"), Some(&Value::word("solidThermo")));
        assert_eq!(fluid.get("kappaMethod"), Some(&Value::word("fluidThermo")));
        assert_eq!(solid.get("Tnbr"), Some(&Value::word("T")));
    }
}
