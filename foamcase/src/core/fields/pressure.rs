//! Pressure field files (`p`, `p_rgh`).
//!
//! Which file is produced, and how, depends on the solver:
//! - `p_rgh` is only written for solvers that solve for it.
//! - Under such solvers `p` is derived, so every patch gets a structural
//!   entry (`calculated`, `cyclic`, ...) instead of a physical condition.
//! - If `p_rgh` carries gauge pressure, the operating pressure is dropped so
//!   user-entered values pass through unchanged.

use std::path::Path;

use tracing::debug;

use crate::core::boundary_rules::{
    BoundaryRuleResolver, fixed_value, forced, patch_type, zero_gradient,
};
use crate::core::builder::{AuxSink, DocumentBuilder};
use crate::core::config_db::{ConfigDb, keys, require, require_capability, require_f64};
use crate::core::dictionary::{Dictionary, FoamDocument, FoamHeader, Value, region_location};
use crate::core::error::BuildError;
use crate::core::types::{
    Boundary, BoundaryType, InterfaceMode, PressureField, Region, SolverCapability,
};

pub const DIMENSIONS: [i32; 7] = [1, -1, -2, 0, 0, 0, 0];

pub struct PressureBuilder<'a> {
    rules: BoundaryRuleResolver<'a>,
    region: &'a Region,
    field: PressureField,
    capability: SolverCapability,
    operating_pressure: f64,
    initial_value: f64,
}

impl<'a> PressureBuilder<'a> {
    pub fn new(
        db: &'a dyn ConfigDb,
        region: &'a Region,
        field: PressureField,
    ) -> Result<Self, BuildError> {
        let capability = require_capability(db)?;
        let initial_pressure = require_f64(db, &keys::initial_pressure(&region.name))?;
        let mut operating_pressure = require_f64(db, keys::OPERATING_PRESSURE)?;
        if field == PressureField::PRgh && capability.gauge_pressure_in_prgh {
            operating_pressure = 0.0;
        }

        Ok(Self {
            rules: BoundaryRuleResolver::new(db, field.object()),
            region,
            field,
            capability,
            operating_pressure,
            initial_value: initial_pressure + operating_pressure,
        })
    }

    /// Operating pressure added to user-entered values (zero in gauge mode).
    pub fn operating_pressure(&self) -> f64 {
        self.operating_pressure
    }

    fn boundary_entry(
        &self,
        boundary: &Boundary,
        aux: &dyn AuxSink,
    ) -> Result<Dictionary, BuildError> {
        let rules = &self.rules;
        let op = self.operating_pressure;
        let entry = match boundary.kind {
            BoundaryType::VelocityInlet
            | BoundaryType::FlowRateInlet
            | BoundaryType::AblInlet
            | BoundaryType::OpenChannelInlet
            | BoundaryType::OpenChannelOutlet
            | BoundaryType::Outflow
            | BoundaryType::SupersonicOutflow => zero_gradient(),
            BoundaryType::PressureInlet => {
                total_pressure(rules.pressure(boundary, "pressureInlet/pressure", op)?)
            }
            BoundaryType::PressureOutlet => {
                total_pressure(rules.pressure(boundary, "pressureOutlet/totalPressure", op)?)
            }
            BoundaryType::FreeStream => {
                freestream_pressure(rules.pressure(boundary, "freeStream/pressure", op)?)
            }
            BoundaryType::FarFieldRiemann => rules.far_field_riemann(boundary, op)?,
            BoundaryType::SubsonicInflow => rules.subsonic_inflow(boundary, op)?,
            BoundaryType::SubsonicOutflow => rules.subsonic_outflow(boundary, op)?,
            BoundaryType::SupersonicInflow => {
                fixed_value(rules.pressure(boundary, "supersonicInflow/staticPressure", op)?)
            }
            BoundaryType::Wall | BoundaryType::ThermoCoupledWall => flux_pressure(),
            BoundaryType::Symmetry => patch_type("symmetry"),
            BoundaryType::Interface => match rules.interface_mode(boundary)? {
                InterfaceMode::RegionInterface => flux_pressure(),
                _ => patch_type("cyclicAMI"),
            },
            BoundaryType::PorousJump => self.porous_baffle(boundary)?,
            BoundaryType::Fan => self.fan(boundary, aux)?,
            BoundaryType::Empty => patch_type("empty"),
            BoundaryType::Cyclic => patch_type("cyclic"),
            BoundaryType::Wedge => patch_type("wedge"),
        };
        Ok(entry)
    }

    fn porous_baffle(&self, boundary: &Boundary) -> Result<Dictionary, BuildError> {
        let rules = &self.rules;
        Ok(Dictionary::new()
            .with("type", "porousBafflePressure")
            .with("patchType", "cyclic")
            .with("D", rules.number(boundary, "porousJump/darcyCoefficient")?)
            .with("I", rules.number(boundary, "porousJump/inertialCoefficient")?)
            .with(
                "length",
                rules.number(boundary, "porousJump/porousMediaThickness")?,
            )
            .with("value", Value::uniform(self.initial_value)))
    }

    /// Exports the fan curve to `constant/UvsPressure<id>` before returning
    /// the jump condition that reads it.
    fn fan(&self, boundary: &Boundary, aux: &dyn AuxSink) -> Result<Dictionary, BuildError> {
        let db = self.rules.db();
        let key_path = self.rules.path(boundary, "fan/fanCurveFile");
        let key = require(db, &key_path)?;
        let table = db
            .user_table(&key)
            .ok_or_else(|| BuildError::MissingValue(format!("{key_path} -> table '{key}'")))?;

        let file_name = fan_curve_file_name(boundary.id);
        aux.write_constant_file(Path::new(&file_name), &table.to_csv())?;
        debug!(boundary = %boundary.name, file = %file_name, "exported fan curve");

        let coeffs = Dictionary::new()
            .with("nHeaderLine", 0)
            .with("refColumn", 0)
            .with("componentColumns", Value::List(vec![Value::Number(1.0)]))
            .with("separator", "\",\"")
            .with("mergeSeparators", "no")
            .with("file", format!("\"<constant>/{file_name}\""));

        Ok(Dictionary::new()
            .with("type", "fan")
            .with("patchType", "cyclic")
            .with("jumpTable", "csvFile")
            .with("jumpTableCoeffs", coeffs)
            .with("value", Value::uniform(self.initial_value)))
    }
}

impl DocumentBuilder for PressureBuilder<'_> {
    fn construct(&self, aux: &dyn AuxSink) -> Result<Option<FoamDocument>, BuildError> {
        let object = self.field.object();
        if self.field == PressureField::PRgh && !self.capability.use_prgh {
            debug!(region = %self.region.name, "solver does not use p_rgh, skipping");
            return Ok(None);
        }

        let derived = self.field == PressureField::P && self.capability.use_prgh;
        let mut boundary_field = Dictionary::new();
        for boundary in &self.region.boundaries {
            let entry = if derived {
                forced(self.rules.patch_kind(boundary)?, self.initial_value)
            } else {
                self.boundary_entry(boundary, aux)?
            };
            boundary_field.insert(boundary.name.clone(), entry);
        }

        let body = Dictionary::new()
            .with("dimensions", Value::Dimensions(DIMENSIONS))
            .with("internalField", Value::uniform(self.initial_value))
            .with("boundaryField", boundary_field);

        debug!(region = %self.region.name, field = object, derived, "built pressure field");
        Ok(Some(FoamDocument {
            header: FoamHeader::vol_scalar_field(region_location("0", &self.region.name), object),
            body,
        }))
    }
}

/// Deterministic auxiliary file name for a fan boundary.
pub fn fan_curve_file_name(boundary_id: u64) -> String {
    format!("UvsPressure{boundary_id}")
}

fn total_pressure(pressure: f64) -> Dictionary {
    Dictionary::new()
        .with("type", "totalPressure")
        .with("p0", Value::uniform(pressure))
}

fn freestream_pressure(pressure: f64) -> Dictionary {
    Dictionary::new()
        .with("type", "freestreamPressure")
        .with("freestreamValue", Value::uniform(pressure))
}

fn flux_pressure() -> Dictionary {
    patch_type("fixedFluxPressure")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::render_body;
    use crate::core::types::Phase;
    use crate::test_support::{ConfigBuilder, RecordingSink, all_types_region, boundary};

    fn region(boundaries: Vec<Boundary>) -> Region {
        Region {
            name: String::new(),
            phase: Phase::Fluid,
            boundaries,
        }
    }

    fn entry<'d>(document: &'d FoamDocument, name: &str) -> &'d Dictionary {
        document
            .body
            .dict("boundaryField")
            .and_then(|field| field.dict(name))
            .expect("boundary entry")
    }

    #[test]
    fn pressure_outlet_uses_total_pressure() {
        let db = ConfigBuilder::new()
            .value(keys::OPERATING_PRESSURE, "0")
            .value("boundaries/1/pressureOutlet/totalPressure", "101325")
            .build();
        let region = region(vec![boundary(1, "outlet", BoundaryType::PressureOutlet)]);
        let builder = PressureBuilder::new(&db, &region, PressureField::P).expect("builder");

        let document = builder
            .construct(&RecordingSink::default())
            .expect("construct")
            .expect("document");

        let expected = Dictionary::new()
            .with("type", "totalPressure")
            .with("p0", Value::uniform(101325.0));
        assert_eq!(entry(&document, "outlet"), &expected);
        assert_eq!(document.header.object, "p");
        assert_eq!(document.header.location, "0");
    }

    #[test]
    fn operating_pressure_offsets_inlet_and_internal_field() {
        let db = ConfigBuilder::new()
            .value(keys::OPERATING_PRESSURE, "100000")
            .value("initialization/initialValues/pressure", "25")
            .value("boundaries/1/pressureInlet/pressure", "500")
            .build();
        let region = region(vec![boundary(1, "inlet", BoundaryType::PressureInlet)]);
        let document = PressureBuilder::new(&db, &region, PressureField::P)
            .expect("builder")
            .construct(&RecordingSink::default())
            .expect("construct")
            .expect("document");

        assert_eq!(
            document.body.get("internalField"),
            Some(&Value::uniform(100025.0))
        );
        assert_eq!(
            entry(&document, "inlet").get("p0"),
            Some(&Value::uniform(100500.0))
        );
    }

    #[test]
    fn p_rgh_is_not_produced_without_solver_support() {
        let db = ConfigBuilder::new().build();
        let region = region(vec![boundary(1, "wall", BoundaryType::Wall)]);
        let builder = PressureBuilder::new(&db, &region, PressureField::PRgh).expect("builder");
        let document = builder.construct(&RecordingSink::default()).expect("construct");
        assert!(document.is_none());
    }

    #[test]
    fn p_rgh_gauge_mode_drops_operating_pressure() {
        let db = ConfigBuilder::new()
            .solver(SolverCapability {
                use_prgh: true,
                gauge_pressure_in_prgh: true,
            })
            .value(keys::OPERATING_PRESSURE, "101325")
            .value("boundaries/1/pressureOutlet/totalPressure", "50")
            .build();
        let region = region(vec![boundary(1, "outlet", BoundaryType::PressureOutlet)]);
        let builder = PressureBuilder::new(&db, &region, PressureField::PRgh).expect("builder");
        assert_eq!(builder.operating_pressure(), 0.0);

        let document = builder
            .construct(&RecordingSink::default())
            .expect("construct")
            .expect("document");
        assert_eq!(document.header.object, "p_rgh");
        assert_eq!(
            entry(&document, "outlet").get("p0"),
            Some(&Value::uniform(50.0))
        );
    }

    #[test]
    fn derived_p_forces_structural_entries() {
        let db = ConfigBuilder::new()
            .solver(SolverCapability {
                use_prgh: true,
                gauge_pressure_in_prgh: false,
            })
            .value(keys::OPERATING_PRESSURE, "100000")
            .value("boundaries/3/interface/mode", "regionInterface")
            .value("boundaries/4/interface/mode", "internalInterface")
            .build();
        let region = region(vec![
            boundary(1, "outlet", BoundaryType::PressureOutlet),
            boundary(2, "fan", BoundaryType::Fan),
            boundary(3, "to-solid", BoundaryType::Interface),
            boundary(4, "ami", BoundaryType::Interface),
        ]);
        let document = PressureBuilder::new(&db, &region, PressureField::P)
            .expect("builder")
            .construct(&RecordingSink::default())
            .expect("construct")
            .expect("document");

        let calculated = Dictionary::new()
            .with("type", "calculated")
            .with("value", Value::uniform(100000.0));
        assert_eq!(entry(&document, "outlet"), &calculated);
        assert_eq!(entry(&document, "to-solid"), &calculated);
        assert_eq!(entry(&document, "fan"), &patch_type("cyclic"));
        assert_eq!(entry(&document, "ami"), &patch_type("cyclicAMI"));
    }

    #[test]
    fn interface_mode_selects_condition() {
        let db = ConfigBuilder::new()
            .value("boundaries/1/interface/mode", "regionInterface")
            .value("boundaries/2/interface/mode", "rotationalPeriodic")
            .build();
        let region = region(vec![
            boundary(1, "cht", BoundaryType::Interface),
            boundary(2, "periodic", BoundaryType::Interface),
        ]);
        let document = PressureBuilder::new(&db, &region, PressureField::P)
            .expect("builder")
            .construct(&RecordingSink::default())
            .expect("construct")
            .expect("document");
        assert_eq!(entry(&document, "cht"), &patch_type("fixedFluxPressure"));
        assert_eq!(entry(&document, "periodic"), &patch_type("cyclicAMI"));
    }

    #[test]
    fn fan_exports_curve_under_deterministic_name() {
        let db = ConfigBuilder::new()
            .value(keys::OPERATING_PRESSURE, "0")
            .value("boundaries/7/fan/fanCurveFile", "curve-a")
            .table("curve-a", vec![vec![0.0, 300.0], vec![2.5, 120.0]])
            .build();
        let region = region(vec![boundary(7, "fan", BoundaryType::Fan)]);
        let builder = PressureBuilder::new(&db, &region, PressureField::P).expect("builder");
        let sink = RecordingSink::default();

        let first = builder.construct(&sink).expect("first").expect("document");
        let second = builder.construct(&sink).expect("second").expect("document");

        assert_eq!(first, second);
        let files = sink.files();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|(path, _)| path == Path::new("UvsPressure7")));
        assert_eq!(files[0].1, "0,300\n2.5,120\n");

        let text = render_body(&first.body);
        assert!(text.contains("file            \"<constant>/UvsPressure7\";"));
        assert!(text.contains("componentColumns 1(1);"));
        assert!(text.contains("separator       \",\";"));
    }

    fn build_p(db: &dyn ConfigDb, boundaries: Vec<Boundary>) -> FoamDocument {
        let region = region(boundaries);
        PressureBuilder::new(db, &region, PressureField::P)
            .expect("builder")
            .construct(&RecordingSink::default())
            .expect("construct")
            .expect("document")
    }

    #[test]
    fn porous_jump_becomes_porous_baffle() {
        let db = ConfigBuilder::new()
            .value(keys::OPERATING_PRESSURE, "100000")
            .value("initialization/initialValues/pressure", "10")
            .value("boundaries/4/porousJump/darcyCoefficient", "2000000")
            .value("boundaries/4/porousJump/inertialCoefficient", "35")
            .value("boundaries/4/porousJump/porousMediaThickness", "0.02")
            .build();
        let document = build_p(&db, vec![boundary(4, "screen", BoundaryType::PorousJump)]);

        let expected = Dictionary::new()
            .with("type", "porousBafflePressure")
            .with("patchType", "cyclic")
            .with("D", 2000000.0)
            .with("I", 35.0)
            .with("length", 0.02)
            .with("value", Value::uniform(100010.0));
        assert_eq!(entry(&document, "screen"), &expected);
    }

    #[test]
    fn free_stream_offsets_operating_pressure() {
        let db = ConfigBuilder::new()
            .value(keys::OPERATING_PRESSURE, "100000")
            .value("boundaries/5/freeStream/pressure", "-250")
            .build();
        let document = build_p(&db, vec![boundary(5, "far", BoundaryType::FreeStream)]);

        let expected = Dictionary::new()
            .with("type", "freestreamPressure")
            .with("freestreamValue", Value::uniform(99750.0));
        assert_eq!(entry(&document, "far"), &expected);
    }

    #[test]
    fn compressible_inflow_and_outflow_fragments() {
        let db = ConfigBuilder::new()
            .value(keys::OPERATING_PRESSURE, "100000")
            .value("boundaries/1/subsonicInflow/flowDirection", "0 1 0")
            .value("boundaries/1/subsonicInflow/totalPressure", "2000")
            .value("boundaries/1/subsonicInflow/totalTemperature", "310")
            .value("boundaries/2/subsonicOutflow/staticPressure", "-500")
            .value("boundaries/3/supersonicInflow/staticPressure", "1500")
            .build();
        let document = build_p(
            &db,
            vec![
                boundary(1, "in", BoundaryType::SubsonicInflow),
                boundary(2, "out", BoundaryType::SubsonicOutflow),
                boundary(3, "jet", BoundaryType::SupersonicInflow),
            ],
        );

        let inflow = Dictionary::new()
            .with("type", "subsonicInflow")
            .with("flowDir", Value::vector([0.0, 1.0, 0.0]))
            .with("p0", 102000.0)
            .with("T0", 310.0);
        let outflow = Dictionary::new()
            .with("type", "subsonicOutflow")
            .with("pExit", 99500.0);
        assert_eq!(entry(&document, "in"), &inflow);
        assert_eq!(entry(&document, "out"), &outflow);
        assert_eq!(entry(&document, "jet"), &fixed_value(101500.0));
    }

    #[test]
    fn non_finite_pressure_is_rejected() {
        let db = ConfigBuilder::new()
            .value(keys::OPERATING_PRESSURE, "0")
            .value("boundaries/1/pressureOutlet/totalPressure", "NaN")
            .build();
        let region = region(vec![boundary(1, "outlet", BoundaryType::PressureOutlet)]);
        let err = PressureBuilder::new(&db, &region, PressureField::P)
            .expect("builder")
            .construct(&RecordingSink::default())
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::InvalidValue { path, .. } if path == "boundaries/1/pressureOutlet/totalPressure"
        ));
    }

    #[test]
    fn fan_without_table_fails() {
        let db = ConfigBuilder::new()
            .value("boundaries/7/fan/fanCurveFile", "missing")
            .build();
        let region = region(vec![boundary(7, "fan", BoundaryType::Fan)]);
        let err = PressureBuilder::new(&db, &region, PressureField::P)
            .expect("builder")
            .construct(&RecordingSink::default())
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingValue(_)));
    }

    #[test]
    fn missing_solver_is_not_ready() {
        let db = ConfigBuilder::new().without_solver().build();
        let region = region(Vec::new());
        let err = PressureBuilder::new(&db, &region, PressureField::P)
            .err()
            .expect("error");
        assert!(matches!(err, BuildError::ConfigNotReady(_)));
    }

    #[test]
    fn every_boundary_type_gets_an_entry() {
        for capability in [
            SolverCapability::default(),
            SolverCapability {
                use_prgh: true,
                gauge_pressure_in_prgh: true,
            },
        ] {
            let (db, region) = all_types_region(ConfigBuilder::new().solver(capability), "");
            for field in [PressureField::P, PressureField::PRgh] {
                let Some(document) = PressureBuilder::new(&db, &region, field)
                    .expect("builder")
                    .construct(&RecordingSink::default())
                    .expect("construct")
                else {
                    assert_eq!(field, PressureField::PRgh);
                    assert!(!capability.use_prgh);
                    continue;
                };
                let boundary_field = document.body.dict("boundaryField").expect("field");
                assert_eq!(boundary_field.len(), BoundaryType::ALL.len());
                for (name, value) in boundary_field.iter() {
                    let dict = value.as_dict().expect("dict entry");
                    assert!(dict.contains_key("type"), "{name} has no type");
                }
            }
        }
    }
}
