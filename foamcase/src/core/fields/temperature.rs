//! Temperature field file (`T`).

use std::fmt::Write as _;
use std::path::PathBuf;

use tracing::debug;

use crate::core::boundary_rules::{
    BoundaryRuleResolver, coupled_temperature_baffle, fixed_value, patch_type, zero_gradient,
};
use crate::core::builder::{AuxSink, DocumentBuilder};
use crate::core::config_db::{
    ConfigDb, Table, keys, require, require_bool, require_capability, require_f64, require_list,
};
use crate::core::dictionary::{Dictionary, FoamDocument, FoamHeader, Value, region_location};
use crate::core::error::BuildError;
use crate::core::render::format_number;
use crate::core::types::{
    Boundary, BoundaryType, FlowRateSpecification, InterfaceMode, Region, TemperatureProfile,
    TemporalDistribution,
};

pub const DIMENSIONS: [i32; 7] = [0, 0, 0, 1, 0, 0, 0];

const FIELD: &str = "T";

/// Directory under `constant/[<r>/]` holding mapped boundary data.
pub const BOUNDARY_DATA_DIR: &str = "boundaryData";

pub struct TemperatureBuilder<'a> {
    rules: BoundaryRuleResolver<'a>,
    region: &'a Region,
    initial_value: f64,
}

impl<'a> TemperatureBuilder<'a> {
    pub fn new(db: &'a dyn ConfigDb, region: &'a Region) -> Result<Self, BuildError> {
        require_capability(db)?;
        let initial_value = require_f64(db, &keys::initial_temperature(&region.name))?;
        Ok(Self {
            rules: BoundaryRuleResolver::new(db, FIELD),
            region,
            initial_value,
        })
    }

    /// Entry for one boundary; `None` when the boundary gets no `T` entry.
    fn boundary_entry(
        &self,
        boundary: &Boundary,
        aux: &dyn AuxSink,
    ) -> Result<Option<Dictionary>, BuildError> {
        let profile: TemperatureProfile = self.rules.choice(boundary, "temperature/profile")?;
        match profile {
            TemperatureProfile::Constant => self.constant(boundary),
            TemperatureProfile::SpatialDistribution => {
                self.mapped_distribution(boundary, aux).map(Some)
            }
            TemperatureProfile::TemporalDistribution => {
                self.temporal_distribution(boundary).map(Some)
            }
        }
    }

    fn constant(&self, boundary: &Boundary) -> Result<Option<Dictionary>, BuildError> {
        let rules = &self.rules;
        let value = rules.number(boundary, "temperature/constant")?;
        let entry = match boundary.kind {
            BoundaryType::VelocityInlet | BoundaryType::SupersonicInflow => fixed_value(value),
            BoundaryType::FlowRateInlet => {
                match rules.choice(boundary, "flowRateInlet/flowRate/specification")? {
                    FlowRateSpecification::VolumeFlowRate => fixed_value(value),
                    FlowRateSpecification::MassFlowRate => total_temperature(value),
                }
            }
            BoundaryType::PressureInlet => total_temperature(value),
            BoundaryType::PressureOutlet => {
                let path = rules.path(boundary, "pressureOutlet/calculatedBackflow");
                if require_bool(rules.db(), &path)? {
                    total_temperature(value)
                } else {
                    zero_gradient()
                }
            }
            // Isothermal free-surface and atmospheric inlets carry no T entry.
            BoundaryType::AblInlet
            | BoundaryType::OpenChannelInlet
            | BoundaryType::OpenChannelOutlet => return Ok(None),
            BoundaryType::Outflow | BoundaryType::SupersonicOutflow | BoundaryType::Wall => {
                zero_gradient()
            }
            BoundaryType::FreeStream => Dictionary::new()
                .with("type", "freestream")
                .with("freestreamValue", Value::uniform(value)),
            BoundaryType::FarFieldRiemann => {
                rules.far_field_riemann(boundary, self.operating_pressure()?)?
            }
            BoundaryType::SubsonicInflow => {
                rules.subsonic_inflow(boundary, self.operating_pressure()?)?
            }
            BoundaryType::SubsonicOutflow => {
                rules.subsonic_outflow(boundary, self.operating_pressure()?)?
            }
            BoundaryType::ThermoCoupledWall => coupled_temperature_baffle(self.region.phase),
            BoundaryType::Interface => match rules.interface_mode(boundary)? {
                InterfaceMode::RegionInterface => coupled_temperature_baffle(self.region.phase),
                _ => patch_type("cyclicAMI"),
            },
            BoundaryType::PorousJump | BoundaryType::Fan | BoundaryType::Cyclic => {
                patch_type("cyclic")
            }
            BoundaryType::Symmetry => patch_type("symmetry"),
            BoundaryType::Empty => patch_type("empty"),
            BoundaryType::Wedge => patch_type("wedge"),
        };
        Ok(Some(entry))
    }

    fn operating_pressure(&self) -> Result<f64, BuildError> {
        require_f64(self.rules.db(), keys::OPERATING_PRESSURE)
    }

    /// Exports the attached `x y z T` table into `boundaryData/<patch>/`
    /// and maps it onto the patch.
    fn mapped_distribution(
        &self,
        boundary: &Boundary,
        aux: &dyn AuxSink,
    ) -> Result<Dictionary, BuildError> {
        let db = self.rules.db();
        let key_path = self.rules.path(boundary, "temperature/spatialDistribution");
        let key = require(db, &key_path)?;
        let table = db
            .user_table(&key)
            .ok_or_else(|| BuildError::MissingValue(format!("{key_path} -> table '{key}'")))?;
        let (points, values) = boundary_data(&table).ok_or_else(|| BuildError::InvalidValue {
            path: key_path.clone(),
            value: key.clone(),
        })?;

        let dir = boundary_data_dir(&self.region.name, &boundary.name);
        aux.write_constant_file(&dir.join("points"), &points)?;
        aux.write_constant_file(&dir.join("0").join(FIELD), &values)?;
        debug!(boundary = %boundary.name, dir = %dir.display(), "exported boundary data");

        Ok(Dictionary::new()
            .with("type", "timeVaryingMappedFixedValue")
            .with("offset", 0)
            .with("setAverage", "false"))
    }

    fn temporal_distribution(&self, boundary: &Boundary) -> Result<Dictionary, BuildError> {
        let db = self.rules.db();
        let base = "temperature/temporalDistribution";
        let spec: TemporalDistribution =
            self.rules.choice(boundary, &format!("{base}/specification"))?;
        let uniform_value = match spec {
            TemporalDistribution::PiecewiseLinear => {
                let times_path = self.rules.path(boundary, &format!("{base}/piecewiseLinear/t"));
                let values_path = self.rules.path(boundary, &format!("{base}/piecewiseLinear/v"));
                let times = require_list(db, &times_path)?;
                let values = require_list(db, &values_path)?;
                if times.len() != values.len() {
                    return Err(BuildError::InvalidValue {
                        path: values_path,
                        value: format!("{} values for {} times", values.len(), times.len()),
                    });
                }
                let rows = times.into_iter().zip(values).map(|(t, v)| pair(t, v));
                Value::tagged("table", Value::Tuple(rows.collect()))
            }
            TemporalDistribution::Polynomial => {
                let path = self.rules.path(boundary, &format!("{base}/polynomial"));
                let terms = require_list(db, &path)?
                    .into_iter()
                    .enumerate()
                    .map(|(power, coefficient)| pair(coefficient, power as f64));
                Value::tagged("polynomial", Value::Tuple(terms.collect()))
            }
        };
        Ok(Dictionary::new()
            .with("type", "uniformFixedValue")
            .with("uniformValue", uniform_value))
    }
}

impl DocumentBuilder for TemperatureBuilder<'_> {
    fn construct(&self, aux: &dyn AuxSink) -> Result<Option<FoamDocument>, BuildError> {
        let mut boundary_field = Dictionary::new();
        for boundary in &self.region.boundaries {
            if let Some(entry) = self.boundary_entry(boundary, aux)? {
                boundary_field.insert(boundary.name.clone(), entry);
            }
        }

        let body = Dictionary::new()
            .with("dimensions", Value::Dimensions(DIMENSIONS))
            .with("internalField", Value::uniform(self.initial_value))
            .with("boundaryField", boundary_field);

        debug!(region = %self.region.name, "built temperature field");
        Ok(Some(FoamDocument {
            header: FoamHeader::vol_scalar_field(region_location("0", &self.region.name), FIELD),
            body,
        }))
    }
}

/// `[<r>/]boundaryData/<patch>` relative to the top-level `constant/`.
pub fn boundary_data_dir(rname: &str, patch: &str) -> PathBuf {
    let mut dir = PathBuf::new();
    if !rname.is_empty() {
        dir.push(rname);
    }
    dir.push(BOUNDARY_DATA_DIR);
    dir.push(patch);
    dir
}

/// `inletOutletTotalTemperature` with `T0` and `inletValue` at `value`.
fn total_temperature(value: f64) -> Dictionary {
    Dictionary::new()
        .with("type", "inletOutletTotalTemperature")
        .with("gamma", "gamma")
        .with("inletValue", Value::uniform(value))
        .with("T0", Value::uniform(value))
}

fn pair(a: f64, b: f64) -> Value {
    Value::Tuple(vec![Value::Number(a), Value::Number(b)])
}

/// Split `x y z T` rows into the `points` and `0/T` list files.
fn boundary_data(table: &Table) -> Option<(String, String)> {
    let mut points = format!("{}\n(\n", table.rows.len());
    let mut values = points.clone();
    for row in &table.rows {
        let [x, y, z, t] = <[f64; 4]>::try_from(row.as_slice()).ok()?;
        let _ = writeln!(
            points,
            "({} {} {})",
            format_number(x),
            format_number(y),
            format_number(z)
        );
        let _ = writeln!(values, "{}", format_number(t));
    }
    points.push_str(")\n");
    values.push_str(")\n");
    Some((points, values))
}
