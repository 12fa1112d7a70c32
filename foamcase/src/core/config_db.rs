//! Read-only view of the configuration database.
//!
//! The database is path addressed (`general/operatingConditions/pressure`,
//! `boundaries/3/pressureOutlet/totalPressure`) and returns stored strings.
//! The `require_*` helpers convert them and map absence or malformed
//! content onto [`BuildError`] variants.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::BuildError;
use crate::core::types::{Boundary, Phase, Region, SolverCapability, UnknownVariant};

/// Query surface consumed by document builders.
pub trait ConfigDb {
    /// Stored value at `path`, if any.
    fn value(&self, path: &str) -> Option<String>;

    /// Region names in declaration order. Empty for an unconfigured case.
    fn region_names(&self) -> Vec<String>;

    fn region_phase(&self, rname: &str) -> Option<Phase>;

    /// `(id, name, type)` triples for a region, in declaration order.
    fn boundaries(&self, rname: &str) -> Vec<Boundary>;

    /// Capability flags of the active solver; `None` until a solver can be chosen.
    fn solver_capability(&self) -> Option<SolverCapability>;

    /// User-attached tabular data referenced by key (e.g. a fan curve).
    fn user_table(&self, key: &str) -> Option<Table>;
}

/// Numeric table attached by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    pub rows: Vec<Vec<f64>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    /// Comma-separated rows without header or index.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(f64::to_string).collect();
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        out
    }
}

/// Stored key paths.
pub mod keys {
    pub const OPERATING_PRESSURE: &str = "general/operatingConditions/pressure";
    /// `compressible` or `incompressible`.
    pub const FLOW_TYPE: &str = "general/flowType";
    /// `on` or `off`.
    pub const ENERGY_MODEL: &str = "models/energyModels";

    pub const COUPLING_SCHEME: &str = "numericalConditions/pressureVelocityCouplingScheme";
    pub const USE_MOMENTUM_PREDICTOR: &str = "numericalConditions/useMomentumPredictor";
    pub const MAX_ITERATIONS_PER_TIME_STEP: &str = "numericalConditions/maxIterationsPerTimeStep";
    pub const NUMBER_OF_CORRECTORS: &str = "numericalConditions/numberOfCorrectors";
    pub const UNDER_RELAXATION: &str = "numericalConditions/underRelaxationFactors";
    pub const CONVERGENCE: &str = "numericalConditions/convergenceCriteria";
    pub const MAX_COURANT_NUMBER: &str = "runConditions/maxCourantNumber";

    pub const REFERENCE_PRESSURE_LOCATION: &str = "referenceValues/referencePressureLocation";
    pub const REFERENCE_PRESSURE: &str = "referenceValues/pressure";

    /// Per-boundary settings root.
    pub fn boundary(id: u64) -> String {
        format!("boundaries/{id}")
    }

    /// Region-scoped path: unchanged for the single unnamed region,
    /// `regions/<name>/<path>` otherwise.
    pub fn region_scoped(rname: &str, path: &str) -> String {
        if rname.is_empty() {
            path.to_string()
        } else {
            format!("regions/{rname}/{path}")
        }
    }

    pub fn initial_pressure(rname: &str) -> String {
        region_scoped(rname, "initialization/initialValues/pressure")
    }

    pub fn initial_temperature(rname: &str) -> String {
        region_scoped(rname, "initialization/initialValues/temperature")
    }
}

pub fn require(db: &dyn ConfigDb, path: &str) -> Result<String, BuildError> {
    db.value(path)
        .ok_or_else(|| BuildError::MissingValue(path.to_string()))
}

pub fn require_f64(db: &dyn ConfigDb, path: &str) -> Result<f64, BuildError> {
    let raw = require(db, path)?;
    parse_f64(path, &raw)
}

/// Three whitespace-separated components.
pub fn require_vector(db: &dyn ConfigDb, path: &str) -> Result<[f64; 3], BuildError> {
    let values = require_list(db, path)?;
    <[f64; 3]>::try_from(values).map_err(|_| BuildError::InvalidValue {
        path: path.to_string(),
        value: db.value(path).unwrap_or_default(),
    })
}

/// Whitespace-separated numbers.
pub fn require_list(db: &dyn ConfigDb, path: &str) -> Result<Vec<f64>, BuildError> {
    let raw = require(db, path)?;
    raw.split_whitespace()
        .map(|token| parse_f64(path, token))
        .collect()
}

/// `true` / `false`.
pub fn require_bool(db: &dyn ConfigDb, path: &str) -> Result<bool, BuildError> {
    let raw = require(db, path)?;
    match raw.as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(BuildError::InvalidValue {
            path: path.to_string(),
            value: raw,
        }),
    }
}

/// Parse an enumerated setting; unknown values have no rule.
pub fn require_choice<T>(
    db: &dyn ConfigDb,
    path: &str,
    field: &str,
    boundary: &str,
) -> Result<T, BuildError>
where
    T: FromStr<Err = UnknownVariant>,
{
    let raw = require(db, path)?;
    raw.parse().map_err(|UnknownVariant(value)| BuildError::UnresolvedRule {
        field: field.to_string(),
        boundary: boundary.to_string(),
        value,
    })
}

/// Finite numbers only; `NaN` and `inf` parse as `f64` but no solver reads them.
fn parse_f64(path: &str, raw: &str) -> Result<f64, BuildError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| BuildError::InvalidValue {
            path: path.to_string(),
            value: raw.to_string(),
        })
}

/// Region names to build. An unconfigured database yields the single unnamed region.
pub fn region_names(db: &dyn ConfigDb) -> Vec<String> {
    let names = db.region_names();
    if names.is_empty() {
        vec![String::new()]
    } else {
        names
    }
}

/// True when regions are written into per-region subdirectories.
pub fn is_multi_region(names: &[String]) -> bool {
    !(names.len() == 1 && names[0].is_empty())
}

/// Snapshot a region (phase + boundary list) for one build.
pub fn load_region(db: &dyn ConfigDb, rname: &str) -> Result<Region, BuildError> {
    let phase = db.region_phase(rname).ok_or_else(|| {
        BuildError::ConfigNotReady(format!("phase of region '{rname}' is not set"))
    })?;
    Ok(Region {
        name: rname.to_string(),
        phase,
        boundaries: db.boundaries(rname),
    })
}

/// Active solver capability, or `ConfigNotReady`.
pub fn require_capability(db: &dyn ConfigDb) -> Result<SolverCapability, BuildError> {
    db.solver_capability().ok_or_else(|| {
        BuildError::ConfigNotReady("no solver matches the current configuration".to_string())
    })
}
