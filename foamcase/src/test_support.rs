//! Test-only helpers: in-memory configuration, recording sinks and scratch
//! project directories.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::builder::AuxSink;
use crate::core::config_db::{Table, keys};
use crate::core::error::CaseError;
use crate::core::types::{Boundary, BoundaryType, Phase, Region, SolverCapability};
use crate::io::case_paths::POLY_MESH_FILES;
use crate::io::config_store::{ConfigSnapshot, RegionEntry};

/// Key of the fan curve table attached by [`all_types_region`].
pub const FAN_CURVE: &str = "fan-curve";

/// Builds a [`ConfigSnapshot`] with a complete set of numerical defaults and
/// a solver that does not use `p_rgh`.
pub struct ConfigBuilder {
    snapshot: ConfigSnapshot,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let mut snapshot = ConfigSnapshot::new();
        snapshot.set_solver(Some(SolverCapability::default()));

        let defaults = [
            (keys::OPERATING_PRESSURE, "101325"),
            ("initialization/initialValues/pressure", "0"),
            ("initialization/initialValues/temperature", "300"),
            (keys::FLOW_TYPE, "incompressible"),
            (keys::ENERGY_MODEL, "on"),
            (keys::COUPLING_SCHEME, "SIMPLE"),
            (keys::USE_MOMENTUM_PREDICTOR, "true"),
            (keys::MAX_ITERATIONS_PER_TIME_STEP, "3"),
            (keys::NUMBER_OF_CORRECTORS, "1"),
            (keys::MAX_COURANT_NUMBER, "1"),
            (keys::REFERENCE_PRESSURE_LOCATION, "0 0 0"),
            (keys::REFERENCE_PRESSURE, "0"),
        ];
        for (path, value) in defaults {
            snapshot.set(path, value);
        }
        for criterion in ["pressure", "momentum", "energy", "turbulence"] {
            snapshot.set(format!("{}/{criterion}/absolute", keys::CONVERGENCE), "0.001");
            snapshot.set(format!("{}/{criterion}/relative", keys::CONVERGENCE), "0.05");
        }
        for (factor, value) in [
            ("pressure", "0.3"),
            ("pressureFinal", "1"),
            ("density", "1"),
            ("densityFinal", "1"),
            ("momentum", "0.7"),
            ("momentumFinal", "1"),
            ("energy", "1"),
            ("energyFinal", "1"),
            ("turbulence", "0.7"),
            ("turbulenceFinal", "1"),
        ] {
            snapshot.set(format!("{}/{factor}", keys::UNDER_RELAXATION), value);
        }
        Self { snapshot }
    }

    pub fn value(mut self, path: &str, value: &str) -> Self {
        self.snapshot.set(path, value);
        self
    }

    pub fn solver(mut self, capability: SolverCapability) -> Self {
        self.snapshot.set_solver(Some(capability));
        self
    }

    pub fn without_solver(mut self) -> Self {
        self.snapshot.set_solver(None);
        self
    }

    /// Declare a region without boundaries.
    pub fn region(self, name: &str, phase: Phase) -> Self {
        self.region_with(name, phase, Vec::new())
    }

    pub fn region_with(mut self, name: &str, phase: Phase, boundaries: Vec<Boundary>) -> Self {
        self.snapshot.push_region(RegionEntry {
            name: name.to_string(),
            phase,
            boundaries,
        });
        self
    }

    pub fn table(mut self, key: &str, rows: Vec<Vec<f64>>) -> Self {
        self.snapshot.insert_table(key, Table::new(rows));
        self
    }

    pub fn build(self) -> ConfigSnapshot {
        self.snapshot
    }
}

pub fn boundary(id: u64, name: &str, kind: BoundaryType) -> Boundary {
    Boundary {
        id,
        name: name.to_string(),
        kind,
    }
}

/// A fluid region with one boundary of every type, named after the type,
/// plus every setting the pressure and temperature rules read.
pub fn all_types_region(builder: ConfigBuilder, rname: &str) -> (ConfigSnapshot, Region) {
    let boundaries: Vec<Boundary> = BoundaryType::ALL
        .iter()
        .zip(1u64..)
        .map(|(kind, id)| boundary(id, kind.as_str(), *kind))
        .collect();

    let mut builder = builder
        .region_with(rname, Phase::Fluid, boundaries.clone())
        .table(FAN_CURVE, vec![vec![0.0, 200.0], vec![1.0, 100.0]]);
    for b in &boundaries {
        let base = keys::boundary(b.id);
        for (relative, value) in [
            ("temperature/profile", "constant"),
            ("temperature/constant", "300"),
            ("flowRateInlet/flowRate/specification", "volumeFlowRate"),
            ("pressureInlet/pressure", "10"),
            ("pressureOutlet/totalPressure", "0"),
            ("pressureOutlet/calculatedBackflow", "false"),
            ("freeStream/pressure", "0"),
            ("farFieldRiemann/flowDirection", "1 0 0"),
            ("farFieldRiemann/machNumber", "0.5"),
            ("farFieldRiemann/staticPressure", "0"),
            ("farFieldRiemann/staticTemperature", "300"),
            ("subsonicInflow/flowDirection", "1 0 0"),
            ("subsonicInflow/totalPressure", "0"),
            ("subsonicInflow/totalTemperature", "300"),
            ("subsonicOutflow/staticPressure", "0"),
            ("supersonicInflow/staticPressure", "0"),
            ("interface/mode", "regionInterface"),
            ("porousJump/darcyCoefficient", "1e7"),
            ("porousJump/inertialCoefficient", "1000"),
            ("porousJump/porousMediaThickness", "0.01"),
            ("fan/fanCurveFile", FAN_CURVE),
        ] {
            builder = builder.value(&format!("{base}/{relative}"), value);
        }
    }

    let region = Region {
        name: rname.to_string(),
        phase: Phase::Fluid,
        boundaries,
    };
    (builder.build(), region)
}

/// [`AuxSink`] that records every write in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    files: RefCell<Vec<(PathBuf, String)>>,
}

impl RecordingSink {
    pub fn files(&self) -> Vec<(PathBuf, String)> {
        self.files.borrow().clone()
    }
}

impl AuxSink for RecordingSink {
    fn write_constant_file(&self, relative: &Path, contents: &str) -> Result<(), CaseError> {
        self.files
            .borrow_mut()
            .push((relative.to_path_buf(), contents.to_string()));
        Ok(())
    }
}

/// Write placeholder polyMesh files into `dir`.
pub fn write_poly_mesh(dir: &Path) {
    fs::create_dir_all(dir).expect("create polyMesh dir");
    for name in POLY_MESH_FILES {
        fs::write(dir.join(name), format!("{name}\n")).expect("write polyMesh file");
    }
}

/// Scratch project directory with helpers for mesh sources.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Single-region mesh source at `<project>/mesh-src/polyMesh`.
    pub fn single_region_mesh(&self) -> PathBuf {
        let dir = self.path().join("mesh-src").join("polyMesh");
        write_poly_mesh(&dir);
        dir
    }

    /// Multi-region mesh source with `regionProperties` and one polyMesh
    /// per region.
    pub fn multi_region_mesh(&self, regions: &[&str]) -> PathBuf {
        let dir = self.path().join("mesh-src-multi");
        for r in regions {
            write_poly_mesh(&dir.join(r).join("polyMesh"));
        }
        fs::write(dir.join("regionProperties"), "regions ();\n").expect("regionProperties");
        dir
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}
