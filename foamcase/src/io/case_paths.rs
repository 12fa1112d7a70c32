//! Resolved paths inside a case directory.

use std::path::{Path, PathBuf};

pub use crate::core::fields::temperature::BOUNDARY_DATA_DIR;
use crate::io::settings::GeneratorSettings;

pub const CONSTANT_DIR: &str = "constant";
pub const BOUNDARY_CONDITIONS_DIR: &str = "0";
pub const SYSTEM_DIR: &str = "system";
pub const POLY_MESH_DIR: &str = "polyMesh";
pub const REGION_PROPERTIES: &str = "regionProperties";

/// Files every polyMesh directory must contain.
pub const POLY_MESH_FILES: [&str; 5] = ["boundary", "faces", "neighbour", "owner", "points"];

/// Top-level layout of one case directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasePaths {
    pub root: PathBuf,
    pub constant: PathBuf,
    pub boundary_conditions: PathBuf,
    pub system: PathBuf,
    pub foam_file: PathBuf,
}

impl CasePaths {
    pub fn new(root: &Path, settings: &GeneratorSettings) -> Self {
        Self {
            root: root.to_path_buf(),
            constant: root.join(CONSTANT_DIR),
            boundary_conditions: root.join(BOUNDARY_CONDITIONS_DIR),
            system: root.join(SYSTEM_DIR),
            foam_file: root.join(&settings.foam_file_name),
        }
    }

    /// `constant/[<r>]`
    pub fn constant_dir(&self, rname: &str) -> PathBuf {
        in_region(&self.constant, rname)
    }

    /// `0/[<r>]`
    pub fn boundary_conditions_dir(&self, rname: &str) -> PathBuf {
        in_region(&self.boundary_conditions, rname)
    }

    /// `system/[<r>]`
    pub fn system_dir(&self, rname: &str) -> PathBuf {
        in_region(&self.system, rname)
    }

    pub fn poly_mesh_dir(&self, rname: &str) -> PathBuf {
        self.constant_dir(rname).join(POLY_MESH_DIR)
    }

    pub fn boundary_file(&self, rname: &str) -> PathBuf {
        self.poly_mesh_dir(rname).join("boundary")
    }

    pub fn cell_zones_file(&self, rname: &str) -> PathBuf {
        self.poly_mesh_dir(rname).join("cellZones")
    }

    pub fn boundary_data_dir(&self, rname: &str) -> PathBuf {
        self.constant_dir(rname).join(BOUNDARY_DATA_DIR)
    }

    /// Directories created for a region by `init_region_dirs`.
    pub fn region_dirs(&self, rname: &str) -> [PathBuf; 3] {
        [
            self.constant_dir(rname),
            self.boundary_conditions_dir(rname),
            self.system_dir(rname),
        ]
    }
}

fn in_region(base: &Path, rname: &str) -> PathBuf {
    if rname.is_empty() {
        base.to_path_buf()
    } else {
        base.join(rname)
    }
}
