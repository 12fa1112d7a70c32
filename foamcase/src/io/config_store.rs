//! In-memory configuration snapshot, loadable from TOML.
//!
//! ```toml
//! [solver]
//! use_prgh = true
//!
//! [values.general.operatingConditions]
//! pressure = 101325
//!
//! [values."boundaries/3/pressureOutlet"]
//! totalPressure = 0
//!
//! [[regions]]
//! name = ""
//! phase = "fluid"
//! boundaries = [{ id = 3, name = "outlet", type = "pressureOutlet" }]
//!
//! [tables]
//! fan-curve = [[0.0, 300.0], [2.5, 120.0]]
//! ```
//!
//! Nested `values` tables flatten into `/`-separated paths. Arrays become
//! whitespace-separated strings, which is how vectors and lists are stored.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::config_db::{ConfigDb, Table};
use crate::core::types::{Boundary, Phase, SolverCapability};

/// One region with its boundary list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionEntry {
    #[serde(default)]
    pub name: String,
    pub phase: Phase,
    #[serde(default)]
    pub boundaries: Vec<Boundary>,
}

/// Frozen view of the configuration database for one generation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSnapshot {
    values: BTreeMap<String, String>,
    solver: Option<SolverCapability>,
    regions: Vec<RegionEntry>,
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SnapshotFile {
    values: toml::Table,
    solver: Option<SolverCapability>,
    regions: Vec<RegionEntry>,
    tables: BTreeMap<String, Table>,
}

impl ConfigSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: impl Into<String>, value: impl Into<String>) {
        self.values.insert(path.into(), value.into());
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.values.remove(path)
    }

    pub fn set_solver(&mut self, capability: Option<SolverCapability>) {
        self.solver = capability;
    }

    /// Add a region, replacing an earlier one with the same name in place.
    pub fn push_region(&mut self, region: RegionEntry) {
        match self.regions.iter_mut().find(|r| r.name == region.name) {
            Some(existing) => *existing = region,
            None => self.regions.push(region),
        }
    }

    pub fn insert_table(&mut self, key: impl Into<String>, table: Table) {
        self.tables.insert(key.into(), table);
    }

    pub fn regions(&self) -> &[RegionEntry] {
        &self.regions
    }

    fn region(&self, rname: &str) -> Option<&RegionEntry> {
        self.regions.iter().find(|r| r.name == rname)
    }

    /// Parse a snapshot from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: SnapshotFile = toml::from_str(contents)?;
        let mut values = BTreeMap::new();
        flatten_into(&mut values, "", &file.values)?;

        let mut snapshot = Self {
            values,
            solver: file.solver,
            regions: Vec::new(),
            tables: file.tables,
        };
        for region in file.regions {
            if snapshot.region(&region.name).is_some() {
                return Err(anyhow!("region '{}' is declared twice", region.name));
            }
            snapshot.regions.push(region);
        }
        Ok(snapshot)
    }
}

impl ConfigDb for ConfigSnapshot {
    fn value(&self, path: &str) -> Option<String> {
        self.values.get(path).cloned()
    }

    fn region_names(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.name.clone()).collect()
    }

    fn region_phase(&self, rname: &str) -> Option<Phase> {
        self.region(rname).map(|r| r.phase)
    }

    fn boundaries(&self, rname: &str) -> Vec<Boundary> {
        self.region(rname)
            .map(|r| r.boundaries.clone())
            .unwrap_or_default()
    }

    fn solver_capability(&self) -> Option<SolverCapability> {
        self.solver
    }

    fn user_table(&self, key: &str) -> Option<Table> {
        self.tables.get(key).cloned()
    }
}

/// Load a snapshot file. Unlike settings, a missing file is an error.
pub fn load_snapshot(path: &Path) -> Result<ConfigSnapshot> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    ConfigSnapshot::from_toml(&contents).with_context(|| format!("parse {}", path.display()))
}

fn flatten_into(out: &mut BTreeMap<String, String>, prefix: &str, table: &toml::Table) -> Result<()> {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}/{key}")
        };
        match value {
            toml::Value::Table(nested) => flatten_into(out, &path, nested)?,
            leaf => {
                let text = leaf_text(leaf).with_context(|| format!("value at {path}"))?;
                out.insert(path, text);
            }
        }
    }
    Ok(())
}

fn leaf_text(value: &toml::Value) -> Result<String> {
    Ok(match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Array(items) => items
            .iter()
            .map(leaf_text)
            .collect::<Result<Vec<_>>>()?
            .join(" "),
        toml::Value::Datetime(_) | toml::Value::Table(_) => {
            return Err(anyhow!("unsupported value type {}", value.type_str()));
        }
    })
}
