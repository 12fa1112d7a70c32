//! Generator settings stored in `foamcase.toml` next to the project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::io::writer::write_atomic;

/// Case directory naming and pruning policy (TOML).
///
/// Missing fields fall back to the standard layout: a `temp/` working case
/// that is committed to `case/` on save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Working case created by `setup_new_case`.
    pub temp_dir_name: String,

    /// Committed case inside the project directory.
    pub case_dir_name: String,

    /// Zero-byte marker file written at the case root for post-processors.
    pub foam_file_name: String,

    /// `system/` entries that survive `initialize`.
    pub retained_system_files: Vec<String>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            temp_dir_name: "temp".to_string(),
            case_dir_name: "case".to_string(),
            foam_file_name: "case.foam".to_string(),
            retained_system_files: vec!["controlDict".to_string()],
        }
    }
}

impl GeneratorSettings {
    pub fn validate(&self) -> Result<()> {
        for (key, name) in [
            ("temp_dir_name", &self.temp_dir_name),
            ("case_dir_name", &self.case_dir_name),
            ("foam_file_name", &self.foam_file_name),
        ] {
            if !is_plain_name(name) {
                return Err(anyhow!("{key} must be a single path component, got '{name}'"));
            }
        }
        if self.temp_dir_name == self.case_dir_name {
            return Err(anyhow!("temp_dir_name and case_dir_name must differ"));
        }
        if let Some(bad) = self
            .retained_system_files
            .iter()
            .find(|name| !is_plain_name(name))
        {
            return Err(anyhow!(
                "retained_system_files entries must be file names, got '{bad}'"
            ));
        }
        Ok(())
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

/// Load settings from a TOML file.
///
/// If the file is missing, returns `GeneratorSettings::default()`.
pub fn load_settings(path: &Path) -> Result<GeneratorSettings> {
    if !path.exists() {
        let settings = GeneratorSettings::default();
        settings.validate()?;
        return Ok(settings);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let settings: GeneratorSettings =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    settings.validate()?;
    Ok(settings)
}

/// Atomically write settings to disk (temp file + rename).
pub fn write_settings(path: &Path, settings: &GeneratorSettings) -> Result<()> {
    settings.validate()?;
    let mut buf = toml::to_string_pretty(settings).context("serialize settings toml")?;
    buf.push('\n');
    write_atomic(path, &buf).with_context(|| format!("write settings {}", path.display()))?;
    Ok(())
}
