//! Case generation: set up a working case, import the mesh, build and write
//! every document, optionally commit.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::core::builder::DocumentBuilder;
use crate::core::config_db::{ConfigDb, is_multi_region, load_region, region_names};
use crate::core::fields::{PressureBuilder, TemperatureBuilder};
use crate::core::fv_solution::FvSolutionBuilder;
use crate::core::types::{Phase, PressureField};
use crate::io::case_fs::{CaseFileSystem, SaveOutcome};

/// Report of one generation run (printed with `--json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateSummary {
    pub case_root: PathBuf,
    pub regions: Vec<String>,
    /// Case-relative paths of written documents, in write order.
    pub written: Vec<PathBuf>,
    /// `<location>/<object>` of documents the configuration does not call for.
    pub skipped: Vec<String>,
    pub saved: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Mesh to import: a polyMesh directory, or a directory holding
    /// `regionProperties` and one `<region>/polyMesh` per region.
    pub mesh: Option<PathBuf>,
    /// Move the working case into the project case afterwards.
    pub save: bool,
}

#[instrument(skip_all, fields(save = options.save))]
pub async fn generate_case(
    db: &dyn ConfigDb,
    case: &mut CaseFileSystem,
    options: &GenerateOptions,
) -> Result<GenerateSummary> {
    let names = region_names(db);
    let multi_region = is_multi_region(&names);

    let root = case
        .setup_new_case()
        .await
        .context("set up working case")?
        .root
        .clone();
    if multi_region {
        for rname in &names {
            case.init_region_dirs(rname)
                .with_context(|| format!("create directories for region '{rname}'"))?;
        }
    }
    if let Some(mesh) = &options.mesh {
        let mesh_regions: Vec<String> = if multi_region { names.clone() } else { Vec::new() };
        case.copy_mesh_from(mesh, &mesh_regions)
            .await
            .with_context(|| format!("import mesh from {}", mesh.display()))?;
    }

    let mut summary = GenerateSummary {
        case_root: root.clone(),
        regions: names.clone(),
        ..GenerateSummary::default()
    };

    if multi_region {
        let global = FvSolutionBuilder::global(db).context("global fvSolution")?;
        emit(case, &root, &global, "system/fvSolution", &mut summary)?;
    }

    for rname in &names {
        let region = load_region(db, rname)?;
        let label = |dir: &str, object: &str| {
            if rname.is_empty() {
                format!("{dir}/{object}")
            } else {
                format!("{dir}/{rname}/{object}")
            }
        };

        // Solid regions carry no pressure field.
        let pressure_fields: &[PressureField] = match region.phase {
            Phase::Fluid => &[PressureField::P, PressureField::PRgh],
            Phase::Solid => &[],
        };
        for &field in pressure_fields {
            let builder = PressureBuilder::new(db, &region, field)
                .with_context(|| format!("prepare {}", label("0", field.object())))?;
            emit(case, &root, &builder, &label("0", field.object()), &mut summary)?;
        }

        let temperature = TemperatureBuilder::new(db, &region)
            .with_context(|| format!("prepare {}", label("0", "T")))?;
        emit(case, &root, &temperature, &label("0", "T"), &mut summary)?;

        let fv_solution = FvSolutionBuilder::region(db, &region, multi_region)
            .with_context(|| format!("prepare {}", label("system", "fvSolution")))?;
        emit(
            case,
            &root,
            &fv_solution,
            &label("system", "fvSolution"),
            &mut summary,
        )?;
    }

    if options.save {
        let outcome = case.save().await.context("save case")?;
        summary.saved = outcome == SaveOutcome::Moved;
        summary.case_root = case.case_root()?;
    }

    info!(
        written = summary.written.len(),
        skipped = summary.skipped.len(),
        "case generated"
    );
    Ok(summary)
}

fn emit(
    case: &CaseFileSystem,
    root: &Path,
    builder: &dyn DocumentBuilder,
    label: &str,
    summary: &mut GenerateSummary,
) -> Result<()> {
    let Some(document) = builder
        .construct(case)
        .with_context(|| format!("build {label}"))?
    else {
        debug!(document = label, "not produced for this configuration");
        summary.skipped.push(label.to_string());
        return Ok(());
    };
    let path = case
        .write_document(&document)
        .with_context(|| format!("write {label}"))?;
    let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
    summary.written.push(relative);
    Ok(())
}
