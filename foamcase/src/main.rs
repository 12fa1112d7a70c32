//! `foamcase` CLI.
//!
//! Generates case directories from a configuration snapshot and runs the
//! case lifecycle operations (initialize, save-as, mesh checks).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use foamcase::core::config_db::region_names;
use foamcase::core::error::{BuildError, CaseError};
use foamcase::exit_codes;
use foamcase::generate::{GenerateOptions, generate_case};
use foamcase::io::case_fs::CaseFileSystem;
use foamcase::io::config_store::load_snapshot;
use foamcase::io::settings::{GeneratorSettings, load_settings};
use foamcase::logging;

const SETTINGS_FILE: &str = "foamcase.toml";

#[derive(Parser)]
#[command(
    name = "foamcase",
    version,
    about = "Compile a simulation configuration into an OpenFOAM case directory"
)]
struct Cli {
    /// Project directory holding the case and `foamcase.toml`.
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    /// Settings file (defaults to `<project>/foamcase.toml`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a fresh working case from a configuration snapshot.
    Generate {
        /// Configuration snapshot (TOML).
        #[arg(long)]
        config: PathBuf,
        /// Mesh to import (polyMesh directory or multi-region mesh root).
        #[arg(long)]
        mesh: Option<PathBuf>,
        /// Commit the working case into the project case.
        #[arg(long)]
        save: bool,
        /// Print a JSON summary to stdout.
        #[arg(long)]
        json: bool,
    },
    /// Reset the project case: latest time becomes `0/`, results are removed.
    Initialize {
        /// Configuration snapshot used for the region list (defaults to the
        /// regions meshed under `constant/`).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Copy the project case into another project directory.
    SaveAs {
        /// Destination project directory.
        destination: PathBuf,
    },
    /// Check that a directory holds the five polyMesh files.
    CheckMesh { dir: PathBuf },
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_code_for(&err));
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| cli.project.join(SETTINGS_FILE));
    let settings = load_settings(&settings_path)?;

    match cli.command {
        Command::Generate {
            config,
            mesh,
            save,
            json,
        } => cmd_generate(&cli.project, settings, &config, mesh, save, json).await,
        Command::Initialize { config } => cmd_initialize(&cli.project, settings, config.as_deref()),
        Command::SaveAs { destination } => cmd_save_as(&cli.project, settings, &destination).await,
        Command::CheckMesh { dir } => Ok(cmd_check_mesh(&dir)),
    }
}

async fn cmd_generate(
    project: &Path,
    settings: GeneratorSettings,
    config: &Path,
    mesh: Option<PathBuf>,
    save: bool,
    json: bool,
) -> Result<i32> {
    let db = load_snapshot(config)?;
    let mut case = CaseFileSystem::new(project, settings);
    let summary = generate_case(&db, &mut case, &GenerateOptions { mesh, save }).await?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("serialize summary")?
        );
    } else {
        println!("{}", summary.case_root.display());
    }
    Ok(exit_codes::OK)
}

fn cmd_initialize(
    project: &Path,
    settings: GeneratorSettings,
    config: Option<&Path>,
) -> Result<i32> {
    let mut case = CaseFileSystem::new(project, settings);
    let root = case.setup_for_project().root.clone();
    // Without a snapshot the regions come from the meshes already in place.
    let regions = match config {
        Some(path) => {
            let db = load_snapshot(path)?;
            region_names(&db)
        }
        None => case
            .mesh_regions()
            .with_context(|| format!("read regions of {}", root.display()))?,
    };
    case.initialize(&regions)
        .with_context(|| format!("initialize {}", root.display()))?;
    Ok(exit_codes::OK)
}

async fn cmd_save_as(
    project: &Path,
    settings: GeneratorSettings,
    destination: &Path,
) -> Result<i32> {
    let mut case = CaseFileSystem::new(project, settings);
    let source = case.setup_for_project().root.clone();
    if !source.is_dir() {
        anyhow::bail!("no project case at {}", source.display());
    }
    let target = case.save_as(destination).await?;
    println!("{}", target.display());
    Ok(exit_codes::OK)
}

fn cmd_check_mesh(dir: &Path) -> i32 {
    if CaseFileSystem::is_poly_mesh(dir) {
        println!("ok");
        exit_codes::OK
    } else {
        println!("not a polyMesh directory: {}", dir.display());
        exit_codes::NOT_A_MESH
    }
}

/// Map the innermost typed error onto a stable exit code.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(BuildError::ConfigNotReady(_)) = cause.downcast_ref::<BuildError>() {
            return exit_codes::NOT_READY;
        }
        if let Some(CaseError::NotAMesh { .. }) = cause.downcast_ref::<CaseError>() {
            return exit_codes::NOT_A_MESH;
        }
    }
    exit_codes::INVALID
}
