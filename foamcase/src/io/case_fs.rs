//! Case directory lifecycle.
//!
//! A [`CaseFileSystem`] starts uninitialized and is pointed at either a fresh
//! working case (`<project>/temp`) or the committed project case
//! (`<project>/case`). `save` moves the working case into place.
//!
//! Bulk copies and removals run on tokio's blocking pool; the async methods
//! await the worker so callers keep their ordering.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use crate::core::builder::AuxSink;
use crate::core::dictionary::FoamDocument;
use crate::core::error::{CaseError, IoResultExt};
use crate::core::time_dirs::latest_time;
use crate::io::case_paths::{
    BOUNDARY_CONDITIONS_DIR, CONSTANT_DIR, CasePaths, POLY_MESH_DIR, POLY_MESH_FILES,
    REGION_PROPERTIES, SYSTEM_DIR,
};
use crate::io::settings::GeneratorSettings;
use crate::io::writer::{write_atomic, write_document};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    Uninitialized,
    /// Working case under the temp directory.
    TemporaryCase,
    /// Committed case inside the project.
    ProjectCase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The working case replaced the project case.
    Moved,
    /// The case root already was the project case.
    AlreadySaved,
}

pub struct CaseFileSystem {
    project_root: PathBuf,
    settings: GeneratorSettings,
    state: CaseState,
    paths: Option<CasePaths>,
}

impl CaseFileSystem {
    pub fn new(project_root: impl Into<PathBuf>, settings: GeneratorSettings) -> Self {
        Self {
            project_root: project_root.into(),
            settings,
            state: CaseState::Uninitialized,
            paths: None,
        }
    }

    pub fn state(&self) -> CaseState {
        self.state
    }

    fn temp_root(&self) -> PathBuf {
        self.project_root.join(&self.settings.temp_dir_name)
    }

    fn project_case_root(&self) -> PathBuf {
        self.project_root.join(&self.settings.case_dir_name)
    }

    /// Recreate an empty working case: root, `constant/`, `0/`, `system/`
    /// and the marker file. Any previous working case is discarded.
    #[instrument(skip_all)]
    pub async fn setup_new_case(&mut self) -> Result<&CasePaths, CaseError> {
        let paths = CasePaths::new(&self.temp_root(), &self.settings);
        let layout = paths.clone();
        run_blocking(move || create_layout(&layout)).await?;

        info!(root = %paths.root.display(), "set up new case");
        self.state = CaseState::TemporaryCase;
        Ok(&*self.paths.insert(paths))
    }

    /// Point at the committed project case without touching the disk.
    pub fn setup_for_project(&mut self) -> &CasePaths {
        let paths = CasePaths::new(&self.project_case_root(), &self.settings);
        debug!(root = %paths.root.display(), "using project case");
        self.state = CaseState::ProjectCase;
        self.paths.insert(paths)
    }

    pub fn paths(&self) -> Result<&CasePaths, CaseError> {
        self.paths.as_ref().ok_or(CaseError::Uninitialized)
    }

    /// Create `constant/<r>`, `0/<r>` and `system/<r>` if absent.
    pub fn init_region_dirs(&self, rname: &str) -> Result<(), CaseError> {
        for dir in self.paths()?.region_dirs(rname) {
            fs::create_dir_all(&dir).fs_context("create directory", &dir)?;
        }
        Ok(())
    }

    pub fn case_root(&self) -> Result<PathBuf, CaseError> {
        Ok(self.paths()?.root.clone())
    }

    pub fn constant_path(&self, rname: &str) -> Result<PathBuf, CaseError> {
        Ok(self.paths()?.constant_dir(rname))
    }

    pub fn boundary_conditions_path(&self, rname: &str) -> Result<PathBuf, CaseError> {
        Ok(self.paths()?.boundary_conditions_dir(rname))
    }

    pub fn system_path(&self, rname: &str) -> Result<PathBuf, CaseError> {
        Ok(self.paths()?.system_dir(rname))
    }

    pub fn boundary_file_path(&self, rname: &str) -> Result<PathBuf, CaseError> {
        Ok(self.paths()?.boundary_file(rname))
    }

    pub fn cell_zones_file_path(&self, rname: &str) -> Result<PathBuf, CaseError> {
        Ok(self.paths()?.cell_zones_file(rname))
    }

    pub fn boundary_data_path(&self, rname: &str) -> Result<PathBuf, CaseError> {
        Ok(self.paths()?.boundary_data_dir(rname))
    }

    pub fn foam_file_path(&self) -> Result<PathBuf, CaseError> {
        Ok(self.paths()?.foam_file.clone())
    }

    /// True when `dir` contains all five polyMesh files.
    pub fn is_poly_mesh(dir: &Path) -> bool {
        POLY_MESH_FILES.iter().all(|name| dir.join(name).is_file())
    }

    /// Render and write a document into the case.
    pub fn write_document(&self, document: &FoamDocument) -> Result<PathBuf, CaseError> {
        write_document(&self.paths()?.root, document)
    }

    /// Replace `constant/` with the mesh found in `source`.
    ///
    /// A source containing `regionProperties` is a multi-region mesh:
    /// `source/<r>/polyMesh` is copied for each listed region. Otherwise
    /// `source` itself is the polyMesh directory.
    #[instrument(skip_all, fields(source = %source.display(), regions = regions.len()))]
    pub async fn copy_mesh_from(&self, source: &Path, regions: &[String]) -> Result<(), CaseError> {
        let constant = self.paths()?.constant.clone();
        let source = source.to_path_buf();
        let regions = regions.to_vec();
        run_blocking(move || import_mesh(&source, &constant, &regions)).await?;
        info!("mesh imported");
        Ok(())
    }

    /// Copy one file into the case root, replacing a file of the same name.
    pub async fn copy_file_to_case(&self, file: &Path) -> Result<PathBuf, CaseError> {
        let root = self.paths()?.root.clone();
        let file = file.to_path_buf();
        run_blocking(move || {
            let name = file.file_name().ok_or_else(|| {
                CaseError::fs(
                    "copy",
                    &file,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
                )
            })?;
            let target = root.join(name);
            fs::copy(&file, &target).fs_context("copy", &file)?;
            debug!(target = %target.display(), "copied file into case");
            Ok(target)
        })
        .await
    }

    /// Remove `name` from the case root if present.
    pub async fn remove_file(&self, name: &str) -> Result<(), CaseError> {
        let path = self.paths()?.root.join(name);
        run_blocking(move || {
            if fs::symlink_metadata(&path).is_ok() {
                remove_entry(&path)?;
                debug!(path = %path.display(), "removed case file");
            }
            Ok(())
        })
        .await
    }

    /// Commit the working case to the project case directory.
    #[instrument(skip_all)]
    pub async fn save(&mut self) -> Result<SaveOutcome, CaseError> {
        let root = self.paths()?.root.clone();
        let destination = self.project_case_root();
        if root == destination {
            return Ok(SaveOutcome::AlreadySaved);
        }

        let target = destination.clone();
        run_blocking(move || {
            if fs::symlink_metadata(&target).is_ok() {
                remove_entry(&target)?;
            }
            fs::rename(&root, &target).fs_context("move case", &root)
        })
        .await?;

        info!(destination = %destination.display(), "saved case");
        self.paths = Some(CasePaths::new(&destination, &self.settings));
        self.state = CaseState::ProjectCase;
        Ok(SaveOutcome::Moved)
    }

    /// Copy the current case into `<project>/case`, merging with and
    /// overwriting whatever is there.
    #[instrument(skip_all, fields(project = %project.display()))]
    pub async fn save_as(&self, project: &Path) -> Result<PathBuf, CaseError> {
        let root = self.paths()?.root.clone();
        let destination = project.join(&self.settings.case_dir_name);
        let target = destination.clone();
        run_blocking(move || copy_tree(&root, &target)).await?;
        info!(destination = %destination.display(), "case copied");
        Ok(destination)
    }

    /// Regions of the mesh already in `constant/`.
    ///
    /// A case with `constant/regionProperties` lists every subdirectory of
    /// `constant/` that holds a polyMesh; any other case is the single
    /// unnamed region.
    pub fn mesh_regions(&self) -> Result<Vec<String>, CaseError> {
        let constant = &self.paths()?.constant;
        if !constant.join(REGION_PROPERTIES).is_file() {
            return Ok(vec![String::new()]);
        }
        Ok(list_dir(constant)?
            .into_iter()
            .filter(|(name, is_dir)| {
                *is_dir && Self::is_poly_mesh(&constant.join(name).join(POLY_MESH_DIR))
            })
            .map(|(name, _)| name)
            .collect())
    }

    /// Reset the case for a fresh run.
    ///
    /// The numerically latest time directory becomes `0/`; every other time
    /// directory and stray root entry is removed. `constant/` keeps only the
    /// mesh (plus `regionProperties` and region directories when `regions`
    /// names any) and `system/` keeps only the retained files.
    ///
    /// A multi-region case (one with `constant/regionProperties`) must be
    /// given its region names; nothing is touched otherwise.
    #[instrument(skip_all, fields(regions = regions.len()))]
    pub fn initialize(&self, regions: &[String]) -> Result<(), CaseError> {
        let paths = self.paths()?;
        let root = &paths.root;
        let multi_region = regions.iter().any(|r| !r.is_empty());
        if !multi_region && paths.constant.join(REGION_PROPERTIES).is_file() {
            return Err(CaseError::RegionsRequired { path: root.clone() });
        }

        let entries = list_dir(root)?;
        let time_dirs: Vec<&str> = entries
            .iter()
            .filter(|(_, is_dir)| *is_dir)
            .map(|(name, _)| name.as_str())
            .collect();
        let latest = latest_time(time_dirs).map(str::to_string);

        let retained: HashSet<&str> = [CONSTANT_DIR, SYSTEM_DIR, self.settings.foam_file_name.as_str()]
            .into_iter()
            .collect();
        for (name, _) in &entries {
            if Some(name) == latest.as_ref() || retained.contains(name.as_str()) {
                continue;
            }
            remove_entry(&root.join(name))?;
        }

        match latest.as_deref() {
            Some(BOUNDARY_CONDITIONS_DIR) => {}
            Some(name) => {
                let from = root.join(name);
                fs::rename(&from, &paths.boundary_conditions).fs_context("rename", &from)?;
                debug!(from = name, "latest time directory moved to 0");
            }
            None => {
                fs::create_dir_all(&paths.boundary_conditions)
                    .fs_context("create directory", &paths.boundary_conditions)?;
            }
        }

        if paths.constant.is_dir() {
            if multi_region {
                for (name, _) in list_dir(&paths.constant)? {
                    let path = paths.constant.join(&name);
                    if regions.contains(&name) {
                        retain_only(&path, &[POLY_MESH_DIR])?;
                    } else if name != REGION_PROPERTIES {
                        remove_entry(&path)?;
                    }
                }
            } else {
                retain_only(&paths.constant, &[POLY_MESH_DIR])?;
            }
        }

        if paths.system.is_dir() {
            let keep: Vec<&str> = self
                .settings
                .retained_system_files
                .iter()
                .map(String::as_str)
                .collect();
            retain_only(&paths.system, &keep)?;
        }

        info!(latest = ?latest, "case initialized");
        Ok(())
    }
}

impl AuxSink for CaseFileSystem {
    fn write_constant_file(&self, relative: &Path, contents: &str) -> Result<(), CaseError> {
        let path = self.paths()?.constant.join(relative);
        write_atomic(&path, contents)?;
        debug!(path = %path.display(), "wrote auxiliary file");
        Ok(())
    }
}

fn create_layout(paths: &CasePaths) -> Result<(), CaseError> {
    if paths.root.exists() {
        fs::remove_dir_all(&paths.root).fs_context("remove previous case", &paths.root)?;
    }
    for dir in [&paths.constant, &paths.boundary_conditions, &paths.system] {
        fs::create_dir_all(dir).fs_context("create directory", dir)?;
    }
    fs::File::create(&paths.foam_file).fs_context("create marker file", &paths.foam_file)?;
    Ok(())
}

async fn run_blocking<T, F>(task: F) -> Result<T, CaseError>
where
    F: FnOnce() -> Result<T, CaseError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| CaseError::Background(err.to_string()))?
}

fn import_mesh(source: &Path, constant: &Path, regions: &[String]) -> Result<(), CaseError> {
    let region_properties = source.join(REGION_PROPERTIES);
    let multi_region = region_properties.is_file();

    // Validate every source before the existing mesh is discarded.
    let copies: Vec<(PathBuf, PathBuf)> = if multi_region {
        regions
            .iter()
            .map(|r| {
                (
                    source.join(r).join(POLY_MESH_DIR),
                    constant.join(r).join(POLY_MESH_DIR),
                )
            })
            .collect()
    } else {
        vec![(source.to_path_buf(), constant.join(POLY_MESH_DIR))]
    };
    if let Some((bad, _)) = copies
        .iter()
        .find(|(from, _)| !CaseFileSystem::is_poly_mesh(from))
    {
        return Err(CaseError::NotAMesh { path: bad.clone() });
    }

    if constant.exists() {
        fs::remove_dir_all(constant).fs_context("remove", constant)?;
    }
    fs::create_dir_all(constant).fs_context("create directory", constant)?;
    if multi_region {
        let target = constant.join(REGION_PROPERTIES);
        fs::copy(&region_properties, &target).fs_context("copy", &region_properties)?;
    }
    for (from, to) in &copies {
        copy_tree(from, to)?;
    }
    Ok(())
}

/// Recursive copy that creates missing directories and overwrites files.
fn copy_tree(source: &Path, destination: &Path) -> Result<(), CaseError> {
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(source).to_path_buf();
            CaseError::fs("walk", path, err.into())
        })?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).fs_context("create directory", &target)?;
        } else {
            fs::copy(entry.path(), &target).fs_context("copy", entry.path())?;
        }
    }
    Ok(())
}

/// `(name, is_dir)` for each entry of `dir`. Non UTF-8 names are skipped.
fn list_dir(dir: &Path) -> Result<Vec<(String, bool)>, CaseError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).fs_context("list", dir)? {
        let entry = entry.fs_context("list", dir)?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let is_dir = entry
            .file_type()
            .fs_context("stat", entry.path())?
            .is_dir();
        entries.push((name, is_dir));
    }
    entries.sort();
    Ok(entries)
}

/// Remove every entry of `dir` not named in `keep`.
fn retain_only(dir: &Path, keep: &[&str]) -> Result<(), CaseError> {
    for (name, _) in list_dir(dir)? {
        if !keep.contains(&name.as_str()) {
            remove_entry(&dir.join(name))?;
        }
    }
    Ok(())
}

fn remove_entry(path: &Path) -> Result<(), CaseError> {
    let metadata = fs::symlink_metadata(path).fs_context("stat", path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path).fs_context("remove", path)
    } else {
        fs::remove_file(path).fs_context("remove", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_poly_mesh;

    fn case_fs(project: &Path) -> CaseFileSystem {
        CaseFileSystem::new(project, GeneratorSettings::default())
    }

    #[test]
    fn accessors_fail_before_setup() {
        let temp = tempfile::tempdir().expect("tempdir");
        let case = case_fs(temp.path());
        assert_eq!(case.state(), CaseState::Uninitialized);
        assert!(matches!(case.case_root(), Err(CaseError::Uninitialized)));
        assert!(matches!(
            case.constant_path("fluid"),
            Err(CaseError::Uninitialized)
        ));
    }

    #[tokio::test]
    async fn setup_new_case_creates_layout_and_is_repeatable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut case = case_fs(temp.path());
        case.setup_new_case().await.expect("setup");
        case.init_region_dirs("fluid").expect("region dirs");
        fs::write(temp.path().join("temp/system/stale"), "x").expect("write");

        case.setup_new_case().await.expect("setup again");
        case.init_region_dirs("fluid").expect("region dirs again");
        case.init_region_dirs("fluid").expect("region dirs idempotent");

        let root = temp.path().join("temp");
        assert_eq!(case.state(), CaseState::TemporaryCase);
        assert!(root.join("constant/fluid").is_dir());
        assert!(root.join("0/fluid").is_dir());
        assert!(root.join("system/fluid").is_dir());
        assert!(!root.join("system/stale").exists());
        let marker = fs::metadata(root.join("case.foam")).expect("marker");
        assert_eq!(marker.len(), 0);
    }

    #[test]
    fn setup_for_project_does_not_create_anything() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut case = case_fs(temp.path());
        let root = case.setup_for_project().root.clone();
        assert_eq!(root, temp.path().join("case"));
        assert!(!root.exists());
        assert_eq!(case.state(), CaseState::ProjectCase);
    }

    #[tokio::test]
    async fn save_moves_once_then_reports_already_saved() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join("case/old")).expect("old case");
        let mut case = case_fs(temp.path());
        case.setup_new_case().await.expect("setup");

        assert_eq!(case.save().await.expect("save"), SaveOutcome::Moved);
        assert_eq!(case.save().await.expect("save again"), SaveOutcome::AlreadySaved);

        assert!(!temp.path().join("temp").exists());
        assert!(!temp.path().join("case/old").exists());
        assert!(temp.path().join("case/case.foam").is_file());
        assert_eq!(case.case_root().expect("root"), temp.path().join("case"));
    }

    #[tokio::test]
    async fn initialize_keeps_latest_time_as_zero() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut case = case_fs(temp.path());
        let root = case.setup_new_case().await.expect("setup").root.clone();
        for time in ["-1", "0", "0.5", "1", "2"] {
            fs::create_dir_all(root.join(time)).expect("time dir");
            fs::write(root.join(time).join("T"), time).expect("field");
        }
        fs::write(root.join("log.solver"), "").expect("log");
        fs::create_dir_all(root.join("postProcessing")).expect("pp");
        write_poly_mesh(&root.join("constant/polyMesh"));
        fs::write(root.join("constant/transportProperties"), "").expect("props");
        fs::write(root.join("system/controlDict"), "").expect("controlDict");
        fs::write(root.join("system/fvSchemes"), "").expect("fvSchemes");

        case.initialize(&[String::new()]).expect("initialize");

        let mut names: Vec<String> = fs::read_dir(&root)
            .expect("read_dir")
            .map(|e| e.expect("entry").file_name().into_string().expect("utf8"))
            .collect();
        names.sort();
        assert_eq!(names, vec!["0", "case.foam", "constant", "system"]);
        assert_eq!(fs::read_to_string(root.join("0/T")).expect("T"), "2");
        assert!(CaseFileSystem::is_poly_mesh(&root.join("constant/polyMesh")));
        assert!(!root.join("constant/transportProperties").exists());
        assert!(root.join("system/controlDict").exists());
        assert!(!root.join("system/fvSchemes").exists());
    }

    #[tokio::test]
    async fn initialize_without_time_dirs_creates_zero() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut case = case_fs(temp.path());
        let root = case.setup_new_case().await.expect("setup").root.clone();
        fs::remove_dir_all(root.join("0")).expect("remove 0");

        case.initialize(&[String::new()]).expect("initialize");
        assert!(root.join("0").is_dir());
    }

    #[tokio::test]
    async fn initialize_multi_region_prunes_constant() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut case = case_fs(temp.path());
        let root = case.setup_new_case().await.expect("setup").root.clone();
        let regions = vec!["fluid".to_string(), "solid".to_string()];
        for r in &regions {
            case.init_region_dirs(r).expect("region dirs");
            write_poly_mesh(&root.join("constant").join(r).join("polyMesh"));
            fs::write(root.join("constant").join(r).join("thermophysicalProperties"), "")
                .expect("props");
        }
        fs::write(root.join("constant/regionProperties"), "").expect("regionProperties");
        fs::create_dir_all(root.join("constant/removed")).expect("stray region");

        case.initialize(&regions).expect("initialize");

        assert!(root.join("constant/regionProperties").is_file());
        assert!(!root.join("constant/removed").exists());
        for r in &regions {
            assert!(root.join("constant").join(r).join("polyMesh").is_dir());
            assert!(!root.join("constant").join(r).join("thermophysicalProperties").exists());
        }
        assert!(!root.join("system/fluid").exists());
    }

    #[test]
    fn poly_mesh_needs_all_five_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mesh = temp.path().join("polyMesh");
        write_poly_mesh(&mesh);
        assert!(CaseFileSystem::is_poly_mesh(&mesh));
        fs::remove_file(mesh.join("neighbour")).expect("remove");
        assert!(!CaseFileSystem::is_poly_mesh(&mesh));
    }

    #[tokio::test]
    async fn aux_files_land_in_constant() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut case = case_fs(temp.path());
        case.setup_new_case().await.expect("setup");
        case.write_constant_file(Path::new("fluid/boundaryData/inlet/points"), "0\n(\n)\n")
            .expect("write");
        let written = temp.path().join("temp/constant/fluid/boundaryData/inlet/points");
        assert_eq!(fs::read_to_string(written).expect("read"), "0\n(\n)\n");
    }

    #[tokio::test]
    async fn initialize_refuses_multi_region_case_without_regions() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut case = case_fs(temp.path());
        let root = case.setup_new_case().await.expect("setup").root.clone();
        for r in ["fluid", "solid"] {
            write_poly_mesh(&root.join("constant").join(r).join("polyMesh"));
        }
        fs::write(root.join("constant/regionProperties"), "").expect("regionProperties");
        fs::create_dir_all(root.join("1")).expect("time dir");

        let err = case.initialize(&[String::new()]).unwrap_err();

        assert!(matches!(err, CaseError::RegionsRequired { .. }));
        assert!(root.join("1").is_dir());
        assert!(root.join("constant/regionProperties").is_file());
        assert!(CaseFileSystem::is_poly_mesh(&root.join("constant/fluid/polyMesh")));
    }

    #[tokio::test]
    async fn mesh_regions_reads_constant() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut case = case_fs(temp.path());
        let root = case.setup_new_case().await.expect("setup").root.clone();
        assert_eq!(case.mesh_regions().expect("single"), vec![String::new()]);

        for r in ["solid", "fluid"] {
            write_poly_mesh(&root.join("constant").join(r).join("polyMesh"));
        }
        fs::create_dir_all(root.join("constant/notes")).expect("stray dir");
        fs::write(root.join("constant/regionProperties"), "").expect("regionProperties");

        assert_eq!(
            case.mesh_regions().expect("multi"),
            vec!["fluid".to_string(), "solid".to_string()]
        );
    }
}
