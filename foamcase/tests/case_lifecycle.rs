//! Lifecycle tests for `CaseFileSystem`: mesh import, file copies, save-as.

use std::fs;

use foamcase::core::error::CaseError;
use foamcase::io::case_fs::{CaseFileSystem, CaseState, SaveOutcome};
use foamcase::io::settings::GeneratorSettings;
use foamcase::test_support::{TestProject, write_poly_mesh};

async fn new_case(project: &TestProject) -> CaseFileSystem {
    let mut case = CaseFileSystem::new(project.path(), GeneratorSettings::default());
    case.setup_new_case().await.expect("setup");
    case
}

#[tokio::test]
async fn single_region_mesh_replaces_constant() {
    let project = TestProject::new();
    let mesh = project.single_region_mesh();
    let case = new_case(&project).await;
    let constant = case.constant_path("").expect("constant");
    fs::write(constant.join("stale"), "x").expect("stale");

    case.copy_mesh_from(&mesh, &[]).await.expect("copy mesh");

    assert!(CaseFileSystem::is_poly_mesh(&constant.join("polyMesh")));
    assert!(!constant.join("stale").exists());
    assert_eq!(
        fs::read_to_string(case.boundary_file_path("").expect("boundary")).expect("read"),
        "boundary\n"
    );
}

#[tokio::test]
async fn multi_region_mesh_copies_each_region() {
    let project = TestProject::new();
    let source = project.multi_region_mesh(&["fluid", "solid"]);
    let case = new_case(&project).await;
    let regions = vec!["fluid".to_string(), "solid".to_string()];

    case.copy_mesh_from(&source, &regions).await.expect("copy mesh");

    let constant = case.constant_path("").expect("constant");
    assert!(constant.join("regionProperties").is_file());
    for r in &regions {
        let mesh = case.constant_path(r).expect("region constant").join("polyMesh");
        assert!(CaseFileSystem::is_poly_mesh(&mesh), "{r}");
    }
}

#[tokio::test]
async fn invalid_mesh_leaves_constant_untouched() {
    let project = TestProject::new();
    let bad = project.path().join("not-a-mesh");
    fs::create_dir_all(&bad).expect("dir");
    fs::write(bad.join("points"), "").expect("points");
    let case = new_case(&project).await;
    let constant = case.constant_path("").expect("constant");
    write_poly_mesh(&constant.join("polyMesh"));

    let err = case.copy_mesh_from(&bad, &[]).await.unwrap_err();

    assert!(matches!(err, CaseError::NotAMesh { path } if path == bad));
    assert!(CaseFileSystem::is_poly_mesh(&constant.join("polyMesh")));
}

#[tokio::test]
async fn copy_and_remove_single_files() {
    let project = TestProject::new();
    let source = project.path().join("controlDict.extra");
    fs::write(&source, "content").expect("source");
    let case = new_case(&project).await;

    let copied = case.copy_file_to_case(&source).await.expect("copy");
    assert_eq!(copied, case.case_root().expect("root").join("controlDict.extra"));
    assert_eq!(fs::read_to_string(&copied).expect("read"), "content");

    case.remove_file("controlDict.extra").await.expect("remove");
    assert!(!copied.exists());
    case.remove_file("controlDict.extra")
        .await
        .expect("removing a missing file is fine");
}

#[tokio::test]
async fn save_as_merges_into_destination() {
    let project = TestProject::new();
    let mut case = new_case(&project).await;
    fs::write(
        case.system_path("").expect("system").join("controlDict"),
        "new",
    )
    .expect("controlDict");
    assert_eq!(case.save().await.expect("save"), SaveOutcome::Moved);
    assert_eq!(case.state(), CaseState::ProjectCase);

    let other = tempfile::tempdir().expect("tempdir");
    let existing = other.path().join("case/system");
    fs::create_dir_all(&existing).expect("existing");
    fs::write(existing.join("controlDict"), "old").expect("old");
    fs::write(existing.join("keepMe"), "kept").expect("keep");

    let target = case.save_as(other.path()).await.expect("save as");

    assert_eq!(target, other.path().join("case"));
    assert_eq!(
        fs::read_to_string(target.join("system/controlDict")).expect("read"),
        "new"
    );
    assert!(target.join("system/keepMe").is_file());
    assert!(target.join("case.foam").is_file());
    assert!(project.path().join("case/case.foam").is_file());
}
