//! Writes rendered documents into a case directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::dictionary::FoamDocument;
use crate::core::error::{CaseError, IoResultExt};
use crate::core::render::render_document;

/// `<root>/<location>/<object>`
pub fn document_path(root: &Path, document: &FoamDocument) -> PathBuf {
    root.join(&document.header.location)
        .join(&document.header.object)
}

/// Render and write `document` below `root`, creating its directory.
pub fn write_document(root: &Path, document: &FoamDocument) -> Result<PathBuf, CaseError> {
    let path = document_path(root, document);
    write_atomic(&path, &render_document(document))?;
    debug!(path = %path.display(), "wrote document");
    Ok(path)
}

/// Write through a sibling temp file and rename over `path`.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), CaseError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).fs_context("create directory", parent)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = parent.join(format!(".{file_name}.tmp"));
    fs::write(&tmp_path, contents).fs_context("write temp file", &tmp_path)?;
    fs::rename(&tmp_path, path).fs_context("replace", path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dictionary::{Dictionary, FoamHeader};

    #[test]
    fn writes_under_location_and_replaces() {
        let temp = tempfile::tempdir().expect("tempdir");
        let document = FoamDocument {
            header: FoamHeader::dictionary("system/solid", "fvSolution"),
            body: Dictionary::new().with("a", 1),
        };
        let path = write_document(temp.path(), &document).expect("write");
        assert_eq!(path, temp.path().join("system/solid/fvSolution"));
        let first = fs::read_to_string(&path).expect("read");
        assert!(first.contains("a               1;"));

        let updated = FoamDocument {
            body: Dictionary::new().with("a", 2),
            ..document
        };
        write_document(temp.path(), &updated).expect("rewrite");
        let second = fs::read_to_string(&path).expect("read");
        assert!(second.contains("a               2;"));

        let leftovers: Vec<_> = fs::read_dir(temp.path().join("system/solid"))
            .expect("read_dir")
            .collect();
        assert_eq!(leftovers.len(), 1);
    }
}
