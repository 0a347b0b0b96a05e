//! Manifest store: the durable record of every tracked file path and
//! its generation status.
//!
//! The manifest lives at a fixed relative path under the project root
//! and is rewritten after every mutation, so the on-disk document is
//! always consistent with the last fully applied command.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed manifest location relative to the project root.
pub const MANIFEST_REL: &str = "manifest.json";

/// Generation status of one tracked file.
///
/// Lifecycle: `Pending -> Generated` (update) or `Pending | Generated
/// -> Deleted` (remove). Deleted is terminal; entries never leave the
/// manifest sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Generated,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestFile {
    pub path: String,
    pub description: String,
    pub status: Status,
}

/// Ordered sequence of tracked files. Insertion order is preserved;
/// duplicate paths may coexist and lookups return the first match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub files: Vec<ManifestFile>,
}

impl Manifest {
    pub fn find_by_path(&self, path: &str) -> Option<&ManifestFile> {
        self.files.iter().find(|file| file.path == path)
    }

    pub fn find_by_path_mut(&mut self, path: &str) -> Option<&mut ManifestFile> {
        self.files.iter_mut().find(|file| file.path == path)
    }

    /// Append without collision checks; callers that want dedup must
    /// look up first.
    pub fn append(&mut self, entry: ManifestFile) {
        self.files.push(entry);
    }

    pub fn pending_count(&self) -> usize {
        self.files
            .iter()
            .filter(|file| file.status == Status::Pending)
            .count()
    }
}

pub fn manifest_path(project_root: &Path) -> PathBuf {
    project_root.join(MANIFEST_REL)
}

/// Load the manifest document, failing on a missing or malformed file.
pub fn load_manifest(project_root: &Path) -> Result<Manifest> {
    let path = manifest_path(project_root);
    let bytes = fs::read(&path).with_context(|| format!("read manifest {}", path.display()))?;
    let manifest: Manifest = serde_json::from_slice(&bytes).context("parse manifest JSON")?;
    Ok(manifest)
}

/// Load the manifest if present; `Ok(None)` means the caller must
/// bootstrap one.
pub fn load_manifest_optional(project_root: &Path) -> Result<Option<Manifest>> {
    if !manifest_path(project_root).is_file() {
        return Ok(None);
    }
    load_manifest(project_root).map(Some)
}

/// Persist the manifest via a sibling tmp file + rename so a reader
/// never observes a partially written document. Single writer assumed.
pub fn save_manifest(project_root: &Path, manifest: &Manifest) -> Result<()> {
    let path = manifest_path(project_root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(manifest).context("serialize manifest")?;
    let tmp_path = path.with_file_name(format!(".{MANIFEST_REL}.tmp"));
    fs::write(&tmp_path, text.as_bytes())
        .with_context(|| format!("write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, &path).with_context(|| format!("publish {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, status: Status) -> ManifestFile {
        ManifestFile {
            path: path.to_string(),
            description: format!("{path} description"),
            status,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let root = tempfile::tempdir().expect("create temp dir");
        let mut manifest = Manifest::default();
        manifest.append(entry("src/a.ts", Status::Pending));
        manifest.append(entry("src/b.ts", Status::Generated));
        save_manifest(root.path(), &manifest).expect("save manifest");

        let loaded = load_manifest(root.path()).expect("load manifest");
        assert_eq!(loaded.files.len(), 2);
        assert_eq!(loaded.files[0].path, "src/a.ts");
        assert_eq!(loaded.files[1].status, Status::Generated);
        // No stray tmp file left behind.
        assert!(!root.path().join(format!(".{MANIFEST_REL}.tmp")).exists());
    }

    #[test]
    fn optional_load_is_none_when_absent() {
        let root = tempfile::tempdir().expect("create temp dir");
        let loaded = load_manifest_optional(root.path()).expect("optional load");
        assert!(loaded.is_none());
    }

    #[test]
    fn malformed_manifest_is_an_error() {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::write(manifest_path(root.path()), b"not json").expect("write");
        assert!(load_manifest(root.path()).is_err());
        assert!(load_manifest_optional(root.path()).is_err());
    }

    #[test]
    fn duplicate_paths_coexist_and_lookup_returns_first() {
        let mut manifest = Manifest::default();
        manifest.append(entry("src/a.ts", Status::Pending));
        manifest.append(entry("src/a.ts", Status::Generated));
        assert_eq!(manifest.files.len(), 2);

        let found = manifest.find_by_path("src/a.ts").expect("find entry");
        assert_eq!(found.status, Status::Pending);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&entry("a", Status::Pending)).expect("serialize");
        assert!(json.contains("\"pending\""));
    }
}
