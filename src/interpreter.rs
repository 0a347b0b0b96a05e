//! Command interpreter: applies one ordered batch against the
//! filesystem and the manifest.
//!
//! Side effects are synchronous and the manifest is flushed after every
//! mutation, so a crash mid-batch leaves the filesystem and manifest
//! mutually consistent up to the last applied command. A finish command
//! stops the batch; nothing after it is applied.

use crate::command::{Command, UpdateCommand};
use crate::manifest::{save_manifest, Manifest, ManifestFile, Status};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path};
use tracing::warn;

/// Result of applying one batch.
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    /// Commands applied before the batch ended.
    pub applied: usize,
    /// Report carried by a finish command, when one was encountered.
    pub finish: Option<String>,
    /// Recoverable per-command validation failures (logged, skipped).
    pub validation_errors: Vec<String>,
}

/// Apply each command in order against `project_root`.
///
/// Validation failures (mistyped content, unsafe paths) skip the
/// command and are surfaced in the outcome; I/O failures propagate and
/// end the run.
pub fn apply_batch(
    project_root: &Path,
    manifest: &mut Manifest,
    commands: &[Command],
) -> Result<ApplyOutcome> {
    let mut outcome = ApplyOutcome::default();
    for command in commands {
        match command {
            Command::Add(add) => {
                manifest.append(ManifestFile {
                    path: add.path.clone(),
                    description: add.description.clone(),
                    status: Status::Pending,
                });
                save_manifest(project_root, manifest)?;
                outcome.applied += 1;
            }
            Command::Update(update) => match update_content(update) {
                Ok(content) => {
                    write_project_file(project_root, &update.path, content)?;
                    if let Some(entry) = manifest.find_by_path_mut(&update.path) {
                        entry.status = Status::Generated;
                        save_manifest(project_root, manifest)?;
                    }
                    outcome.applied += 1;
                }
                Err(message) => {
                    warn!(path = %update.path, %message, "skipping invalid update command");
                    outcome.validation_errors.push(message);
                }
            },
            Command::Remove(remove) => {
                if let Err(message) = check_relative(&remove.path) {
                    warn!(path = %remove.path, %message, "skipping invalid remove command");
                    outcome.validation_errors.push(message);
                    continue;
                }
                let path = project_root.join(&remove.path);
                fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
                if let Some(entry) = manifest.find_by_path_mut(&remove.path) {
                    entry.status = Status::Deleted;
                    save_manifest(project_root, manifest)?;
                }
                outcome.applied += 1;
            }
            Command::Finish(report) => {
                outcome.finish = Some(report.clone());
                outcome.applied += 1;
                break;
            }
        }
    }
    Ok(outcome)
}

/// Write `content` to `rel_path` under the project root, creating
/// parent directories as needed. Shared with the batch-replay client.
pub fn write_project_file(project_root: &Path, rel_path: &str, content: &str) -> Result<()> {
    let path = project_root.join(rel_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(&path, content.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Generated paths must stay inside the project root.
pub fn check_relative(path: &str) -> Result<(), String> {
    if path.trim().is_empty() {
        return Err("command path is empty".to_string());
    }
    let candidate = Path::new(path);
    if candidate.is_absolute()
        || candidate
            .components()
            .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(format!(
            "command path must be relative without '..' (got {path:?})"
        ));
    }
    Ok(())
}

fn update_content(update: &UpdateCommand) -> Result<&str, String> {
    check_relative(&update.path)?;
    update.content.as_str().ok_or_else(|| {
        format!(
            "update content for {:?} must be a string (got {})",
            update.path, update.content
        )
    })
}
