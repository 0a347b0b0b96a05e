//! Batch-replay client: replays locally stored command batch files
//! without calling any generator.
//!
//! Each input file is processed independently; a parse failure or a
//! failed write is logged and processing continues with the next item.
//! This client keeps no manifest and never escalates to a fatal error.

use crate::command::UpdateCommand;
use crate::interpreter::{check_relative, write_project_file};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::error;

/// The replay slice of the protocol: file writes plus the two
/// informational payloads a stored batch may carry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ReplayCommand {
    Update(UpdateCommand),
    /// Pending paths, informational only.
    Continue(Vec<String>),
    Finish(String),
}

pub fn run_replay(project_root: &Path, batches: &[PathBuf]) -> Result<()> {
    for batch_path in batches {
        if let Err(err) = replay_file(project_root, batch_path) {
            error!(path = %batch_path.display(), "skipping batch file: {err:#}");
            eprintln!("replay: skipping {}: {err:#}", batch_path.display());
        }
    }
    Ok(())
}

fn replay_file(project_root: &Path, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let commands: Vec<ReplayCommand> =
        serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;

    for command in commands {
        match command {
            ReplayCommand::Update(update) => apply_update(project_root, &update),
            ReplayCommand::Continue(pending) => {
                println!("pending: {}", pending.join(", "));
            }
            ReplayCommand::Finish(report) => {
                println!("{report}");
                break;
            }
        }
    }
    Ok(())
}

fn apply_update(project_root: &Path, update: &UpdateCommand) {
    if let Err(message) = check_relative(&update.path) {
        error!(path = %update.path, %message, "skipping update");
        return;
    }
    let Some(content) = update.content.as_str() else {
        error!(path = %update.path, "update content is not a string; skipping");
        return;
    };
    if let Err(err) = write_project_file(project_root, &update.path, content) {
        error!(path = %update.path, "write failed, continuing: {err:#}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_batch(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).expect("write batch file");
        path
    }

    #[test]
    fn applies_updates_and_stops_at_finish() {
        let root = tempfile::tempdir().expect("create temp dir");
        let batch = write_batch(
            root.path(),
            "batch.json",
            r#"[
                {"update": {"path": "out/x.txt", "content": "hello", "why": "test"}},
                {"finish": "done"},
                {"update": {"path": "out/y.txt", "content": "late", "why": "test"}}
            ]"#,
        );

        run_replay(root.path(), &[batch]).expect("replay");

        let written = fs::read_to_string(root.path().join("out/x.txt")).expect("read file");
        assert_eq!(written, "hello");
        assert!(!root.path().join("out/y.txt").exists());
    }

    #[test]
    fn malformed_file_does_not_stop_later_files() {
        let root = tempfile::tempdir().expect("create temp dir");
        let bad = write_batch(root.path(), "bad.json", "not json at all");
        let good = write_batch(
            root.path(),
            "good.json",
            r#"[{"update": {"path": "out/z.txt", "content": "z", "why": "test"}}]"#,
        );

        run_replay(root.path(), &[bad, good]).expect("replay never escalates");

        let written = fs::read_to_string(root.path().join("out/z.txt")).expect("read file");
        assert_eq!(written, "z");
    }

    #[test]
    fn non_string_content_is_skipped_without_error() {
        let root = tempfile::tempdir().expect("create temp dir");
        let batch = write_batch(
            root.path(),
            "batch.json",
            r#"[
                {"update": {"path": "out/a.txt", "content": {"nested": true}, "why": "test"}},
                {"update": {"path": "out/b.txt", "content": "ok", "why": "test"}}
            ]"#,
        );

        run_replay(root.path(), &[batch]).expect("replay");

        assert!(!root.path().join("out/a.txt").exists());
        assert_eq!(
            fs::read_to_string(root.path().join("out/b.txt")).expect("read file"),
            "ok"
        );
    }
}
