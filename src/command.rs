//! Shared command protocol types.
//!
//! A generation batch is a JSON array of externally tagged commands:
//! `{"add": {...}}`, `{"update": {...}}`, `{"remove": {...}}`, or
//! `{"finish": "<report>"}`. The interpreter matches the union
//! exhaustively so a new command kind cannot silently fall through.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One unit of the protocol: a single intended mutation or the
/// termination signal for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    /// Register a planned file as pending; touches nothing on disk.
    Add(AddCommand),
    /// Write a file and mark its manifest entry generated.
    Update(UpdateCommand),
    /// Delete a file and mark its manifest entry deleted.
    Remove(RemoveCommand),
    /// End the batch and the run, carrying a free-text report.
    Finish(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCommand {
    pub path: String,
    pub description: String,
}

/// `content` stays a raw JSON value so one mistyped payload does not
/// sink the whole batch; the interpreter rejects non-string content as
/// a recoverable validation error instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCommand {
    pub path: String,
    pub content: Value,
    pub why: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveCommand {
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command_kind() {
        let text = r#"[
            {"add": {"path": "src/a.ts", "description": "d"}},
            {"update": {"path": "src/a.ts", "content": "export const a = 1;", "why": "init"}},
            {"remove": {"path": "src/a.ts"}},
            {"finish": "All files generated"}
        ]"#;
        let batch: Vec<Command> = serde_json::from_str(text).expect("parse batch");
        assert_eq!(batch.len(), 4);
        assert!(matches!(&batch[0], Command::Add(add) if add.path == "src/a.ts"));
        assert!(matches!(&batch[1], Command::Update(update) if update.why == "init"));
        assert!(matches!(&batch[2], Command::Remove(remove) if remove.path == "src/a.ts"));
        assert!(matches!(&batch[3], Command::Finish(report) if report == "All files generated"));
    }

    #[test]
    fn mistyped_update_content_still_parses() {
        let text = r#"[{"update": {"path": "src/a.ts", "content": 42, "why": "oops"}}]"#;
        let batch: Vec<Command> = serde_json::from_str(text).expect("parse batch");
        match &batch[0] {
            Command::Update(update) => assert!(update.content.as_str().is_none()),
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn unknown_command_kind_is_a_parse_error() {
        let text = r#"[{"rename": {"path": "a"}}]"#;
        assert!(serde_json::from_str::<Vec<Command>>(text).is_err());
    }
}
