//! Generation context and prompt assembly.
//!
//! Prompt bases live as markdown templates under `prompts/` and are
//! filled with `{placeholder}` substitution; the smaller per-cycle
//! messages for context-accumulating mode are assembled inline.

use crate::manifest::Manifest;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

const SYSTEM_PROMPT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/system.md"));
const PLAN_BASE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/plan_base.md"));
const CYCLE_BASE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/cycle_base.md"
));

/// A preloaded document included in the generation context.
#[derive(Debug, Clone)]
pub struct ReferenceDoc {
    pub name: String,
    pub content: String,
}

/// Everything one generator invocation sees. Built fresh each cycle so
/// the loop's inputs stay visible at the call boundary.
#[derive(Debug)]
pub struct GenerationContext<'a> {
    pub spec: &'a str,
    pub references: &'a [ReferenceDoc],
    pub manifest: &'a Manifest,
    /// Error text from the previous failed cycle, if any.
    pub feedback: Option<&'a str>,
    /// True for the initial file-plan request when no manifest exists.
    pub bootstrap: bool,
}

pub fn load_reference_docs(paths: &[PathBuf]) -> Result<Vec<ReferenceDoc>> {
    let mut docs = Vec::new();
    for path in paths {
        let content = fs::read_to_string(path)
            .with_context(|| format!("read reference {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("reference")
            .to_string();
        docs.push(ReferenceDoc { name, content });
    }
    Ok(docs)
}

pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Complete prompt for single-shot mode and the bootstrap plan call.
pub fn full_prompt(context: &GenerationContext<'_>) -> String {
    let base = if context.bootstrap { PLAN_BASE } else { CYCLE_BASE };
    base.replace("{spec}", context.spec)
        .replace("{references}", &references_section(context.references))
        .replace("{manifest}", &manifest_json(context.manifest))
        .replace("{feedback}", &feedback_section(context.feedback))
}

/// One-time transcript seed for context-accumulating mode.
pub fn seed_prompt(spec: &str, references: &[ReferenceDoc]) -> String {
    format!(
        "# Specification\n\n{spec}\n{}",
        references_section(references)
    )
}

/// Per-cycle message for context-accumulating mode: manifest snapshot
/// plus any correction from the previous failed cycle.
pub fn delta_prompt(context: &GenerationContext<'_>) -> String {
    let mut prompt = String::new();
    if context.bootstrap {
        prompt.push_str(
            "Produce the initial file plan: one add command per file the project needs.\n",
        );
    } else {
        prompt.push_str("Continue: update pending files, or finish when nothing is pending.\n");
    }
    prompt.push_str("\n# Manifest\n\n");
    prompt.push_str(&manifest_json(context.manifest));
    prompt.push('\n');
    prompt.push_str(&feedback_section(context.feedback));
    prompt
}

fn manifest_json(manifest: &Manifest) -> String {
    serde_json::to_string_pretty(manifest).expect("serialize manifest snapshot")
}

fn references_section(references: &[ReferenceDoc]) -> String {
    if references.is_empty() {
        return String::new();
    }
    let mut section = String::from("\n# Reference Documents\n");
    for doc in references {
        section.push_str("\n## ");
        section.push_str(&doc.name);
        section.push_str("\n\n");
        section.push_str(&doc.content);
        section.push('\n');
    }
    section
}

fn feedback_section(feedback: Option<&str>) -> String {
    match feedback {
        Some(error) => format!(
            "\n# Previous Response Error\n\nYour previous response could not be applied. \
             Fix the problem and respond again with a valid JSON command array.\n\n\
             **Error:** {error}\n"
        ),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ManifestFile, Status};

    fn context<'a>(manifest: &'a Manifest, feedback: Option<&'a str>) -> GenerationContext<'a> {
        GenerationContext {
            spec: "{\"project\": \"demo\"}",
            references: &[],
            manifest,
            feedback,
            bootstrap: false,
        }
    }

    #[test]
    fn cycle_prompt_carries_spec_and_manifest() {
        let mut manifest = Manifest::default();
        manifest.append(ManifestFile {
            path: "src/a.ts".to_string(),
            description: "d".to_string(),
            status: Status::Pending,
        });
        let prompt = full_prompt(&context(&manifest, None));
        assert!(prompt.contains("\"project\": \"demo\""));
        assert!(prompt.contains("src/a.ts"));
        assert!(!prompt.contains("Previous Response Error"));
    }

    #[test]
    fn feedback_appears_in_both_prompt_shapes() {
        let manifest = Manifest::default();
        let ctx = context(&manifest, Some("expected a JSON array"));
        assert!(full_prompt(&ctx).contains("expected a JSON array"));
        assert!(delta_prompt(&ctx).contains("expected a JSON array"));
    }

    #[test]
    fn plan_prompt_omits_manifest_placeholder() {
        let manifest = Manifest::default();
        let ctx = GenerationContext {
            bootstrap: true,
            ..context(&manifest, None)
        };
        let prompt = full_prompt(&ctx);
        assert!(!prompt.contains("{spec}"));
        assert!(!prompt.contains("{manifest}"));
    }
}
