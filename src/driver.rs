//! Generation driver: the control loop coordinating context building,
//! generator calls, and command application until termination.
//!
//! The manifest is the single source of truth for what remains to be
//! done; each cycle re-derives intent from manifest state instead of
//! keeping a separate todo list. A generation or parse failure earns
//! exactly one retry: the error text is fed back into the next context,
//! and a second consecutive failure ends the run.

use crate::generator::{parse_command_batch, ContentGenerator};
use crate::interpreter::apply_batch;
use crate::manifest::{load_manifest_optional, save_manifest, Manifest};
use crate::prompt::{GenerationContext, ReferenceDoc};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Single retry credit. A failure while feedback is already pending is
/// fatal; a successful cycle clears it.
enum RetryState {
    Clear,
    Pending(String),
}

pub struct DriverConfig {
    /// Directory the manifest and generated files live under.
    pub project_root: PathBuf,
    /// Upper bound on generation cycles before the run fails.
    pub max_cycles: u32,
}

#[derive(Debug)]
pub struct RunReport {
    /// Free-text summary carried by the finish command.
    pub report: String,
    pub cycles: u32,
}

/// Run the loop to completion: bootstrap the manifest if absent, then
/// generate, parse, and apply batches until a finish command lands.
pub fn run<G: ContentGenerator>(
    generator: &mut G,
    spec: &str,
    references: &[ReferenceDoc],
    config: &DriverConfig,
) -> Result<RunReport> {
    let root = config.project_root.as_path();
    let mut manifest = match load_manifest_optional(root)? {
        Some(manifest) => manifest,
        None => bootstrap(generator, spec, references, root)?,
    };

    let mut retry = RetryState::Clear;
    let mut error_history: Vec<String> = Vec::new();
    let mut cycles = 0u32;

    loop {
        if cycles >= config.max_cycles {
            return Err(anyhow!(
                "no finish command after {} generation cycles",
                config.max_cycles
            ));
        }
        cycles += 1;

        let feedback = match &retry {
            RetryState::Pending(message) => Some(message.as_str()),
            RetryState::Clear => None,
        };
        let context = GenerationContext {
            spec,
            references,
            manifest: &manifest,
            feedback,
            bootstrap: false,
        };

        let batch = match generator
            .generate(&context)
            .and_then(|text| parse_command_batch(&text))
        {
            Ok(batch) => {
                retry = RetryState::Clear;
                batch
            }
            Err(err) => {
                let message = format!("{err:#}");
                error_history.push(message.clone());
                if matches!(retry, RetryState::Pending(_)) {
                    return Err(anyhow!(
                        "two consecutive generation failures; giving up\n\n{}",
                        error_history.join("\n---\n")
                    ));
                }
                warn!(%message, "generation cycle failed; retrying with feedback");
                retry = RetryState::Pending(message);
                continue;
            }
        };

        let outcome = apply_batch(root, &mut manifest, &batch)?;
        for message in &outcome.validation_errors {
            warn!(%message, "command skipped by interpreter");
        }
        info!(
            cycle = cycles,
            applied = outcome.applied,
            pending = manifest.pending_count(),
            "applied command batch"
        );
        if let Some(report) = outcome.finish {
            return Ok(RunReport { report, cycles });
        }
    }
}

/// One generator call with the initial-file-plan context, applied to an
/// empty manifest. Any failure here is fatal; there is no retry before
/// a manifest exists.
fn bootstrap<G: ContentGenerator>(
    generator: &mut G,
    spec: &str,
    references: &[ReferenceDoc],
    root: &Path,
) -> Result<Manifest> {
    info!("manifest absent; requesting initial file plan");
    let mut manifest = Manifest::default();
    let context = GenerationContext {
        spec,
        references,
        manifest: &manifest,
        feedback: None,
        bootstrap: true,
    };
    let text = generator
        .generate(&context)
        .context("bootstrap generation call")?;
    let batch = parse_command_batch(&text).context("parse initial file plan")?;
    apply_batch(root, &mut manifest, &batch)?;
    // Persist even if the plan was empty so the next run skips bootstrap.
    save_manifest(root, &manifest)?;
    info!(files = manifest.files.len(), "bootstrapped manifest");
    Ok(manifest)
}
