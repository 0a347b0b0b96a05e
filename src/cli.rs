//! CLI argument parsing for the generation workflow.
//!
//! The CLI is intentionally thin: it wires the driver and the replay
//! client without embedding policy, so the same core logic stays
//! testable on its own.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "specsmith",
    version,
    about = "Manifest-driven source tree generation from a spec document",
    after_help = "Examples:\n  specsmith generate spec.json\n  specsmith generate spec.json --project-root ./out --mode context-accumulating --reference docs/style.md\n  specsmith replay batches/*.json --project-root ./out",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Generate(GenerateArgs),
    Replay(ReplayArgs),
}

/// Inputs for the generation loop.
#[derive(Parser, Debug)]
#[command(about = "Generate a project source tree from a specification document")]
pub struct GenerateArgs {
    /// Path to the specification document (JSON, passed to the
    /// generator opaquely)
    #[arg(value_name = "SPEC")]
    pub spec: PathBuf,

    /// Project root the manifest and generated files live under
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_root: PathBuf,

    /// How much context each generator call carries
    #[arg(long, value_enum, default_value_t = GenerationMode::SingleShot)]
    pub mode: GenerationMode,

    /// Reference documents preloaded into the generation context
    #[arg(long = "reference", value_name = "PATH")]
    pub references: Vec<PathBuf>,

    /// Upper bound on generation cycles before the run fails
    #[arg(long, value_name = "N", default_value_t = 25)]
    pub max_cycles: u32,
}

/// Inputs for the batch-replay client.
#[derive(Parser, Debug)]
#[command(about = "Replay locally stored command batch files without a generator")]
pub struct ReplayArgs {
    /// Command batch files (JSON arrays) to apply in order
    #[arg(value_name = "BATCH", required = true)]
    pub batches: Vec<PathBuf>,

    /// Project root generated files are written under
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_root: PathBuf,
}

/// Unifies the two historical generator variants behind one driver.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationMode {
    /// Rebuild the complete prompt from spec and manifest every cycle
    SingleShot,
    /// Seed a transcript once with spec and references, then append
    /// per-cycle manifest and correction messages
    ContextAccumulating,
}
