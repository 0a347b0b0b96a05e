use anyhow::{Context, Result};
use clap::Parser;

mod cli;
mod command;
mod driver;
mod generator;
mod interpreter;
mod manifest;
mod prompt;
mod replay;

use cli::{Commands, GenerateArgs, RootArgs};

fn main() -> Result<()> {
    init_tracing();
    let args = RootArgs::parse();
    match args.command {
        Commands::Generate(args) => cmd_generate(args),
        Commands::Replay(args) => replay::run_replay(&args.project_root, &args.batches),
    }
}

/// Dev diagnostics via `RUST_LOG`, stderr, compact. Defaults to `warn`.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn cmd_generate(args: GenerateArgs) -> Result<()> {
    // Credential check comes before any file I/O.
    let mut generator = generator::ApiGenerator::from_env(args.mode)?;

    let spec = std::fs::read_to_string(&args.spec)
        .with_context(|| format!("read specification {}", args.spec.display()))?;
    let references = prompt::load_reference_docs(&args.references)?;

    let config = driver::DriverConfig {
        project_root: args.project_root,
        max_cycles: args.max_cycles,
    };
    let run = driver::run(&mut generator, &spec, &references, &config)?;

    println!("{}", run.report);
    eprintln!("generate: finished after {} cycle(s)", run.cycles);
    Ok(())
}
