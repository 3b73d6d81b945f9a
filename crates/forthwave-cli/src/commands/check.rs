//! Compile-only command.

use super::common::{Engine, EngineArgs, rebuild};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct CheckArgs {
    /// Program file
    program: PathBuf,

    #[command(flatten)]
    engine: EngineArgs,
}

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let settings = args.engine.settings()?;
    let engine = Engine::new(&settings)?;
    let report = rebuild(&engine.runtime, &args.program)?;

    println!(
        "{}: ok, {} instruction(s)",
        args.program.display(),
        report.instructions
    );
    if !report.definitions.is_empty() {
        println!("defines: {}", report.definitions.join(" "));
    }
    Ok(())
}
