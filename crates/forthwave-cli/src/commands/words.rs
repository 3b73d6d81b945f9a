//! Dictionary listing command.

use super::common::{Engine, EngineArgs, rebuild};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args)]
pub struct WordsArgs {
    /// Also include the words this program defines
    #[arg(long, value_name = "FILE")]
    program: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Serialize)]
struct WordEntry {
    name: String,
    kind: &'static str,
}

pub fn run(args: WordsArgs) -> anyhow::Result<()> {
    let settings = args.engine.settings()?;
    let engine = Engine::new(&settings)?;
    if let Some(program) = &args.program {
        rebuild(&engine.runtime, program)?;
    }

    let words: Vec<WordEntry> = engine
        .runtime
        .words()
        .into_iter()
        .map(|(name, kind)| WordEntry {
            name,
            kind: kind.as_str(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&words)?);
        return Ok(());
    }

    let width = words.iter().map(|w| w.name.len()).max().unwrap_or(0);
    for word in &words {
        println!("  {:<width$}  {}", word.name, word.kind, width = width);
    }
    println!("\n{} word(s)", words.len());
    Ok(())
}
