//! Offline render command.

use super::common::{Engine, EngineArgs, rebuild};
use clap::Args;
use forthwave_io::{WavSpec, write_wav_stereo};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Program file
    program: PathBuf,

    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// Length in seconds
    #[arg(short, long, default_value = "10")]
    seconds: f64,

    /// Start with the transport playing
    #[arg(long)]
    play: bool,

    /// Frames rendered per block
    #[arg(long, default_value = "512")]
    block_size: usize,

    #[command(flatten)]
    engine: EngineArgs,
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |p, s| p.max(s.abs()))
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if !(args.seconds.is_finite() && args.seconds >= 0.0) {
        anyhow::bail!("--seconds must be a non-negative number");
    }
    if args.block_size == 0 {
        anyhow::bail!("--block-size must be at least 1");
    }

    let settings = args.engine.settings()?;
    let engine = Engine::new(&settings)?;
    let runtime = &engine.runtime;
    let report = rebuild(runtime, &args.program)?;
    runtime.transport().set(args.play);

    let sample_rate = runtime.sample_rate();
    let frames = (args.seconds * f64::from(sample_rate)).round() as usize;
    tracing::info!(
        instructions = report.instructions,
        frames,
        sample_rate,
        "rendering"
    );

    let mut left = vec![0.0f32; frames];
    let mut right = vec![0.0f32; frames];

    let pb = ProgressBar::new(frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    for (l, r) in left
        .chunks_mut(args.block_size)
        .zip(right.chunks_mut(args.block_size))
    {
        if let Err(fault) = runtime.process_block(l, r) {
            pb.abandon();
            anyhow::bail!("runtime fault: {fault}");
        }
        pb.inc(l.len() as u64);
    }
    pb.finish_and_clear();

    write_wav_stereo(
        &args.output,
        &left,
        &right,
        WavSpec {
            sample_rate,
            bits_per_sample: 32,
        },
    )?;

    println!(
        "Wrote {} ({:.2} s, peak L {:.3} R {:.3})",
        args.output.display(),
        frames as f64 / f64::from(sample_rate),
        peak(&left),
        peak(&right)
    );
    Ok(())
}
