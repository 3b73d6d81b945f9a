//! Live playback command.

use super::common::{Engine, EngineArgs, rebuild, spawn_fault_logger};
use crate::console::{self, Command, Console};
use crate::watch;
use clap::Args;
use crossbeam_channel::{RecvTimeoutError, never};
use forthwave_io::{AudioStream, StreamConfig};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Args)]
pub struct PlayArgs {
    /// Program file
    program: PathBuf,

    /// Buffer size in frames
    #[arg(long)]
    buffer_size: Option<u32>,

    /// Output device name or index
    #[arg(long)]
    output_device: Option<String>,

    /// Rebuild whenever the program file changes
    #[arg(long)]
    watch: bool,

    #[command(flatten)]
    engine: EngineArgs,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let mut settings = args.engine.settings()?;
    if let Some(size) = args.buffer_size {
        settings.audio.buffer_size = size;
    }
    if args.output_device.is_some() {
        settings.audio.output_device = args.output_device.clone();
    }
    settings.validate()?;

    let Engine { runtime, patch } = Engine::new(&settings)?;
    spawn_fault_logger(&runtime);

    match rebuild(&runtime, &args.program) {
        Ok(report) => tracing::info!(
            instructions = report.instructions,
            definitions = report.definitions.len(),
            "program installed"
        ),
        Err(err) => tracing::error!("{err:#}\nstarting with an empty program"),
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let mut stream = AudioStream::new(StreamConfig {
        sample_rate: settings.audio.sample_rate,
        buffer_size: settings.audio.buffer_size,
        output_device: settings.audio.output_device.clone(),
    })?;
    let audio = Arc::clone(&runtime);
    stream.start_stereo(move |left, right| {
        // Faults are reported through the fault channel.
        let _ = audio.process_block(left, right);
    })?;
    tracing::info!(
        device = %stream.device_name(),
        channels = stream.output_channels(),
        sample_rate = stream.sample_rate(),
        "audio stream started"
    );

    let watcher = args
        .watch
        .then(|| watch::spawn(args.program.clone(), Arc::clone(&runtime), Arc::clone(&running)));

    println!(
        "Playing {} on {}. Enter toggles the transport, 'help' lists commands, Ctrl+C stops.",
        args.program.display(),
        stream.device_name()
    );

    let console = Console::new(Arc::clone(&runtime), patch.prompt, patch.midi, args.program);
    let mut lines = console::spawn_reader();
    while running.load(Ordering::SeqCst) {
        let line = match lines.recv_timeout(Duration::from_millis(100)) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                // End of input: keep playing until Ctrl+C.
                lines = never();
                continue;
            }
        };
        match line.parse::<Command>() {
            Ok(command) => match console.execute(command) {
                ControlFlow::Continue(Some(reply)) => println!("{reply}"),
                ControlFlow::Continue(None) => {}
                ControlFlow::Break(()) => break,
            },
            Err(err) => println!("? {err}"),
        }
    }

    running.store(false, Ordering::SeqCst);
    stream.stop();
    if let Some(handle) = watcher
        && handle.join().is_err()
    {
        tracing::warn!("file watcher panicked");
    }
    println!("Stopped.");
    Ok(())
}
