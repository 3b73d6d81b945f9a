//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use clap::Args;
use forthwave_config::{Settings, default_config_path};
use forthwave_core::{BuildReport, CompileError, Runtime, RuntimeConfig, RuntimeError};
use forthwave_synth::{ModuleConfig, Patch, install};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options that shape the runtime, shared by every command that builds one.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Settings file (defaults to the platform config path)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// WAV file or directory of WAV files to load as sample words (repeatable)
    #[arg(long = "samples", value_name = "PATH")]
    pub samples: Vec<PathBuf>,
}

impl EngineArgs {
    /// Load the settings file and apply flag overrides.
    ///
    /// An explicit `--config` must exist; the default path may be absent.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::load_or_default(default_config_path())?,
        };
        if let Some(rate) = self.sample_rate {
            settings.audio.sample_rate = rate;
        }
        settings.modules.samples.extend(self.samples.iter().cloned());
        settings.validate()?;
        Ok(settings)
    }
}

/// A runtime with the module bank installed.
pub struct Engine {
    pub runtime: Arc<Runtime>,
    pub patch: Patch,
}

impl Engine {
    /// Create the runtime and install modules as `settings` describes.
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let runtime = Runtime::new(RuntimeConfig {
            sample_rate: settings.audio.sample_rate,
            stack_limit: settings.engine.stack_limit,
            fault_queue: settings.engine.fault_queue,
        });
        let modules = &settings.modules;
        let patch = install(
            &runtime,
            &ModuleConfig {
                operators: modules.operators,
                envelopes: modules.envelopes,
                mixers: modules.mixers,
                delays: modules.delays,
                sequencers: modules.sequencers,
                tables: modules.tables,
                steps: modules.steps,
                max_delay_seconds: modules.max_delay_seconds,
                samples: modules.samples.clone(),
            },
        )?;
        Ok(Self {
            runtime: Arc::new(runtime),
            patch,
        })
    }
}

/// Read a program file.
pub fn read_program(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read program '{}'", path.display()))
}

/// Read `path` and build it into `runtime`.
///
/// Compile errors are rendered with the offending source line.
pub fn rebuild(runtime: &Runtime, path: &Path) -> anyhow::Result<BuildReport> {
    let source = read_program(path)?;
    runtime
        .build_bytes(&source)
        .map_err(|err| anyhow::anyhow!(describe_compile_error(&source, &err)))
}

/// Format a compile error, pointing at its location when it has one.
pub fn describe_compile_error(source: &[u8], err: &CompileError) -> String {
    let Some((line, column)) = err.location() else {
        return err.to_string();
    };
    let text = String::from_utf8_lossy(source);
    match text.lines().nth(line.saturating_sub(1)) {
        Some(code) => format!(
            "{err}\n  {line:>4} | {code}\n       | {:>width$}",
            "^",
            width = column
        ),
        None => err.to_string(),
    }
}

/// Log faults from the audio thread on a detached thread.
pub fn spawn_fault_logger(runtime: &Runtime) {
    let faults = runtime.faults();
    std::thread::spawn(move || {
        for fault in faults {
            log_fault(&fault);
        }
    });
}

fn log_fault(fault: &RuntimeError) {
    tracing::error!(
        word = fault.word(),
        "{fault}; program stopped, output is silent until the next build"
    );
}
