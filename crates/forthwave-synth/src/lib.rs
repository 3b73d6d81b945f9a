//! Forthwave Synth - synthesis modules for the forthwave runtime
//!
//! Every module is a registrant: it adds named natives to a
//! [`Runtime`](forthwave_core::Runtime) and, if it has time-varying state, a
//! ticker that advances that state once per sample before the program runs.
//!
//! # Modules
//!
//! | Module | Words |
//! |---|---|
//! | [`operator`] | `op1 op1.sync op1.looped?` ... |
//! | [`envelope`] | `env1 env1.trig` ... |
//! | [`accumulator`] | `->mix1 mix1->` ... |
//! | [`register`] | `>A A` ... `>Z Z` |
//! | [`delay`] | `->delay1 delay1` ... |
//! | [`clock`] | `seq.tempo seq.step seq.trig?` |
//! | [`sequencer`] | `dseq1 dseq1.set vseq1 vseq1.set` ... |
//! | [`table`] | `itab1 itab1.set` ... |
//! | [`waves`] | `sine tri saw sqr clip` |
//! | [`sampler`] | one word per WAV file, named after its stem |
//! | [`midi`] | `midi.note midi.vel midi.gate midi.cc` |
//! | [`controls`] | `prompt srate m2f` |
//!
//! # Example
//!
//! ```rust
//! use forthwave_core::Runtime;
//! use forthwave_synth::{ModuleConfig, install};
//!
//! let runtime = Runtime::default();
//! let patch = install(&runtime, &ModuleConfig::default()).unwrap();
//!
//! runtime.build("220 op1 saw 0.2 * dup >out1 >out2").unwrap();
//! patch.prompt.set(1.0);
//!
//! let mut left = [0.0f32; 64];
//! let mut right = [0.0f32; 64];
//! runtime.process_block(&mut left, &mut right).unwrap();
//! ```

pub mod accumulator;
pub mod clock;
pub mod controls;
pub mod delay;
pub mod envelope;
pub mod error;
pub mod midi;
pub mod module;
pub mod operator;
pub mod register;
pub mod sampler;
pub mod sequencer;
pub mod table;
pub mod waves;

pub use error::ModuleError;
pub use midi::{MidiEvent, MidiSender};
pub use module::{Shared, Tick};

use forthwave_core::{ControlValue, Runtime};
use std::collections::HashMap;
use std::path::PathBuf;

/// Sizes of the module bank.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleConfig {
    /// Operators `op1..=opN`.
    pub operators: usize,
    /// Envelopes `env1..=envN`.
    pub envelopes: usize,
    /// Accumulators `mix1..=mixN`.
    pub mixers: usize,
    /// Delay lines `delay1..=delayN`.
    pub delays: usize,
    /// Gate and value sequences `dseq1..=dseqN`, `vseq1..=vseqN`.
    pub sequencers: usize,
    /// Interpolating tables `itab1..=itabN`.
    pub tables: usize,
    /// Steps per sequence and entries per table.
    pub steps: usize,
    /// Longest delay tap in seconds.
    pub max_delay_seconds: f64,
    /// WAV files or directories of WAV files.
    pub samples: Vec<PathBuf>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            operators: 8,
            envelopes: 8,
            mixers: 4,
            delays: 4,
            sequencers: 8,
            tables: 4,
            steps: 16,
            max_delay_seconds: 2.0,
            samples: Vec::new(),
        }
    }
}

/// Control-side handles to an installed bank.
#[derive(Debug, Clone)]
pub struct Patch {
    /// Value read by the `prompt` word.
    pub prompt: ControlValue,
    /// Feeds the `midi.*` words.
    pub midi: MidiSender,
    /// Words registered for sample files, in load order.
    pub samples: Vec<String>,
}

/// Register the full module bank into `runtime`.
///
/// Tickers are registered in this order: MIDI, clock, operators, envelopes,
/// delays, samplers. Sample files are loaded here; any failure aborts before
/// a program can run.
pub fn install(runtime: &Runtime, config: &ModuleConfig) -> Result<Patch, ModuleError> {
    let midi = midi::register(runtime);
    let seq = clock::register(runtime, "seq");

    for i in 1..=config.operators {
        operator::register(runtime, &format!("op{i}"));
    }
    for i in 1..=config.envelopes {
        envelope::register(runtime, &format!("env{i}"));
    }
    register::register_all(runtime);
    for i in 1..=config.mixers {
        accumulator::register(runtime, &format!("mix{i}"));
    }
    for i in 1..=config.delays {
        delay::register(runtime, &format!("delay{i}"), config.max_delay_seconds);
    }
    for i in 1..=config.sequencers {
        sequencer::register_gates(runtime, &format!("dseq{i}"), config.steps, &seq);
        sequencer::register_values(runtime, &format!("vseq{i}"), config.steps, &seq);
    }
    for i in 1..=config.tables {
        table::register(runtime, &format!("itab{i}"), config.steps);
    }

    let mut loaded: HashMap<String, PathBuf> = HashMap::new();
    let mut samples = Vec::new();
    for path in sampler::collect_sources(&config.samples)? {
        if let Some(name) = sampler::word_name(&path)
            && let Some(first) = loaded.get(&name)
        {
            return Err(ModuleError::DuplicateSample {
                name,
                first: first.clone(),
                second: path,
            });
        }
        let name = sampler::register(runtime, &path)?;
        loaded.insert(name.clone(), path);
        samples.push(name);
    }

    waves::register(runtime);
    let prompt = controls::register(runtime);

    tracing::info!(
        operators = config.operators,
        envelopes = config.envelopes,
        delays = config.delays,
        sequencers = config.sequencers,
        tables = config.tables,
        samples = samples.len(),
        "module bank installed"
    );

    Ok(Patch {
        prompt,
        midi,
        samples,
    })
}
