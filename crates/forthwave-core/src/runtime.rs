//! The runtime: dictionary, scheduler and the locking between them.
//!
//! Two locks, always taken in this order:
//!
//! - the dictionary lock (`RwLock`), taken only by control threads for
//!   registration, compilation and listings
//! - the scheduler lock (`Mutex`), taken by the audio thread once per buffer
//!   and by control threads just long enough to swap a finished program in
//!
//! Compilation happens entirely under the dictionary lock, so the audio
//! thread never waits for it. The longest the audio thread can wait on the
//! scheduler lock is one program swap or one stack snapshot; the longest a
//! control thread can wait is one buffer render. Replaced programs are
//! dropped after the scheduler lock is released.

use crate::collection::Collection;
use crate::compiler::compile;
use crate::control::Transport;
use crate::dictionary::{Dictionary, Operation, OperationKind};
use crate::error::{CompileError, RuntimeError, StackError};
use crate::machine::Machine;
use crate::stack::{DEFAULT_STACK_LIMIT, Stack};
use crate::token::tokenize;
use crate::words;
use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::{Mutex, RwLock};

/// Construction parameters for a [`Runtime`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Operand stack depth ceiling.
    pub stack_limit: usize,
    /// Capacity of the fault channel. Faults beyond it are dropped.
    pub fault_queue: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            stack_limit: DEFAULT_STACK_LIMIT,
            fault_queue: 64,
        }
    }
}

/// Summary of a successful build.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildReport {
    /// Top-level instructions in the installed program.
    pub instructions: usize,
    /// Words the source defined, in definition order.
    pub definitions: Vec<String>,
}

/// A live-codable interpreter bound to a sample scheduler.
///
/// Share it with `Arc`: the audio callback calls
/// [`process_block`](Self::process_block), control threads call
/// [`build`](Self::build) and friends.
pub struct Runtime {
    dictionary: RwLock<Dictionary>,
    collection: Mutex<Collection>,
    transport: Transport,
    sample_rate: u32,
    fault_tx: Sender<RuntimeError>,
    fault_rx: Receiver<RuntimeError>,
}

impl Runtime {
    /// Create a runtime with the built-in words registered and no program
    /// installed.
    pub fn new(config: RuntimeConfig) -> Self {
        let collection = Collection::new(Machine::new(config.stack_limit));
        let outputs = collection.outputs();
        let transport = Transport::default();
        let mut dictionary = Dictionary::new();
        words::install(&mut dictionary, &outputs, &transport);
        let (fault_tx, fault_rx) = bounded(config.fault_queue.max(1));

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sample_rate = config.sample_rate,
            stack_limit = config.stack_limit,
            builtins = dictionary.len(),
            "runtime created"
        );

        Self {
            dictionary: RwLock::new(dictionary),
            collection: Mutex::new(collection),
            transport,
            sample_rate: config.sample_rate,
            fault_tx,
            fault_rx,
        }
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The transport flag shared with modules.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Flip the transport and return the new state.
    pub fn toggle_transport(&self) -> bool {
        let playing = self.transport.toggle();
        #[cfg(feature = "tracing")]
        tracing::debug!(playing, "transport toggled");
        playing
    }

    /// Register a native, replacing any entry under `name`.
    ///
    /// Programs already installed keep the binding they were compiled with.
    pub fn register<F>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(&mut Stack) -> Result<(), StackError> + Send + Sync + 'static,
    {
        self.dictionary.write().register(name, f);
    }

    /// Register a named constant.
    pub fn register_literal(&self, name: impl Into<String>, value: f64) {
        self.dictionary
            .write()
            .define(name, Operation::Literal(value));
    }

    /// Append a per-sample ticker. Tickers run in registration order.
    pub fn register_tick<F>(&self, tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.collection.lock().register(Box::new(tick));
    }

    /// Compile `source` and install it.
    ///
    /// On failure nothing changes: the dictionary keeps its entries and the
    /// running program keeps running.
    pub fn build(&self, source: &str) -> Result<BuildReport, CompileError> {
        let mut dictionary = self.dictionary.write();
        let compiled = match compile(tokenize(source), &dictionary) {
            Ok(compiled) => compiled,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %err, "build rejected");
                return Err(err);
            }
        };
        let definitions: Vec<String> = compiled.definition_names().map(str::to_string).collect();
        let program = compiled.commit(&mut dictionary);
        let instructions = program.len();

        let (replaced, retired) = {
            let mut collection = self.collection.lock();
            (collection.install(program), collection.take_retired())
        };
        drop(dictionary);
        drop(replaced);
        drop(retired);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            instructions,
            definitions = definitions.len(),
            "program installed"
        );

        Ok(BuildReport {
            instructions,
            definitions,
        })
    }

    /// [`build`](Self::build) from raw bytes.
    pub fn build_bytes(&self, source: &[u8]) -> Result<BuildReport, CompileError> {
        self.build(std::str::from_utf8(source)?)
    }

    /// Render one buffer. Called from the audio thread.
    ///
    /// Fills `min(left.len(), right.len())` frames. A fault is also queued on
    /// the [`faults`](Self::faults) channel without blocking.
    pub fn process_block(&self, left: &mut [f32], right: &mut [f32]) -> Result<(), RuntimeError> {
        // A program retired by a fault stays parked in the scheduler until
        // the next build, so its memory is never freed on this thread.
        let result = self.collection.lock().render(left, right);
        if let Err(err) = &result {
            // Dropped when full; the receiver already has faults to report.
            let _ = self.fault_tx.try_send(err.clone());
        }
        result
    }

    /// Receiver for faults raised by [`process_block`](Self::process_block).
    pub fn faults(&self) -> Receiver<RuntimeError> {
        self.fault_rx.clone()
    }

    /// Whether a program is installed.
    pub fn has_program(&self) -> bool {
        self.collection.lock().machine().has_program()
    }

    /// Copy of the operand stack, bottom to top.
    pub fn stack_snapshot(&self) -> Vec<f64> {
        self.collection.lock().machine().stack().as_slice().to_vec()
    }

    /// Every dictionary entry with its kind, sorted by name.
    pub fn words(&self) -> Vec<(String, OperationKind)> {
        let dictionary = self.dictionary.read();
        let mut words: Vec<(String, OperationKind)> = dictionary
            .entries()
            .map(|(name, op)| (name.to_string(), op.kind()))
            .collect();
        words.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        words
    }

    /// Whether `name` resolves.
    pub fn contains(&self, name: &str) -> bool {
        self.dictionary.read().contains(name)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl core::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Runtime")
            .field("sample_rate", &self.sample_rate)
            .field("playing", &self.transport.is_playing())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn render(runtime: &Runtime, frames: usize) -> (Vec<f32>, Vec<f32>, Result<(), RuntimeError>) {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        let result = runtime.process_block(&mut left, &mut right);
        (left, right, result)
    }

    #[test]
    fn starts_empty_and_silent() {
        let runtime = Runtime::default();
        assert!(!runtime.has_program());
        let (left, right, result) = render(&runtime, 16);
        assert!(result.is_ok());
        assert!(left.iter().chain(&right).all(|&s| s == 0.0));
    }

    #[test]
    fn build_reports_definitions() {
        let runtime = Runtime::default();
        let report = runtime.build(": double 2 * ; 5 double drop").unwrap();
        assert_eq!(report.instructions, 3);
        assert_eq!(report.definitions, vec!["double".to_string()]);
        assert!(runtime.contains("double"));
    }

    #[test]
    fn failed_build_keeps_running_program() {
        let runtime = Runtime::default();
        runtime.build("0.5 >out1").unwrap();
        let err = runtime.build(": extra 1 ; 7 bogus").unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedWord { ref name, .. } if name == "bogus"));
        assert!(!runtime.contains("extra"));

        let (left, _, result) = render(&runtime, 4);
        assert!(result.is_ok());
        assert_eq!(left, vec![0.5; 4]);
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let runtime = Runtime::default();
        let err = runtime.build_bytes(&[0x31, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, CompileError::InvalidEncoding(_)));
    }

    #[test]
    fn fault_is_queued_and_silences_until_rebuild() {
        let runtime = Runtime::default();
        let faults = runtime.faults();
        runtime.build("1 >out1 drop").unwrap();

        let (left, _, result) = render(&runtime, 8);
        assert!(result.is_err());
        assert_eq!(left, vec![0.0; 8]);
        assert_eq!(faults.try_recv().map(|e| e.word().to_string()), Ok("drop".to_string()));
        assert!(!runtime.has_program());

        let (_, _, result) = render(&runtime, 8);
        assert!(result.is_ok());
        assert!(faults.try_recv().is_err());

        runtime.build("0.25 >out2").unwrap();
        let (_, right, result) = render(&runtime, 2);
        assert!(result.is_ok());
        assert_eq!(right, vec![0.25; 2]);
    }

    #[test]
    fn full_fault_queue_does_not_block() {
        let runtime = Runtime::new(RuntimeConfig {
            fault_queue: 1,
            ..RuntimeConfig::default()
        });
        for _ in 0..3 {
            runtime.build("drop").unwrap();
            let (_, _, result) = render(&runtime, 1);
            assert!(result.is_err());
        }
        assert_eq!(runtime.faults().len(), 1);
    }

    #[test]
    fn literals_and_natives_from_modules() {
        let runtime = Runtime::default();
        runtime.register_literal("half", 0.5);
        runtime.register("twice", |s| {
            let v = s.pop()?;
            s.push(v * 2.0)
        });
        runtime.build("half twice >out1").unwrap();
        let (left, _, _) = render(&runtime, 1);
        assert_eq!(left, vec![1.0]);
    }

    #[test]
    fn ticks_run_every_sample() {
        let runtime = Runtime::default();
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        runtime.register_tick(move || {
            seen.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        });
        render(&runtime, 32);
        assert_eq!(counter.load(std::sync::atomic::Ordering::Relaxed), 32);
    }

    #[test]
    fn stack_persists_across_samples() {
        let runtime = Runtime::default();
        runtime.build("1").unwrap();
        render(&runtime, 3);
        assert_eq!(runtime.stack_snapshot(), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn words_are_sorted_with_kinds() {
        let runtime = Runtime::default();
        runtime.build(": mine 1 ;").unwrap();
        let words = runtime.words();
        assert!(words.windows(2).all(|w| w[0].0 <= w[1].0));
        assert!(words.contains(&("mine".to_string(), OperationKind::Word)));
        assert!(words.contains(&("pi".to_string(), OperationKind::Literal)));
        assert!(words.contains(&(">out1".to_string(), OperationKind::Native)));
    }

    #[test]
    fn oversized_stack_limit_is_clamped() {
        let runtime = Runtime::new(RuntimeConfig {
            stack_limit: usize::MAX / 8 + 1,
            ..RuntimeConfig::default()
        });
        runtime.build("1").unwrap();
        render(&runtime, 4);
        assert_eq!(runtime.stack_snapshot().len(), 4);
    }

    #[test]
    fn toggle_transport_flips() {
        let runtime = Runtime::default();
        assert!(runtime.toggle_transport());
        assert!(runtime.transport().is_playing());
        assert!(!runtime.toggle_transport());
    }
}
