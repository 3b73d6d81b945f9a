//! Per-sample scheduling: ticks, one program run, output registers.
//!
//! Each output sample is produced by the same fixed sequence:
//!
//! 1. every registered ticker, in registration order
//! 2. both output registers reset to zero
//! 3. one run of the installed program
//! 4. the output registers read into the sample slot
//!
//! A sample only ever sees ticks that happened before its own run, and a
//! register left unwritten by the run yields silence on that channel.

use crate::error::RuntimeError;
use crate::machine::Machine;
use crate::program::Program;
use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Per-sample state-advance callback contributed by a module.
pub type Ticker = Box<dyn FnMut() + Send>;

/// The two output registers, written by `>out1` and `>out2`.
///
/// Stored as `f32` bit patterns so the writing natives need no lock.
#[derive(Debug, Default)]
pub struct Outputs {
    left: AtomicU32,
    right: AtomicU32,
}

impl Outputs {
    /// Create zeroed registers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the left register.
    #[inline]
    pub fn set_left(&self, value: f32) {
        self.left.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Write the right register.
    #[inline]
    pub fn set_right(&self, value: f32) {
        self.right.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Zero both registers.
    #[inline]
    pub fn reset(&self) {
        self.left.store(0, Ordering::Relaxed);
        self.right.store(0, Ordering::Relaxed);
    }

    /// Read `(left, right)`.
    #[inline]
    pub fn get(&self) -> (f32, f32) {
        (
            f32::from_bits(self.left.load(Ordering::Relaxed)),
            f32::from_bits(self.right.load(Ordering::Relaxed)),
        )
    }
}

/// The sample scheduler.
///
/// Owned by the runtime behind its scheduler lock; every method here runs
/// with that lock held.
pub struct Collection {
    machine: Machine,
    outputs: Arc<Outputs>,
    tickers: Vec<Ticker>,
    retired: Option<Program>,
}

impl Collection {
    /// Create a scheduler around `machine`.
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            outputs: Arc::new(Outputs::new()),
            tickers: Vec::new(),
            retired: None,
        }
    }

    /// Append a ticker. Tickers run in registration order.
    pub fn register(&mut self, ticker: Ticker) {
        self.tickers.push(ticker);
    }

    /// Number of registered tickers.
    pub fn ticker_count(&self) -> usize {
        self.tickers.len()
    }

    /// The output registers, for wiring output natives.
    pub fn outputs(&self) -> Arc<Outputs> {
        Arc::clone(&self.outputs)
    }

    /// The stack machine.
    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Install a program, returning the replaced one.
    pub fn install(&mut self, program: Program) -> Option<Program> {
        self.machine.install(program)
    }

    /// Produce one stereo sample.
    ///
    /// On a fault the program is uninstalled, the stack cleared and the
    /// sample is silence; later samples stay silent until a new program is
    /// installed. Tickers keep running either way.
    pub fn step(&mut self) -> Result<(f32, f32), RuntimeError> {
        for tick in &mut self.tickers {
            tick();
        }
        self.outputs.reset();
        if let Err(err) = self.machine.run() {
            self.retire();
            return Err(err);
        }
        Ok(self.outputs.get())
    }

    /// Fill a stereo buffer pair, one [`step`](Self::step) per frame.
    ///
    /// Renders `min(left.len(), right.len())` frames. The first fault is
    /// returned after the whole buffer has been written.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) -> Result<(), RuntimeError> {
        let mut fault = None;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            match self.step() {
                Ok((a, b)) => {
                    *l = a;
                    *r = b;
                }
                Err(err) => {
                    *l = 0.0;
                    *r = 0.0;
                    fault.get_or_insert(err);
                }
            }
        }
        fault.map_or(Ok(()), Err)
    }

    /// Take the program uninstalled by the last fault, so it can be dropped
    /// outside the scheduler lock.
    pub fn take_retired(&mut self) -> Option<Program> {
        self.retired.take()
    }

    fn retire(&mut self) {
        if let Some(program) = self.machine.uninstall() {
            self.retired = Some(program);
        }
        self.machine.clear_stack();
        self.outputs.reset();
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("machine", &self.machine)
            .field("tickers", &self.tickers.len())
            .field("retired", &self.retired.is_some())
            .finish_non_exhaustive()
    }
}
