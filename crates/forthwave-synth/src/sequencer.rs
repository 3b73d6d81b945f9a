//! Step patterns driven by the [`Clock`](crate::clock::Clock).
//!
//! Both kinds hold a fixed-length pattern indexed by the clock's step count
//! modulo the pattern length. Patterns are edited from the program itself,
//! typically once at the top of a patch.
//!
//! Gate sequence `dseqN`:
//!
//! | Word | Stack | Effect |
//! |---|---|---|
//! | `dseqN` | `( -- 0/1 )` | 1 on the first sample of an active step |
//! | `dseqN.set` | `( on idx -- )` | enable or disable step `idx` |
//!
//! Value sequence `vseqN`:
//!
//! | Word | Stack | Effect |
//! |---|---|---|
//! | `vseqN` | `( -- v )` | value of the current step |
//! | `vseqN.set` | `( v idx -- )` | set step `idx` |

use crate::clock::Clock;
use crate::module::{Shared, native, share};
use forthwave_core::Runtime;
use std::sync::Arc;

/// Wrap a step index into `0..len`. Negative indices count from the end.
fn slot(index: f64, len: usize) -> usize {
    (index.floor() as i64).rem_euclid(len as i64) as usize
}

/// A pattern of on/off steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateSequence {
    steps: Vec<bool>,
}

impl GateSequence {
    /// Create an all-off pattern. `len` is raised to at least 1.
    pub fn new(len: usize) -> Self {
        Self {
            steps: vec![false; len.max(1)],
        }
    }

    /// Enable or disable a step.
    pub fn set(&mut self, index: f64, on: bool) {
        let i = slot(index, self.steps.len());
        self.steps[i] = on;
    }

    /// Whether the step at `step` is enabled.
    pub fn is_active(&self, step: u64) -> bool {
        self.steps[(step % self.steps.len() as u64) as usize]
    }
}

/// A pattern of values.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSequence {
    steps: Vec<f64>,
}

impl ValueSequence {
    /// Create an all-zero pattern. `len` is raised to at least 1.
    pub fn new(len: usize) -> Self {
        Self {
            steps: vec![0.0; len.max(1)],
        }
    }

    /// Set a step.
    pub fn set(&mut self, index: f64, value: f64) {
        let i = slot(index, self.steps.len());
        self.steps[i] = value;
    }

    /// Value at `step`.
    pub fn value(&self, step: u64) -> f64 {
        self.steps[(step % self.steps.len() as u64) as usize]
    }
}

/// Register gate sequence `name` following `clock`.
pub fn register_gates(runtime: &Runtime, name: &str, steps: usize, clock: &Shared<Clock>) {
    let seq = share(GateSequence::new(steps));
    let clock = Arc::clone(clock);
    native(runtime, name, &seq, move |seq, s| {
        let (step, trig) = {
            let clock = clock.lock();
            (clock.step(), clock.triggered())
        };
        s.push(f64::from(trig && seq.is_active(step)))
    });
    native(runtime, format!("{name}.set"), &seq, |seq, s| {
        let (on, index) = s.pop2()?;
        seq.set(index, on != 0.0);
        Ok(())
    });
}

/// Register value sequence `name` following `clock`.
pub fn register_values(runtime: &Runtime, name: &str, steps: usize, clock: &Shared<Clock>) {
    let seq = share(ValueSequence::new(steps));
    let clock = Arc::clone(clock);
    native(runtime, name, &seq, move |seq, s| {
        let step = clock.lock().step();
        s.push(seq.value(step))
    });
    native(runtime, format!("{name}.set"), &seq, |seq, s| {
        let (value, index) = s.pop2()?;
        seq.set(index, value);
        Ok(())
    });
}
