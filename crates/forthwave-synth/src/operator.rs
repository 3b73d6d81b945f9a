//! Phase accumulator.
//!
//! An operator is the timing core of an oscillator: a phase in `[0, 1)` that
//! advances by `frequency / sample_rate` every sample. Wave shapes are applied
//! by the program (`op1 sine`), so one operator can drive any waveform.
//!
//! | Word | Stack | Effect |
//! |---|---|---|
//! | `name` | `( hz -- phase )` | set the frequency, push the current phase |
//! | `name.sync` | `( flag -- )` | reset the phase to 0 when `flag` is non-zero |
//! | `name.looped?` | `( -- 0/1 )` | whether the phase wrapped since the last query |

use crate::module::{Tick, attach, native};
use forthwave_core::Runtime;

/// Phase accumulator state.
#[derive(Debug, Clone)]
pub struct Operator {
    phase: f64,
    increment: f64,
    looped: bool,
    sample_rate: f64,
}

impl Operator {
    /// Create an operator at phase 0 with zero frequency.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            phase: 0.0,
            increment: 0.0,
            looped: false,
            sample_rate,
        }
    }

    /// Set the frequency in Hz. Negative frequencies run the phase backwards.
    pub fn set_frequency(&mut self, hz: f64) {
        self.increment = hz / self.sample_rate;
    }

    /// Current phase in `[0, 1)`.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Reset the phase to 0.
    pub fn sync(&mut self) {
        self.phase = 0.0;
    }

    /// Whether the phase wrapped since the last call, clearing the flag.
    pub fn take_looped(&mut self) -> bool {
        core::mem::take(&mut self.looped)
    }
}

impl Tick for Operator {
    fn tick(&mut self) {
        let next = self.phase + self.increment;
        if (0.0..1.0).contains(&next) {
            self.phase = next;
        } else {
            self.phase = next.rem_euclid(1.0);
            // rem_euclid can round up to exactly 1.0 for tiny negative inputs
            if self.phase >= 1.0 {
                self.phase = 0.0;
            }
            self.looped = true;
        }
    }
}

/// Register operator `name` into `runtime`.
pub fn register(runtime: &Runtime, name: &str) {
    let op = attach(runtime, Operator::new(f64::from(runtime.sample_rate())));

    native(runtime, name, &op, |op, s| {
        op.set_frequency(s.pop()?);
        s.push(op.phase())
    });
    native(runtime, format!("{name}.sync"), &op, |op, s| {
        if s.pop()? != 0.0 {
            op.sync();
        }
        Ok(())
    });
    native(runtime, format!("{name}.looped?"), &op, |op, s| {
        s.push(f64::from(op.take_looped()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_and_wraps() {
        let mut op = Operator::new(4.0);
        op.set_frequency(1.0);
        let phases: Vec<f64> = (0..5)
            .map(|_| {
                op.tick();
                op.phase()
            })
            .collect();
        assert_eq!(phases, vec![0.25, 0.5, 0.75, 0.0, 0.25]);
        assert!(op.take_looped());
        assert!(!op.take_looped());
    }

    #[test]
    fn negative_frequency_wraps_into_range() {
        let mut op = Operator::new(4.0);
        op.set_frequency(-1.0);
        op.tick();
        assert_eq!(op.phase(), 0.75);
        assert!(op.take_looped());
    }

    #[test]
    fn words_drive_the_phase() {
        let runtime = Runtime::new(forthwave_core::RuntimeConfig {
            sample_rate: 8,
            ..Default::default()
        });
        register(&runtime, "op1");
        runtime.build("2 op1 >out1 op1.looped? >out2").unwrap();

        let mut left = [0.0; 6];
        let mut right = [0.0; 6];
        runtime.process_block(&mut left, &mut right).unwrap();
        // The first tick runs before any frequency is set.
        assert_eq!(left, [0.0, 0.25, 0.5, 0.75, 0.0, 0.25]);
        assert_eq!(right, [0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn sync_resets() {
        let runtime = Runtime::default();
        register(&runtime, "op");
        runtime.build("1000 op drop 1 op.sync 0 op >out1").unwrap();
        let mut left = [1.0; 4];
        let mut right = [0.0; 4];
        runtime.process_block(&mut left, &mut right).unwrap();
        assert!(left.iter().all(|&p| p == 0.0));
    }
}
