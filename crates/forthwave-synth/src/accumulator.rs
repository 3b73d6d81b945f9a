//! Summing bus.
//!
//! | Word | Stack | Effect |
//! |---|---|---|
//! | `->name` | `( v -- )` | add `v` to the running total |
//! | `name->` | `( -- total )` | push the total and reset it to 0 |

use crate::module::{native, share};
use forthwave_core::Runtime;

/// Running total.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulator {
    total: f64,
}

impl Accumulator {
    /// Add to the total.
    pub fn add(&mut self, value: f64) {
        self.total += value;
    }

    /// Return the total and reset it.
    pub fn take(&mut self) -> f64 {
        core::mem::take(&mut self.total)
    }
}

/// Register accumulator `name` into `runtime`.
pub fn register(runtime: &Runtime, name: &str) {
    let acc = share(Accumulator::default());
    native(runtime, format!("->{name}"), &acc, |acc, s| {
        acc.add(s.pop()?);
        Ok(())
    });
    native(runtime, format!("{name}->"), &acc, |acc, s| s.push(acc.take()));
}
