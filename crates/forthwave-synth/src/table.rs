//! Interpolating lookup tables.
//!
//! A table is a ring of values filled from the program and read back at any
//! real position, blending linearly between neighbouring entries. Reading
//! with a scaled operator phase turns a table into a wavetable oscillator:
//! `220 op1 16 * itab1` sweeps a 16-entry table at 220 Hz.
//!
//! | Word | Stack | Effect |
//! |---|---|---|
//! | `itabN` | `( x -- v )` | value at position `x`, wrapping |
//! | `itabN.set` | `( v idx -- )` | set entry `idx` |

use crate::module::{native, share};
use forthwave_core::Runtime;

/// A ring of values read with linear interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatingTable {
    entries: Vec<f64>,
}

impl InterpolatingTable {
    /// Create an all-zero table. `len` is raised to at least 1.
    pub fn new(len: usize) -> Self {
        Self {
            entries: vec![0.0; len.max(1)],
        }
    }

    /// Set an entry. Indices wrap; negative indices count from the end.
    pub fn set(&mut self, index: f64, value: f64) {
        let len = self.entries.len() as i64;
        let i = (index.floor() as i64).rem_euclid(len) as usize;
        self.entries[i] = value;
    }

    /// Value at `position`, between entry `floor(position)` and the next one.
    ///
    /// The last entry blends back into the first. Non-finite positions read 0.
    pub fn read(&self, position: f64) -> f64 {
        if !position.is_finite() {
            return 0.0;
        }
        let len = self.entries.len();
        let wrapped = position.rem_euclid(len as f64);
        let base = wrapped.floor();
        let frac = wrapped - base;
        let i = (base as usize).min(len - 1);
        let a = self.entries[i];
        let b = self.entries[(i + 1) % len];
        a + (b - a) * frac
    }
}

/// Register table `name` with `len` entries.
pub fn register(runtime: &Runtime, name: &str, len: usize) {
    let table = share(InterpolatingTable::new(len));
    native(runtime, name, &table, |table, s| {
        let position = s.pop()?;
        s.push(table.read(position))
    });
    native(runtime, format!("{name}.set"), &table, |table, s| {
        let (value, index) = s.pop2()?;
        table.set(index, value);
        Ok(())
    });
}
