//! Feedback-capable delay line.
//!
//! Writes made by the program during one sample are summed and committed to
//! the buffer by the next tick, so a tap of `d` seconds returns what was
//! written `d * sample_rate` samples earlier. Fractional delays are linearly
//! interpolated.
//!
//! | Word | Stack | Effect |
//! |---|---|---|
//! | `->name` | `( v -- )` | add `v` to this sample's input |
//! | `name` | `( seconds -- v )` | read a tap, clamped to `[1 sample, max]` |
//!
//! Feedback is a read and a write in the same run:
//! `0.25 delay1 0.5 * 220 op1 saw + ->delay1`.

use crate::module::{Tick, attach, native};
use forthwave_core::Runtime;

/// Circular buffer delay line. The buffer is allocated once.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f64>,
    /// Index of the next slot to commit into.
    head: usize,
    input: f64,
    sample_rate: f64,
}

impl DelayLine {
    /// Create a delay line holding up to `max_seconds` of history.
    pub fn new(sample_rate: f64, max_seconds: f64) -> Self {
        let len = (sample_rate * max_seconds.max(0.0)).ceil() as usize + 2;
        Self {
            buffer: vec![0.0; len],
            head: 0,
            input: 0.0,
            sample_rate,
        }
    }

    /// Longest tap in samples.
    pub fn max_delay(&self) -> f64 {
        (self.buffer.len() - 1) as f64
    }

    /// Add to this sample's input.
    pub fn write(&mut self, value: f64) {
        self.input += value;
    }

    /// Read a tap `delay` samples back, with linear interpolation.
    pub fn read(&self, delay: f64) -> f64 {
        let delay = delay.clamp(1.0, self.max_delay());
        let len = self.buffer.len();
        let whole = delay.floor();
        let fraction = delay - whole;
        let whole = whole as usize;

        let newer = self.buffer[(self.head + len - whole) % len];
        let older = self.buffer[(self.head + len - whole - 1) % len];
        if fraction == 0.0 {
            newer
        } else {
            newer + (older - newer) * fraction
        }
    }

    /// Read a tap `seconds` back.
    pub fn read_seconds(&self, seconds: f64) -> f64 {
        self.read(seconds * self.sample_rate)
    }
}

impl Tick for DelayLine {
    fn tick(&mut self) {
        self.buffer[self.head] = core::mem::take(&mut self.input);
        self.head = (self.head + 1) % self.buffer.len();
    }
}

/// Register delay line `name` into `runtime`.
pub fn register(runtime: &Runtime, name: &str, max_seconds: f64) {
    let line = attach(
        runtime,
        DelayLine::new(f64::from(runtime.sample_rate()), max_seconds),
    );
    native(runtime, format!("->{name}"), &line, |line, s| {
        line.write(s.pop()?);
        Ok(())
    });
    native(runtime, name, &line, |line, s| {
        let seconds = s.pop()?;
        s.push(line.read_seconds(seconds))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(line: &mut DelayLine, values: &[f64]) {
        for &v in values {
            line.write(v);
            line.tick();
        }
    }

    #[test]
    fn integer_delay() {
        let mut line = DelayLine::new(10.0, 1.0);
        feed(&mut line, &[1.0, 2.0, 3.0]);
        assert_eq!(line.read(1.0), 3.0);
        assert_eq!(line.read(3.0), 1.0);
        assert_eq!(line.read(4.0), 0.0);
    }

    #[test]
    fn fractional_delay_interpolates() {
        let mut line = DelayLine::new(10.0, 1.0);
        feed(&mut line, &[2.0, 4.0]);
        assert_eq!(line.read(1.5), 3.0);
    }

    #[test]
    fn taps_are_clamped() {
        let mut line = DelayLine::new(4.0, 1.0);
        feed(&mut line, &[7.0, 8.0]);
        assert_eq!(line.read(0.0), 8.0);
        assert_eq!(line.read(-5.0), 8.0);
        assert_eq!(line.max_delay(), 5.0);
        assert!(line.read(1.0e9).is_finite());
    }

    #[test]
    fn writes_in_one_sample_are_summed() {
        let mut line = DelayLine::new(10.0, 1.0);
        line.write(0.25);
        line.write(0.5);
        line.tick();
        assert_eq!(line.read(1.0), 0.75);
    }

    #[test]
    fn wraps_around() {
        let mut line = DelayLine::new(2.0, 1.0);
        feed(&mut line, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(line.read(1.0), 6.0);
        assert_eq!(line.read(3.0), 4.0);
    }

    #[test]
    fn words_delay_by_seconds() {
        let runtime = Runtime::new(forthwave_core::RuntimeConfig {
            sample_rate: 4,
            ..Default::default()
        });
        register(&runtime, "d", 1.0);
        runtime.register("impulse", {
            let first = std::sync::atomic::AtomicBool::new(true);
            move |s| s.push(f64::from(first.swap(false, std::sync::atomic::Ordering::Relaxed)))
        });
        runtime.build("impulse ->d 0.5 d >out1").unwrap();
        let mut left = [0.0; 4];
        let mut right = [0.0; 4];
        runtime.process_block(&mut left, &mut right).unwrap();
        assert_eq!(left, [0.0, 0.0, 1.0, 0.0]);
    }
}
