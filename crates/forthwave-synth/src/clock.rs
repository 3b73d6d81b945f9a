//! Step clock for sequencers.
//!
//! The clock divides each beat into four steps and only advances while the
//! transport is playing. Starting the transport restarts at step 0 and
//! raises the trigger on that first sample.
//!
//! | Word | Stack | Effect |
//! |---|---|---|
//! | `seq.tempo` | `( bpm -- )` | set the tempo |
//! | `seq.step` | `( -- n )` | push the current step count |
//! | `seq.trig?` | `( -- 0/1 )` | 1 on the first sample of each step |

use crate::module::{Shared, Tick, attach, native};
use forthwave_core::{Runtime, Transport};

/// Steps per beat.
pub const STEPS_PER_BEAT: f64 = 4.0;

/// Tempo the clock starts at.
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Step clock state.
#[derive(Debug, Clone)]
pub struct Clock {
    transport: Transport,
    sample_rate: f64,
    samples_per_step: f64,
    position: f64,
    step: u64,
    trig: bool,
    was_playing: bool,
}

impl Clock {
    /// Create a stopped clock following `transport`.
    pub fn new(sample_rate: f64, transport: Transport) -> Self {
        let mut clock = Self {
            transport,
            sample_rate,
            samples_per_step: 1.0,
            position: 0.0,
            step: 0,
            trig: false,
            was_playing: false,
        };
        clock.set_tempo(DEFAULT_TEMPO);
        clock
    }

    /// Set the tempo in beats per minute. Non-positive tempos are ignored.
    pub fn set_tempo(&mut self, bpm: f64) {
        if bpm > 0.0 && bpm.is_finite() {
            self.samples_per_step = self.sample_rate * 60.0 / (bpm * STEPS_PER_BEAT);
        }
    }

    /// Steps since the transport started.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Whether a step started on this sample.
    pub fn triggered(&self) -> bool {
        self.trig
    }
}

impl Tick for Clock {
    fn tick(&mut self) {
        let playing = self.transport.is_playing();
        self.trig = false;
        if playing && !self.was_playing {
            self.position = 0.0;
            self.step = 0;
            self.trig = true;
        } else if playing {
            self.position += 1.0;
            if self.position >= self.samples_per_step {
                self.position -= self.samples_per_step;
                self.step += 1;
                self.trig = true;
            }
        }
        self.was_playing = playing;
    }
}

/// Register the clock words under `name` and return the clock for
/// sequencers to follow.
pub fn register(runtime: &Runtime, name: &str) -> Shared<Clock> {
    let clock = attach(
        runtime,
        Clock::new(f64::from(runtime.sample_rate()), runtime.transport().clone()),
    );
    native(runtime, format!("{name}.tempo"), &clock, |clock, s| {
        clock.set_tempo(s.pop()?);
        Ok(())
    });
    native(runtime, format!("{name}.step"), &clock, |clock, s| {
        s.push(clock.step() as f64)
    });
    native(runtime, format!("{name}.trig?"), &clock, |clock, s| {
        s.push(f64::from(clock.triggered()))
    });
    clock
}
