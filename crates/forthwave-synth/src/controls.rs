//! Words that connect the program to the outside world.
//!
//! - `prompt ( -- v )` - the value last entered on the console
//! - `srate ( -- hz )` - output sample rate, compiled as a constant
//! - `m2f ( note -- hz )` - MIDI note number to frequency, A4 = 440 Hz

use forthwave_core::{ControlValue, Runtime};

/// Frequency of MIDI note `note` in equal temperament.
#[inline]
pub fn midi_to_hz(note: f64) -> f64 {
    440.0 * libm::exp2((note - 69.0) / 12.0)
}

/// Register `prompt`, `srate` and `m2f`. Returns the value behind `prompt`.
pub fn register(runtime: &Runtime) -> ControlValue {
    let prompt = ControlValue::new(0.0);
    let value = prompt.clone();
    runtime.register("prompt", move |s| s.push(value.get()));
    runtime.register_literal("srate", f64::from(runtime.sample_rate()));
    runtime.register("m2f", |s| {
        let note = s.pop()?;
        s.push(midi_to_hz(note))
    });
    prompt
}
