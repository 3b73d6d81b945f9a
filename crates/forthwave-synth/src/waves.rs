//! Stateless wave shapes and a hard clipper.
//!
//! Shapes take a phase (any real; only the fractional part matters) and
//! return a value in `[-1, 1]`:
//!
//! - `sine` - `sin(2 pi p)`
//! - `tri` - triangle, 0 at phase 0 rising to 1 at 0.25
//! - `saw` - rising ramp from -1 to 1
//! - `sqr` - 1 for the first half cycle, -1 for the second
//! - `clip ( v -- v' )` - clamp to `[-1, 1]`

use core::f64::consts::TAU;
use forthwave_core::Runtime;

/// Fractional part in `[0, 1)`.
#[inline]
fn frac(phase: f64) -> f64 {
    phase - libm::floor(phase)
}

/// Sine of a normalized phase.
#[inline]
pub fn sine(phase: f64) -> f64 {
    libm::sin(TAU * phase)
}

/// Triangle of a normalized phase.
#[inline]
pub fn tri(phase: f64) -> f64 {
    let p = frac(phase + 0.25);
    1.0 - 4.0 * (p - 0.5).abs()
}

/// Sawtooth of a normalized phase.
#[inline]
pub fn saw(phase: f64) -> f64 {
    2.0 * frac(phase) - 1.0
}

/// Square of a normalized phase.
#[inline]
pub fn sqr(phase: f64) -> f64 {
    if frac(phase) < 0.5 { 1.0 } else { -1.0 }
}

/// Clamp to `[-1, 1]`.
#[inline]
pub fn clip(value: f64) -> f64 {
    value.clamp(-1.0, 1.0)
}

/// Register `sine tri saw sqr clip`.
pub fn register(runtime: &Runtime) {
    let shapes: [(&str, fn(f64) -> f64); 5] = [
        ("sine", sine),
        ("tri", tri),
        ("saw", saw),
        ("sqr", sqr),
        ("clip", clip),
    ];
    for (name, f) in shapes {
        runtime.register(name, move |s| {
            let v = s.pop()?;
            s.push(f(v))
        });
    }
}
