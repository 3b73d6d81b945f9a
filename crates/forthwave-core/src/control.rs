//! Values shared between control threads and the audio thread.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Global play/stop flag. Cloning shares the flag.
///
/// Starts stopped. Sequencing modules advance only while playing; the
/// program itself runs regardless.
#[derive(Debug, Clone, Default)]
pub struct Transport(Arc<AtomicBool>);

impl Transport {
    /// Create a transport in the given state.
    pub fn new(playing: bool) -> Self {
        Self(Arc::new(AtomicBool::new(playing)))
    }

    /// Whether the transport is running.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Set the state.
    pub fn set(&self, playing: bool) {
        self.0.store(playing, Ordering::Release);
    }

    /// Flip the state and return the new one.
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::AcqRel)
    }
}

/// A scalar written by a control thread and read by a native.
///
/// The lock is held only for the load or store, so the audio thread never
/// waits behind anything longer than a copy.
#[derive(Debug, Clone, Default)]
pub struct ControlValue(Arc<Mutex<f64>>);

impl ControlValue {
    /// Create a value.
    pub fn new(value: f64) -> Self {
        Self(Arc::new(Mutex::new(value)))
    }

    /// Read the current value.
    #[inline]
    pub fn get(&self) -> f64 {
        *self.0.lock()
    }

    /// Replace the current value.
    pub fn set(&self, value: f64) {
        *self.0.lock() = value;
    }
}
