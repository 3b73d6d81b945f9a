//! Audio boundary for forthwave.
//!
//! This crate provides:
//!
//! - **Real-time output**: [`AudioStream`] pulls stereo blocks from a callback
//!   and interleaves them into whatever channel layout the device has
//! - **Offline rendering**: [`write_wav_stereo`] saves rendered blocks as a
//!   32-bit float WAV file
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use forthwave_io::{AudioStream, StreamConfig};
//!
//! let mut stream = AudioStream::new(StreamConfig::default())?;
//! stream.start_stereo(|left, right| {
//!     left.fill(0.0);
//!     right.fill(0.0);
//! })?;
//! ```

mod stream;
mod wav;

pub use stream::{
    AudioDevice, AudioStream, Interleaver, StreamConfig, default_output_device, list_devices,
};
pub use wav::{WavSpec, write_wav_stereo};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
