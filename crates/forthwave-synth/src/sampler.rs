//! One-shot sample playback from WAV files.
//!
//! Each file becomes one word named after its file stem (`kick.wav` ->
//! `kick`), with stack effect `( trig -- v )`: a non-zero trigger restarts
//! playback from the start, and the word pushes the current sample, or 0
//! once playback has finished. Files recorded at another rate are resampled
//! on the fly by linear interpolation.

use crate::error::ModuleError;
use crate::module::{Tick, attach, native};
use forthwave_core::Runtime;
use hound::{SampleFormat, WavReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Decoded mono sample data.
#[derive(Debug, Clone)]
pub struct SampleData {
    frames: Arc<[f64]>,
    sample_rate: u32,
}

impl SampleData {
    /// Wrap mono frames recorded at `sample_rate`.
    pub fn new(frames: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            frames: Arc::from(frames),
            sample_rate,
        }
    }

    /// Decode a WAV file, mixing all channels to mono.
    pub fn load(path: &Path) -> Result<Self, ModuleError> {
        let sample_error = |source| ModuleError::Sample {
            path: path.to_path_buf(),
            source,
        };
        let reader = WavReader::open(path).map_err(sample_error)?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels.max(1));

        let interleaved: Vec<f64> = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .map(|s| s.map(f64::from))
                .collect::<Result<_, _>>()
                .map_err(sample_error)?,
            SampleFormat::Int => {
                let scale = f64::from(1u32 << (spec.bits_per_sample.clamp(1, 32) - 1));
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| f64::from(v) / scale))
                    .collect::<Result<_, _>>()
                    .map_err(sample_error)?
            }
        };

        let frames = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f64>() / frame.len() as f64)
            .collect();

        Ok(Self::new(frames, spec.sample_rate))
    }

    /// Number of mono frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether there are no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Rate the data was recorded at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Playback state for one sample.
#[derive(Debug, Clone)]
pub struct Sampler {
    data: SampleData,
    /// Read position in source frames; `None` when stopped.
    position: Option<f64>,
    /// Source frames per output sample.
    step: f64,
}

impl Sampler {
    /// Create a stopped sampler playing `data` at `output_rate`.
    pub fn new(data: SampleData, output_rate: f64) -> Self {
        let step = f64::from(data.sample_rate) / output_rate;
        Self {
            data,
            position: None,
            step,
        }
    }

    /// Restart from the first frame.
    pub fn trigger(&mut self) {
        self.position = Some(0.0);
    }

    /// Whether playback is running.
    pub fn is_playing(&self) -> bool {
        self.position.is_some()
    }

    /// Current output value.
    pub fn value(&self) -> f64 {
        let Some(pos) = self.position else {
            return 0.0;
        };
        let frames = &self.data.frames;
        let i = pos as usize;
        let fraction = pos - i as f64;
        let a = frames.get(i).copied().unwrap_or(0.0);
        let b = frames.get(i + 1).copied().unwrap_or(0.0);
        a + (b - a) * fraction
    }
}

impl Tick for Sampler {
    fn tick(&mut self) {
        if let Some(pos) = self.position {
            let next = pos + self.step;
            self.position = (next < self.data.len() as f64).then_some(next);
        }
    }
}

/// Word name for a sample file: its stem.
pub fn word_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Expand sample sources: files are kept, directories contribute their
/// `*.wav` files in name order.
pub fn collect_sources(sources: &[PathBuf]) -> Result<Vec<PathBuf>, ModuleError> {
    let mut files = Vec::new();
    for source in sources {
        let meta = std::fs::metadata(source).map_err(|e| ModuleError::Io {
            path: source.clone(),
            source: e,
        })?;
        if meta.is_dir() {
            let entries = std::fs::read_dir(source).map_err(|e| ModuleError::Io {
                path: source.clone(),
                source: e,
            })?;
            let mut wavs: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| {
                    p.is_file()
                        && p.extension()
                            .and_then(|e| e.to_str())
                            .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
                })
                .collect();
            wavs.sort();
            files.extend(wavs);
        } else {
            files.push(source.clone());
        }
    }
    Ok(files)
}

/// Load `path` and register it under its stem. Returns the word name.
pub fn register(runtime: &Runtime, path: &Path) -> Result<String, ModuleError> {
    let name = word_name(path).ok_or_else(|| ModuleError::InvalidName {
        path: path.to_path_buf(),
    })?;
    let data = SampleData::load(path)?;
    tracing::debug!(
        word = %name,
        frames = data.len(),
        rate = data.sample_rate(),
        "sample loaded"
    );
    let sampler = attach(
        runtime,
        Sampler::new(data, f64::from(runtime.sample_rate())),
    );
    native(runtime, name.clone(), &sampler, |sampler, s| {
        if s.pop()? != 0.0 {
            sampler.trigger();
        }
        s.push(sampler.value())
    });
    Ok(name)
}
