//! Real-time audio output via cpal.

use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Extract device name via `description()` (cpal 0.17+).
fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Output device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Default output channel count.
    pub channels: u16,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Whether this is the host's default output.
    pub is_default: bool,
}

/// Stream configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Buffer size in frames.
    pub buffer_size: u32,
    /// Output device name or index (uses default if `None`).
    pub output_device: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 256,
            output_device: None,
        }
    }
}

fn describe(device: &Device, default_name: Option<&str>) -> Option<AudioDevice> {
    let name = device_name(device).ok()?;
    let (channels, default_sample_rate) = device
        .default_output_config()
        .map(|c| (c.channels(), c.sample_rate()))
        .unwrap_or((2, 48000));
    Some(AudioDevice {
        is_default: default_name == Some(name.as_str()),
        name,
        channels,
        default_sample_rate,
    })
}

/// List all output devices.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|d| device_name(&d).ok());
    let outputs = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?;
    Ok(outputs
        .filter_map(|d| describe(&d, default_name.as_deref()))
        .collect())
}

/// Get the default output device info, if the host has one.
pub fn default_output_device() -> Result<Option<AudioDevice>> {
    let host = cpal::default_host();
    Ok(host.default_output_device().and_then(|d| {
        let name = device_name(&d).ok();
        describe(&d, name.as_deref())
    }))
}

/// Find an output device by index, exact name, or case-insensitive partial name.
fn find_output_device(host: &Host, name_or_index: &str) -> Result<Device> {
    let devices: Vec<_> = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .collect();

    if let Ok(index) = name_or_index.parse::<usize>() {
        return devices.get(index).cloned().ok_or_else(|| {
            Error::DeviceNotFound(format!(
                "output device index {} (only {} devices available)",
                index,
                devices.len()
            ))
        });
    }

    if let Some(device) = devices
        .iter()
        .find(|d| device_name(d).is_ok_and(|n| n == name_or_index))
    {
        return Ok(device.clone());
    }

    let search = name_or_index.to_lowercase();
    let matches: Vec<_> = devices
        .iter()
        .filter_map(|d| {
            device_name(d)
                .ok()
                .filter(|n| n.to_lowercase().contains(&search))
                .map(|n| (d, n))
        })
        .collect();

    match matches.as_slice() {
        [] => Err(Error::DeviceNotFound(format!(
            "no output device matching '{}'",
            name_or_index
        ))),
        [(device, _)] => Ok((*device).clone()),
        [(device, first), ..] => {
            let names: Vec<_> = matches.iter().map(|(_, n)| n.as_str()).collect();
            tracing::warn!(
                search = name_or_index,
                candidates = ?names,
                chosen = %first,
                "device name is ambiguous, using first match"
            );
            Ok((*device).clone())
        }
    }
}

/// Stereo-to-device adapter.
///
/// Owns the left and right scratch buffers handed to the render callback.
/// They grow to the largest block seen and are never shrunk, so steady-state
/// callbacks do not allocate.
#[derive(Debug, Default)]
pub struct Interleaver {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl Interleaver {
    /// Create with room for `frames` frames.
    pub fn with_capacity(frames: usize) -> Self {
        Self {
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    /// Frames the scratch buffers currently hold.
    pub fn capacity(&self) -> usize {
        self.left.len()
    }

    /// Fill the interleaved `output` with `channels` channels by calling
    /// `render` for one stereo block.
    ///
    /// Mono devices get `(l + r) / 2`; channels past the second are silent.
    pub fn fill<F>(&mut self, output: &mut [f32], channels: usize, render: F)
    where
        F: FnOnce(&mut [f32], &mut [f32]),
    {
        let channels = channels.max(1);
        let frames = output.len() / channels;
        if self.left.len() < frames {
            self.left.resize(frames, 0.0);
            self.right.resize(frames, 0.0);
        }
        let left = &mut self.left[..frames];
        let right = &mut self.right[..frames];
        render(&mut *left, &mut *right);

        for (i, frame) in output.chunks_exact_mut(channels).enumerate() {
            match frame {
                [mono] => *mono = (left[i] + right[i]) * 0.5,
                [l, r, rest @ ..] => {
                    *l = left[i];
                    *r = right[i];
                    rest.fill(0.0);
                }
                [] => {}
            }
        }
        output[frames * channels..].fill(0.0);
    }
}

/// Real-time output stream.
pub struct AudioStream {
    device: Device,
    config: StreamConfig,
    channels: u16,
    running: Arc<AtomicBool>,
    stream: Option<Stream>,
}

impl std::fmt::Debug for AudioStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioStream")
            .field("config", &self.config)
            .field("channels", &self.channels)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl AudioStream {
    /// Open the configured output device.
    pub fn new(config: StreamConfig) -> Result<Self> {
        let host = cpal::default_host();

        let device = match &config.output_device {
            Some(name) => find_output_device(&host, name)?,
            None => host.default_output_device().ok_or(Error::NoDevice)?,
        };
        let channels = device
            .default_output_config()
            .map(|c| c.channels())
            .unwrap_or(2);

        Ok(Self {
            device,
            config,
            channels,
            running: Arc::new(AtomicBool::new(false)),
            stream: None,
        })
    }

    /// Get the configured sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Get the output device channel count.
    pub fn output_channels(&self) -> u16 {
        self.channels
    }

    /// Name of the opened device.
    pub fn device_name(&self) -> String {
        device_name(&self.device).unwrap_or_else(|_| "<unnamed>".to_string())
    }

    /// Start pulling stereo blocks from `render`.
    ///
    /// The callback runs on the device thread and must fill both buffers.
    /// Returns once the stream is playing; call [`stop`](Self::stop) or
    /// drop the stream to end it.
    pub fn start_stereo<F>(&mut self, mut render: F) -> Result<()>
    where
        F: FnMut(&mut [f32], &mut [f32]) + Send + 'static,
    {
        self.stop();

        let stream_config = cpal::StreamConfig {
            channels: self.channels,
            sample_rate: self.config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(self.config.buffer_size),
        };
        let channels = usize::from(self.channels);
        let mut interleaver = Interleaver::with_capacity(self.config.buffer_size as usize);
        let running = Arc::clone(&self.running);

        let stream = self
            .device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if running.load(Ordering::Acquire) {
                        interleaver.fill(data, channels, &mut render);
                    } else {
                        data.fill(0.0);
                    }
                },
                |err| tracing::error!(error = %err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        self.running.store(true, Ordering::Release);
        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            device = %self.device_name(),
            channels = self.channels,
            sample_rate = self.config.sample_rate,
            buffer_size = self.config.buffer_size,
            "output stream started"
        );
        self.stream = Some(stream);
        Ok(())
    }

    /// Stop and release the stream.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if self.stream.take().is_some() {
            tracing::info!("output stream stopped");
        }
    }

    /// Check if the stream is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for AudioStream {
    fn drop(&mut self) {
        self.stop();
    }
}
