//! Settings file format.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::paths::expand_home;

/// Top-level settings.
///
/// Every field has a default, so an empty file (or no file at all) is a
/// valid configuration.
///
/// # TOML Format
///
/// ```toml
/// [audio]
/// sample_rate = 48000
/// buffer_size = 256
/// output_device = "USB"
///
/// [engine]
/// stack_limit = 1024
/// fault_queue = 64
///
/// [modules]
/// operators = 8
/// envelopes = 8
/// mixers = 4
/// delays = 4
/// sequencers = 8
/// tables = 4
/// steps = 16
/// max_delay_seconds = 2.0
/// samples = ["~/samples/drums"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Device and stream settings.
    pub audio: AudioSettings,
    /// Interpreter settings.
    pub engine: EngineSettings,
    /// Module bank sizes and sample sources.
    pub modules: ModuleSettings,
}

/// `[audio]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AudioSettings {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Device buffer size in frames.
    pub buffer_size: u32,
    /// Output device name or index; the host default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 256,
            output_device: None,
        }
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Operand stack ceiling.
    pub stack_limit: usize,
    /// Runtime faults buffered for the control thread.
    pub fault_queue: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            stack_limit: 1024,
            fault_queue: 64,
        }
    }
}

/// `[modules]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleSettings {
    /// Number of operators.
    pub operators: usize,
    /// Number of envelopes.
    pub envelopes: usize,
    /// Number of accumulators.
    pub mixers: usize,
    /// Number of delay lines.
    pub delays: usize,
    /// Number of gate and value sequences.
    pub sequencers: usize,
    /// Number of interpolating tables.
    pub tables: usize,
    /// Steps per sequence and entries per table.
    pub steps: usize,
    /// Longest delay in seconds.
    pub max_delay_seconds: f64,
    /// WAV files or directories to load as sample words. A leading `~`
    /// expands to the home directory.
    pub samples: Vec<PathBuf>,
}

impl Default for ModuleSettings {
    fn default() -> Self {
        Self {
            operators: 8,
            envelopes: 8,
            mixers: 4,
            delays: 4,
            sequencers: 8,
            tables: 4,
            steps: 16,
            max_delay_seconds: 2.0,
            samples: Vec::new(),
        }
    }
}

/// Most instances of any one module kind.
pub const MAX_INSTANCES: usize = 256;

/// Largest accepted `engine.stack_limit`.
pub const MAX_STACK_LIMIT: usize = 1 << 20;

fn check(ok: bool, field: &'static str, reason: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, reason()))
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load settings from `path`, or defaults if the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut settings: Settings = toml::from_str(toml_str)?;
        settings.validate()?;
        for path in &mut settings.modules.samples {
            *path = expand_home(path);
        }
        Ok(settings)
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let audio = &self.audio;
        check(
            (8000..=192_000).contains(&audio.sample_rate),
            "audio.sample_rate",
            || format!("{} is outside 8000..=192000", audio.sample_rate),
        )?;
        check(
            (16..=8192).contains(&audio.buffer_size),
            "audio.buffer_size",
            || format!("{} is outside 16..=8192", audio.buffer_size),
        )?;

        let engine = &self.engine;
        check(
            (1..=MAX_STACK_LIMIT).contains(&engine.stack_limit),
            "engine.stack_limit",
            || format!("{} is outside 1..={MAX_STACK_LIMIT}", engine.stack_limit),
        )?;
        check(engine.fault_queue >= 1, "engine.fault_queue", || {
            "must be at least 1".to_string()
        })?;

        let modules = &self.modules;
        for (field, count) in [
            ("modules.operators", modules.operators),
            ("modules.envelopes", modules.envelopes),
            ("modules.mixers", modules.mixers),
            ("modules.delays", modules.delays),
            ("modules.sequencers", modules.sequencers),
            ("modules.tables", modules.tables),
        ] {
            check(count <= MAX_INSTANCES, field, || {
                format!("{count} exceeds the limit of {MAX_INSTANCES}")
            })?;
        }
        check(
            (1..=1024).contains(&modules.steps),
            "modules.steps",
            || format!("{} is outside 1..=1024", modules.steps),
        )?;
        check(
            modules.max_delay_seconds > 0.0 && modules.max_delay_seconds <= 60.0,
            "modules.max_delay_seconds",
            || format!("{} is outside (0, 60]", modules.max_delay_seconds),
        )?;
        Ok(())
    }
}
