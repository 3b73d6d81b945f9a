//! Settings for the forthwave synthesizer.
//!
//! One TOML file configures the audio stream, the interpreter and the size of
//! the module bank. Every field has a default, a missing file means all
//! defaults, and command-line flags override whatever the file says.
//!
//! # Example
//!
//! ```rust,no_run
//! use forthwave_config::{Settings, default_config_path};
//!
//! let settings = Settings::load_or_default(default_config_path()).unwrap();
//! println!("{} Hz", settings.audio.sample_rate);
//! ```

pub mod error;
pub mod paths;
pub mod settings;

pub use error::ConfigError;
pub use paths::{default_config_path, expand_home, user_config_dir};
pub use settings::{
    AudioSettings, EngineSettings, MAX_INSTANCES, MAX_STACK_LIMIT, ModuleSettings, Settings,
};
