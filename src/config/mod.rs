//! Loading dispatcher configuration.
//!
//! Settings come from an optional `config/default` file (any format the
//! `config` crate understands) and `TOPICSUB__`-prefixed environment variables,
//! e.g. `TOPICSUB__DISPATCHER__SUBTOPIC_MARKER=/`. A `.env` file is read first
//! when present. Whatever is not provided falls back to the defaults.

pub mod settings;

use std::path::Path;

use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};

use crate::config::settings::PartialSettings;

pub use settings::{DispatcherConfig, Settings};

/// Loads the configuration from `config/default` and the environment.
pub fn load_config() -> Result<Settings, ConfigError> {
    let _ = dotenvy::dotenv();

    let builder =
        Config::builder().add_source(File::with_name("config/default").required(false));
    build(builder)
}

/// Loads the configuration from an explicit file, then the environment.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    let builder = Config::builder().add_source(File::from(path.as_ref()));
    build(builder)
}

fn build(builder: ConfigBuilder<DefaultState>) -> Result<Settings, ConfigError> {
    let config = builder
        .add_source(
            Environment::with_prefix("TOPICSUB")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();

    Ok(Settings {
        dispatcher: partial
            .dispatcher
            .unwrap_or_default()
            .merge_over(default.dispatcher),
    })
}

#[cfg(test)]
mod tests;
