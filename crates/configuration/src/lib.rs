use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    ApiSettings, DatabaseSettings, LogFormat, LoggingSettings, ServerSettings, Settings,
};

/// Prefix of the environment variables that override file settings,
/// e.g. `CUSTOMIZER__SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "CUSTOMIZER";

/// Loads the application configuration.
///
/// Sources are layered: built-in defaults, then the TOML file at `path` (if it
/// exists), then `CUSTOMIZER__*` environment variables. `DATABASE_URL` fills in
/// the database URL when no other source set it. The result is validated
/// before it is returned.
pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut settings = builder.try_deserialize::<Settings>()?;
    if settings.database.url.is_none() {
        settings.database.url = std::env::var("DATABASE_URL").ok();
    }

    settings.validate()?;
    Ok(settings)
}

/// Parses settings from a TOML string without consulting the environment.
pub fn load_config_from_str(toml: &str) -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?
        .try_deserialize::<Settings>()?;

    settings.validate()?;
    Ok(settings)
}
