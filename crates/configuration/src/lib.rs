use crate::error::ConfigError;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use std::env;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    AnalysisSettings, DatabaseSettings, LogLevel, LoggingSettings, ServerSettings, Settings,
};

/// Environment variable naming an alternative config file (without extension
/// it is resolved like `config::File::with_name`).
pub const CONFIG_PATH_VAR: &str = "PAGILA_CONFIG";

/// Loads the application settings.
///
/// Sources, lowest precedence first: built-in defaults, the optional
/// `config.toml` (or the file named by `PAGILA_CONFIG`), then environment
/// variables such as `PAGILA__SERVER__PORT=9000`.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config".to_string());

    let builder = defaults()?
        .add_source(File::with_name(&path).required(false))
        .add_source(
            Environment::with_prefix("PAGILA")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    validate(settings)
}

/// Loads settings from a TOML document layered over the defaults. Environment
/// variables are not consulted.
pub fn load_settings_from_str(toml: &str) -> Result<Settings, ConfigError> {
    let builder = defaults()?
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    validate(settings)
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(config::Config::builder()
        .set_default("database.schema", "public")?
        .set_default("database.max_connections", 10)?
        .set_default("database.acquire_timeout_secs", 5)?
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("analysis.default_top_count", 5)?
        .set_default("logging.level", "info")?)
}

fn validate(settings: Settings) -> Result<Settings, ConfigError> {
    if settings.database.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "database.max_connections must be at least 1".to_string(),
        ));
    }
    if settings.database.schema.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "database.schema must not be empty".to_string(),
        ));
    }
    if settings.analysis.default_top_count == 0 {
        return Err(ConfigError::ValidationError(
            "analysis.default_top_count must be at least 1".to_string(),
        ));
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_configured() {
        let settings = load_settings_from_str("").unwrap();
        assert_eq!(settings.database.schema, "public");
        assert_eq!(settings.database.max_connections, 10);
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.analysis.default_top_count, 5);
        assert_eq!(settings.logging.level, LogLevel::Info);
        assert!(settings.logging.directory.is_none());
        assert_eq!(settings.server.socket_addr().unwrap().port(), 8000);
    }

    #[test]
    fn file_values_override_defaults() {
        let settings = load_settings_from_str(
            r#"
            [database]
            schema = "rental"
            acquire_timeout_secs = 30

            [server]
            port = 9000

            [logging]
            level = "debug"
            directory = "logs"
            "#,
        )
        .unwrap();

        assert_eq!(settings.database.schema, "rental");
        assert_eq!(settings.database.acquire_timeout().as_secs(), 30);
        assert_eq!(settings.database.max_connections, 10);
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.logging.level, LogLevel::Debug);
        assert_eq!(settings.logging.directory.as_deref(), Some(std::path::Path::new("logs")));
    }

    #[test]
    fn zero_top_count_is_rejected() {
        let err = load_settings_from_str("[analysis]\ndefault_top_count = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let err = load_settings_from_str("[database]\nmax_connections = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
