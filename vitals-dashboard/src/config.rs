//! Layered configuration: built-in defaults, then an optional TOML file, then
//! `VITALS__*` environment variables.

use std::path::Path;

use config::{Config, Environment, File};
use vitals_core::{DashboardConfig, VitalsError};

pub const ENV_PREFIX: &str = "VITALS";

/// Load settings. `VITALS__API_BASE` overrides `api_base`, nested keys use
/// further `__` separators (`VITALS__RECONNECT__DELAY_MS`).
pub fn load(file: Option<&Path>) -> Result<DashboardConfig, VitalsError> {
    let defaults = Config::try_from(&DashboardConfig::default()).map_err(config_error)?;

    let mut builder = Config::builder().add_source(defaults);
    if let Some(path) = file {
        builder = builder.add_source(File::from(path).required(true));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let settings = builder.build().map_err(config_error)?;
    let loaded: DashboardConfig = settings.try_deserialize().map_err(config_error)?;
    validate(&loaded)?;
    Ok(loaded)
}

fn validate(config: &DashboardConfig) -> Result<(), VitalsError> {
    for (name, band) in [
        ("temperature", config.bands.temperature),
        ("heart_rate", config.bands.heart_rate),
    ] {
        if band.floor >= band.ceiling {
            return Err(VitalsError::Config(format!(
                "bands.{name}: floor {} must be below ceiling {}",
                band.floor, band.ceiling
            )));
        }
    }
    if config.dashboard_log_limit == 0 {
        return Err(VitalsError::Config(
            "dashboard_log_limit must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn config_error(err: config::ConfigError) -> VitalsError {
    VitalsError::Config(err.to_string())
}
