//! Config command handler

use std::path::Path;

use crate::application::ports::ConfigStore;
use crate::domain::config::{
    is_valid_frame_rate, AppConfig, MAX_FRAME_RATE, MIN_FRAME_RATE, VALID_LOG_LEVELS,
};
use crate::domain::error::ConfigError;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    validate_key(key)?;

    let mut config = store.load().await?;
    set_value(&mut config, key, value)?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    validate_key(key)?;

    let config = store.load().await?;
    presenter.output(get_value(&config, key).as_deref().unwrap_or(NOT_SET));

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, get_value(&config, key).as_deref().unwrap_or(NOT_SET));
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn validate_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

/// Validate `value` for `key` and store it in `config`
fn set_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "output_dir" => {
            let path = Path::new(value);
            if value.trim().is_empty() {
                return Err(invalid("Value must not be empty".to_string()));
            }
            if path.exists() && !path.is_dir() {
                return Err(invalid(format!("'{}' is not a directory", value)));
            }
            config.output_dir = Some(value.to_string());
        }
        "display" => {
            if !value.contains(':') {
                return Err(invalid(format!(
                    "Invalid display '{}'. Expected a form like :0.0",
                    value
                )));
            }
            config.display = Some(value.to_string());
        }
        "audio_device" => {
            if value.trim().is_empty() {
                return Err(invalid("Value must not be empty".to_string()));
            }
            config.audio_device = Some(value.to_string());
        }
        "frame_rate" => match value.parse::<u32>() {
            Ok(rate) if is_valid_frame_rate(rate) => config.frame_rate = Some(rate),
            _ => {
                return Err(invalid(format!(
                    "Value must be an integer from {} to {}",
                    MIN_FRAME_RATE, MAX_FRAME_RATE
                )))
            }
        },
        "log_level" => {
            let lower = value.to_lowercase();
            if !VALID_LOG_LEVELS.contains(&lower.as_str()) {
                return Err(invalid(format!(
                    "Invalid value '{}'. Valid options: {}",
                    value,
                    VALID_LOG_LEVELS.join(", ")
                )));
            }
            config.log_level = Some(lower);
        }
        _ => return Err(invalid("Unknown key".to_string())),
    }
    Ok(())
}

fn get_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "output_dir" => config.output_dir.clone(),
        "display" => config.display.clone(),
        "audio_device" => config.audio_device.clone(),
        "frame_rate" => config.frame_rate.map(|rate| rate.to_string()),
        "log_level" => config.log_level.clone(),
        _ => None,
    }
}
