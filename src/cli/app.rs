//! Shared startup helpers: exit codes, config merging and logging

use std::env;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Load and merge configuration from file, env, and CLI.
/// A missing file is fine; an unreadable one is an error.
pub async fn load_merged_config<S: ConfigStore>(
    store: &S,
    cli_config: AppConfig,
) -> Result<AppConfig, ConfigError> {
    let file_config = store.load().await?;

    // defaults < file < env < cli
    Ok(AppConfig::defaults()
        .merge(file_config)
        .merge(env_config())
        .merge(cli_config))
}

/// Config taken from the environment
fn env_config() -> AppConfig {
    AppConfig {
        display: env::var("DISPLAY").ok().filter(|s| !s.is_empty()),
        ..Default::default()
    }
}

/// Install the diagnostics subscriber on stderr.
///
/// `RUST_LOG` wins over `default_level`.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::XdgConfigStore;
    use tempfile::TempDir;

    #[tokio::test]
    async fn cli_wins_over_file() {
        let dir = TempDir::new().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        store
            .save(&AppConfig {
                frame_rate: Some(15),
                audio_device: Some("usb-mic".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let config = load_merged_config(
            &store,
            AppConfig {
                frame_rate: Some(60),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(config.frame_rate, Some(60));
        assert_eq!(config.audio_device, Some("usb-mic".to_string()));
        assert_eq!(config.log_level, Some("warn".to_string()));
    }

    #[tokio::test]
    async fn broken_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "frame_rate = [").unwrap();
        let store = XdgConfigStore::with_path(path);

        assert!(matches!(
            load_merged_config(&store, AppConfig::empty()).await,
            Err(ConfigError::ParseError(_))
        ));
    }
}
