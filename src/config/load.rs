use std::str::FromStr;
use std::{env, path::PathBuf};

use log::LevelFilter;

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `SPINDLE__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("SPINDLE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.drive.device.trim().is_empty() {
            return Err("drive.device must not be empty".to_string());
        }
        if self.drive.poll_interval_ms == 0 {
            return Err("drive.poll_interval_ms must be >= 1".to_string());
        }
        if self.drive.status_command.is_empty() {
            return Err("drive.status_command must name a program".to_string());
        }
        if self.drive.toc_command.is_empty() {
            return Err("drive.toc_command must name a program".to_string());
        }
        if self.playback.rip_command.is_empty() {
            return Err("playback.rip_command must name a program".to_string());
        }
        if self.playback.ready_backoff_initial_ms == 0 {
            return Err("playback.ready_backoff_initial_ms must be >= 1".to_string());
        }
        if self.playback.ready_backoff_max_ms < self.playback.ready_backoff_initial_ms {
            return Err(
                "playback.ready_backoff_max_ms must be >= playback.ready_backoff_initial_ms"
                    .to_string(),
            );
        }
        if self.playback.progress_tick_ms == 0 {
            return Err("playback.progress_tick_ms must be >= 1".to_string());
        }
        self.log_level()?;
        Ok(())
    }

    /// Parsed `logging.level`.
    pub fn log_level(&self) -> Result<LevelFilter, String> {
        LevelFilter::from_str(self.logging.level.trim())
            .map_err(|_| format!("logging.level: unknown level {:?}", self.logging.level))
    }
}

/// Resolve the config path from `SPINDLE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("SPINDLE_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/spindle/config.toml`
/// or `~/.config/spindle/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("spindle").join("config.toml"))
}

/// Replace `{device}` and `{track}` placeholders in a configured command line.
pub fn expand_command(template: &[String], device: &str, track: Option<u32>) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            let arg = arg.replace("{device}", device);
            match track {
                Some(t) => arg.replace("{track}", &t.to_string()),
                None => arg,
            }
        })
        .collect()
}
