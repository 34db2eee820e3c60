use crate::config;

/// Load and validate settings, falling back to defaults.
///
/// Logging is not up yet, so problems go to stderr (the terminal is still in
/// normal mode) and are returned for the log file as well.
pub fn load_settings() -> (config::Settings, Option<String>) {
    match config::Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                let warning = format!("invalid config, using defaults: {msg}");
                eprintln!("spindle: {warning}");
                (config::Settings::default(), Some(warning))
            } else {
                (s, None)
            }
        }
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            let warning = format!("failed to load config, using defaults: {e}");
            eprintln!("spindle: {warning}");
            (config::Settings::default(), Some(warning))
        }
    }
}
