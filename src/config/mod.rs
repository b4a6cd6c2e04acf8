mod types;

pub use types::{parse_hex_color, ChargingConfig, Config, ConfigIssue, IslandConfig};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::{Duration, Instant};

const CONFIG_FILE_NAME: &str = "config.toml";
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(500);

pub fn load_config() -> Config {
    load_config_from(&get_config_path())
}

pub fn load_config_from(config_path: &Path) -> Config {
    let config = if config_path.exists() {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {:?}", config_path);
                    config
                }
                Err(e) => {
                    log::error!("Failed to parse config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                log::error!("Failed to read config file: {}", e);
                Config::default()
            }
        }
    } else {
        log::info!("No config file found at {:?}, using defaults", config_path);
        Config::default()
    };

    checked(config)
}

/// Logs validation issues and falls back to defaults on any error.
fn checked(config: Config) -> Config {
    let issues = config.validate();
    let errors: Vec<_> = issues.iter().filter(|i| i.is_error).collect();
    let warnings: Vec<_> = issues.iter().filter(|i| !i.is_error).collect();

    for warning in &warnings {
        log::warn!("Config: {}", warning);
    }
    for error in &errors {
        log::error!("Config: {}", error);
    }

    if !errors.is_empty() {
        log::error!(
            "Config has {} error(s); falling back to defaults.",
            errors.len()
        );
        return Config::default();
    }

    config
}

pub fn get_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("islet")
        .join(CONFIG_FILE_NAME)
}

/// Editors often write twice in quick succession, so a change is held back
/// until 500ms have passed since the previous reload. A held-back change stays
/// pending and is picked up by a later check.
fn reload_due(should_reload: bool, last_reload: Instant, now: Instant) -> bool {
    should_reload && now.saturating_duration_since(last_reload) > RELOAD_DEBOUNCE
}

/// Watches the config directory and reloads on changes to `config.toml`.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<Result<Event, notify::Error>>,
    config_path: PathBuf,
    last_reload: Instant,
    pending: bool,
}

impl ConfigWatcher {
    pub fn new() -> Result<Self, notify::Error> {
        let (tx, rx) = channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;

        let config_path = get_config_path();

        // Watch the directory so editors that replace the file are still seen
        let config_dir = config_path.parent().unwrap_or(&config_path);
        if !config_dir.exists() {
            let _ = std::fs::create_dir_all(config_dir);
        }

        watcher.watch(config_dir, RecursiveMode::NonRecursive)?;
        log::info!("Watching config directory: {:?}", config_dir);

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            config_path,
            last_reload: Instant::now(),
            pending: false,
        })
    }

    /// Drains pending file events and returns the new config if it changed.
    pub fn check_and_reload(&mut self) -> Option<Config> {
        let mut should_reload = self.pending;

        while let Ok(event) = self.receiver.try_recv() {
            match event {
                Ok(event) => {
                    let is_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().is_some_and(|n| n == CONFIG_FILE_NAME));

                    if is_config && (event.kind.is_modify() || event.kind.is_create()) {
                        should_reload = true;
                    }
                }
                Err(e) => {
                    log::error!("Config watch error: {}", e);
                }
            }
        }

        let now = Instant::now();
        self.pending = should_reload;
        if !reload_due(should_reload, self.last_reload, now) {
            return None;
        }

        log::info!("Config file changed, reloading...");
        self.pending = false;
        self.last_reload = now;
        Some(load_config_from(&self.config_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("islet-test-missing").join(CONFIG_FILE_NAME);
        assert_eq!(load_config_from(&path), Config::default());
    }

    #[test]
    fn test_invalid_config_falls_back() {
        let mut config = Config::default();
        config.island.background_color = "black".to_string();
        config.island.hover_debounce_ms = 100;
        assert_eq!(checked(config), Config::default());
    }

    #[test]
    fn test_warnings_keep_config() {
        let mut config = Config::default();
        config.island.hover_debounce_ms = 200;
        assert_eq!(checked(config.clone()), config);
    }

    #[test]
    fn test_reload_debounce() {
        let last = Instant::now();
        let ms = Duration::from_millis;

        assert!(!reload_due(false, last, last + ms(2000)));
        // A change inside the window waits rather than being dropped.
        assert!(!reload_due(true, last, last + ms(200)));
        assert!(!reload_due(true, last, last + ms(500)));
        assert!(reload_due(true, last, last + ms(501)));
    }

    #[test]
    fn test_config_path() {
        let path = get_config_path();
        assert!(path.ends_with(".config/islet/config.toml"));
    }
}
