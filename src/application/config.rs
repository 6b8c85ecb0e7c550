use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::LevelFilter;

use crate::core::error::TwitcherError;

/// Runtime settings, stored as a `key = value` text file so they can be
/// edited by hand on the box running the analyzer.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    pub post_url: String,
    pub poll_interval: u64,
    pub cooldown_minutes: u64,
    pub max_species: usize,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "~/birdnet-go-app/data/birdnet.db".to_string(),
            post_url: String::new(),
            poll_interval: 5,
            cooldown_minutes: 10,
            max_species: 6,
            log_level: "INFO".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the config file, creating it with defaults when missing. A file
    /// that exists but cannot be read is reported and replaced by in-memory
    /// defaults without touching the file. Runs before the logger is up, so
    /// problems go to stderr directly.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(contents) => Self::parse(&contents),
                Err(e) => {
                    eprintln!("Error reading config file {}: {}", path.display(), e);
                    Ok(Self::default())
                }
            }
        } else {
            let config = Self::default();
            config.save(path)?;
            println!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    fn parse(contents: &str) -> Result<Self> {
        let mut config = Self::default();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim();
                match key.trim() {
                    "database_path" => config.database_path = value.to_string(),
                    "post_url" => config.post_url = value.to_string(),
                    "poll_interval" => config.poll_interval = parse_number(key, value)?,
                    "cooldown_minutes" => config.cooldown_minutes = parse_number(key, value)?,
                    "max_species" => config.max_species = parse_number(key, value)?,
                    "log_level" => config.log_level = value.to_string(),
                    _ => {}
                }
            }
        }

        // Reject a bad log_level at startup rather than when the logger is built.
        config.level_filter()?;
        Ok(config)
    }

    /// Rewrites the recognized keys as `key = value` lines.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = format!(
            "database_path = {}\npost_url = {}\nmax_species = {}\npoll_interval = {}\ncooldown_minutes = {}\nlog_level = {}\n",
            self.database_path,
            self.post_url,
            self.max_species,
            self.poll_interval,
            self.cooldown_minutes,
            self.log_level,
        );
        fs::write(path, contents).map_err(|e| TwitcherError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    /// Parsed `log_level`; an unknown value is a fatal configuration error.
    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level.parse::<LevelFilter>().map_err(|_| {
            TwitcherError::ConfigError(format!("invalid log_level '{}'", self.log_level)).into()
        })
    }

    /// `database_path` with a leading `~/` expanded against $HOME.
    pub fn database_file(&self) -> PathBuf {
        expand_home(&self.database_path)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        TwitcherError::ConfigError(format!("invalid {} '{}'", key.trim(), value)).into()
    })
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.conf");

        let config = AppConfig::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.database_path, "~/birdnet-go-app/data/birdnet.db");
        assert_eq!(config.post_url, "");
        assert_eq!(config.poll_interval, 5);
        assert_eq!(config.cooldown_minutes, 10);
        assert_eq!(config.max_species, 6);
        assert_eq!(config.log_level, "INFO");

        // The written file parses back to the same values.
        let reloaded = AppConfig::load_or_create(&path).unwrap();
        assert_eq!(reloaded.post_url, config.post_url);
        assert_eq!(reloaded.poll_interval, config.poll_interval);
    }

    #[test]
    fn parse_reads_known_keys_and_skips_noise() {
        let contents = "\
# twitcher settings
database_path = /var/lib/birdnet/birdnet.db

post_url = http://phone.local:8080/notify
poll_interval = 30
cooldown_minutes = 60
max_species = 3
log_level = debug
unknown_key = whatever
not a key value line
";
        let config = AppConfig::parse(contents).unwrap();
        assert_eq!(config.database_path, "/var/lib/birdnet/birdnet.db");
        assert_eq!(config.post_url, "http://phone.local:8080/notify");
        assert_eq!(config.poll_interval, 30);
        assert_eq!(config.cooldown_minutes, 60);
        assert_eq!(config.max_species, 3);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = AppConfig::parse("post_url = http://phone.local:8080/notify\n").unwrap();
        assert_eq!(config.poll_interval, 5);
        assert_eq!(config.cooldown_minutes, 10);
        assert_eq!(config.max_species, 6);
    }

    #[test]
    fn invalid_numeric_value_is_fatal() {
        assert!(AppConfig::parse("poll_interval = soon\n").is_err());
        assert!(AppConfig::parse("cooldown_minutes = ten\n").is_err());
        assert!(AppConfig::parse("max_species = -1\n").is_err());
    }

    #[test]
    fn invalid_log_level_is_fatal() {
        assert!(AppConfig::parse("log_level = chatty\n").is_err());
    }

    #[test]
    fn save_round_trips_updated_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.conf");

        let mut config = AppConfig::default();
        config.post_url = "http://phone.local:8080/notify".to_string();
        config.poll_interval = 15;
        config.save(&path).unwrap();

        let reloaded = AppConfig::load_or_create(&path).unwrap();
        assert_eq!(reloaded.post_url, "http://phone.local:8080/notify");
        assert_eq!(reloaded.poll_interval, 15);
    }

    #[test]
    fn database_file_expands_home_prefix() {
        let mut config = AppConfig::default();
        config.database_path = "/var/lib/birdnet/birdnet.db".to_string();
        assert_eq!(
            config.database_file(),
            PathBuf::from("/var/lib/birdnet/birdnet.db")
        );

        config.database_path = "~/birdnet-go-app/data/birdnet.db".to_string();
        let expanded = config.database_file();
        if let Ok(home) = std::env::var("HOME") {
            assert_eq!(
                expanded,
                Path::new(&home).join("birdnet-go-app/data/birdnet.db")
            );
        } else {
            assert_eq!(expanded, PathBuf::from("~/birdnet-go-app/data/birdnet.db"));
        }
    }
}
