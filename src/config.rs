use crate::error::{Result, VentuskyError};
use dialoguer::{Confirm, Input};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.ventusky.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; ventusky-forecast/0.1)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const MAX_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_REFRESH_INTERVAL: u64 = 60;
pub const MIN_REFRESH_INTERVAL: u64 = 15;
pub const MAX_REFRESH_INTERVAL: u64 = 7 * 24 * 60;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("placeholder pattern is valid"));

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Consecutive failed refreshes before a location reports unavailable
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default)]
    pub locations: Vec<LocationConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LocationConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Minutes between refreshes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
}

impl LocationConfig {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    /// Coordinates identify a location; two entries may not share them.
    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.latitude, self.longitude)
    }

    pub fn entity_id(&self) -> String {
        let slug: String = self
            .name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("weather.ventusky_{}", slug.trim_matches('_'))
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.saturating_mul(60))
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(VentuskyError::Config("location name must not be empty".into()));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(VentuskyError::Config(format!(
                "{}: latitude {} is outside -90..90",
                self.name, self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(VentuskyError::Config(format!(
                "{}: longitude {} is outside -180..180",
                self.name, self.longitude
            )));
        }
        if self.refresh_interval < MIN_REFRESH_INTERVAL {
            return Err(VentuskyError::Config(format!(
                "{}: refresh_interval must be at least {} minutes, got {}",
                self.name, MIN_REFRESH_INTERVAL, self.refresh_interval
            )));
        }
        if self.refresh_interval > MAX_REFRESH_INTERVAL {
            return Err(VentuskyError::Config(format!(
                "{}: refresh_interval must be at most {} minutes, got {}",
                self.name, MAX_REFRESH_INTERVAL, self.refresh_interval
            )));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL
}

fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(VentuskyError::Config(format!(
                "Config file not found at {:?}. Run `ventusky init` to set up.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| VentuskyError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&config_str)
    }

    /// Parse and validate, substituting `${VAR}` placeholders first.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content);

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| VentuskyError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.failure_threshold == 0 {
            return Err(VentuskyError::Config(
                "failure_threshold must be at least 1".into(),
            ));
        }
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.fetch.timeout_secs) {
            return Err(VentuskyError::Config(format!(
                "fetch.timeout_secs must be between 1 and {}, got {}",
                MAX_TIMEOUT_SECS, self.fetch.timeout_secs
            )));
        }

        let mut seen = HashSet::new();
        for location in &self.locations {
            location.validate()?;
            if !seen.insert(location.unique_id()) {
                return Err(VentuskyError::Config(format!(
                    "{}: another location already uses {};{}",
                    location.name, location.latitude, location.longitude
                )));
            }
        }
        Ok(())
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("ventusky").join("config.yaml");
            if xdg_config.exists() {
                return Ok(xdg_config);
            }
        }

        Self::default_config_path()
    }

    /// Returns true if a config file can be found in any standard location.
    pub fn exists(config_override: Option<&PathBuf>) -> bool {
        match config_override {
            Some(p) => p.exists(),
            None => Self::find_config_path()
                .map(|p| p.exists())
                .unwrap_or(false),
        }
    }

    /// Default path for writing new config files (~/.config/ventusky/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| VentuskyError::Config("Cannot determine config directory".into()))?
            .join("ventusky");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    /// Returns the loaded Config and the path it was written to.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up the Ventusky forecast locations!");
        println!();

        let mut locations = Vec::new();
        loop {
            println!("Location {}", locations.len() + 1);
            let name: String = Input::new()
                .with_prompt("  Display name")
                .default("Sartrouville".into())
                .interact_text()
                .map_err(input_error)?;

            let latitude: f64 = Input::new()
                .with_prompt("  Latitude")
                .default(48.941)
                .validate_with(|v: &f64| {
                    if (-90.0..=90.0).contains(v) {
                        Ok(())
                    } else {
                        Err("latitude must be within -90..90")
                    }
                })
                .interact_text()
                .map_err(input_error)?;

            let longitude: f64 = Input::new()
                .with_prompt("  Longitude")
                .default(2.159)
                .validate_with(|v: &f64| {
                    if (-180.0..=180.0).contains(v) {
                        Ok(())
                    } else {
                        Err("longitude must be within -180..180")
                    }
                })
                .interact_text()
                .map_err(input_error)?;

            let refresh_interval: u64 = Input::new()
                .with_prompt("  Refresh interval (minutes)")
                .default(DEFAULT_REFRESH_INTERVAL)
                .validate_with(|v: &u64| {
                    if *v >= MIN_REFRESH_INTERVAL {
                        Ok(())
                    } else {
                        Err("refresh interval must be at least 15 minutes")
                    }
                })
                .interact_text()
                .map_err(input_error)?;

            locations.push(LocationConfig {
                name,
                latitude,
                longitude,
                refresh_interval,
            });

            println!();
            let another = Confirm::new()
                .with_prompt("Add another location?")
                .default(false)
                .interact()
                .map_err(input_error)?;
            if !another {
                break;
            }
        }

        let config = Config {
            fetch: FetchConfig::default(),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            locations,
        };
        config.validate()?;

        let config_path = Self::default_config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)
            .map_err(|e| VentuskyError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# Ventusky Forecast Configuration\n# Generated by `ventusky init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        for cap in ENV_PLACEHOLDER.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            locations: vec![LocationConfig::new("Sartrouville", 48.941, 2.159)],
        }
    }
}

fn input_error(e: dialoguer::Error) -> VentuskyError {
    VentuskyError::Config(format!("Input error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_takes_defaults() {
        let config = Config::from_yaml(
            "locations:\n  - name: Sartrouville\n    latitude: 48.941\n    longitude: 2.159\n",
        )
        .unwrap();

        assert_eq!(config.failure_threshold, DEFAULT_FAILURE_THRESHOLD);
        assert_eq!(config.fetch.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.fetch.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.locations[0].refresh_interval, DEFAULT_REFRESH_INTERVAL);
        assert_eq!(
            config.locations[0].refresh_period(),
            Duration::from_secs(3600)
        );
    }

    #[test]
    fn refresh_interval_minimum_enforced() {
        let err = Config::from_yaml(
            "locations:\n  - name: Fast\n    latitude: 1.0\n    longitude: 2.0\n    refresh_interval: 5\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("at least 15"));
    }

    #[test]
    fn oversized_refresh_interval_rejected_without_overflow() {
        let mut location = LocationConfig::new("Slow", 1.0, 2.0);
        location.refresh_interval = u64::MAX;
        assert_eq!(location.refresh_period(), Duration::from_secs(u64::MAX));
        assert!(location.validate().is_err());

        let err = Config::from_yaml(&format!(
            "locations:\n  - name: Slow\n    latitude: 1.0\n    longitude: 2.0\n    refresh_interval: {}\n",
            u64::MAX
        ))
        .unwrap_err();
        assert!(err.to_string().contains("at most 10080"));

        location.refresh_interval = MAX_REFRESH_INTERVAL;
        assert!(location.validate().is_ok());
    }

    #[test]
    fn coordinates_validated() {
        let mut location = LocationConfig::new("Nowhere", 91.0, 0.0);
        assert!(location.validate().is_err());
        location.latitude = 45.0;
        location.longitude = -181.0;
        assert!(location.validate().is_err());
        location.longitude = 179.9;
        assert!(location.validate().is_ok());
        location.name = "  ".into();
        assert!(location.validate().is_err());
    }

    #[test]
    fn duplicate_coordinates_rejected() {
        let config = Config {
            locations: vec![
                LocationConfig::new("Home", 48.941, 2.159),
                LocationConfig::new("Also home", 48.941, 2.159),
            ],
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn threshold_and_timeout_bounds() {
        let mut config = Config::default();
        config.failure_threshold = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fetch.timeout_secs = 600;
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn env_placeholders_substituted() {
        std::env::set_var("VENTUSKY_TEST_LOCATION_NAME", "Chatou");
        let config = Config::from_yaml(
            "locations:\n  - name: ${VENTUSKY_TEST_LOCATION_NAME}\n    latitude: 48.89\n    longitude: 2.15\n",
        )
        .unwrap();
        assert_eq!(config.locations[0].name, "Chatou");
    }

    #[test]
    fn ids_from_location() {
        let location = LocationConfig::new("Saint-Germain en Laye", 48.9, 2.08);
        assert_eq!(location.unique_id(), "48.9_2.08");
        assert_eq!(location.entity_id(), "weather.ventusky_saint_germain_en_laye");
    }
}
