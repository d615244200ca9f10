//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Source, SourceConfig};
use crate::query::NumberFormat;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory metadata and storage settings
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Number and currency formatting
    #[serde(default)]
    pub locale: LocaleConfig,

    /// Real estate companies, in output order
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.directory.title.trim().is_empty() {
            return Err(AppError::validation("directory.title is blank"));
        }
        if self.directory.description.trim().is_empty() {
            return Err(AppError::validation("directory.description is blank"));
        }
        if self.directory.cache_ttl_minutes == 0 {
            return Err(AppError::validation(
                "directory.cache_ttl_minutes must be > 0",
            ));
        }
        if self.directory.offline_after_minutes == 0 {
            return Err(AppError::validation(
                "directory.offline_after_minutes must be > 0",
            ));
        }
        self.directory.cache_ttl()?;
        self.directory.offline_after()?;
        self.locale.number_format()?;
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        for (i, config) in self.sources.iter().enumerate() {
            let source = Source::new(config.clone())
                .map_err(|e| AppError::validation(format!("sources[{i}]: {e}")))?;
            source
                .check_paths()
                .map_err(|e| AppError::validation(format!("sources[{i}]: {e}")))?;
        }
        Ok(())
    }
}

/// Directory metadata and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Title of the directory
    #[serde(default = "defaults::title")]
    pub title: String,

    /// Short description; `{sources}` expands to the number of sources
    #[serde(default = "defaults::description")]
    pub description: String,

    /// Any extra information about the directory as HTML
    #[serde(default)]
    pub extra: Option<String>,

    /// Where cached documents and state files live
    #[serde(default = "defaults::data_path")]
    pub data_path: PathBuf,

    /// Minimum time between fetches of a source document
    #[serde(default = "defaults::cache_ttl")]
    pub cache_ttl_minutes: u64,

    /// Time since the last successful update after which a source is
    /// reported offline
    #[serde(default = "defaults::offline_after")]
    pub offline_after_minutes: u64,
}

impl DirectoryConfig {
    pub fn cache_ttl(&self) -> Result<Duration> {
        minutes("directory.cache_ttl_minutes", self.cache_ttl_minutes)
    }

    pub fn offline_after(&self) -> Result<Duration> {
        minutes("directory.offline_after_minutes", self.offline_after_minutes)
    }
}

fn minutes(name: &str, value: u64) -> Result<Duration> {
    i64::try_from(value)
        .ok()
        .and_then(Duration::try_minutes)
        .ok_or_else(|| AppError::validation(format!("{name} is out of range ({value})")))
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            title: defaults::title(),
            description: defaults::description(),
            extra: None,
            data_path: defaults::data_path(),
            cache_ttl_minutes: defaults::cache_ttl(),
            offline_after_minutes: defaults::offline_after(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Number and currency formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    #[serde(default = "defaults::decimal_point")]
    pub decimal_point: String,

    /// Digit group separator, empty for none
    #[serde(default)]
    pub thousands_sep: String,

    #[serde(default = "defaults::currency_symbol")]
    pub currency_symbol: String,
}

impl LocaleConfig {
    pub fn number_format(&self) -> Result<NumberFormat> {
        NumberFormat::new(self.decimal_point.clone(), self.thousands_sep.clone())
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            decimal_point: defaults::decimal_point(),
            thousands_sep: String::new(),
            currency_symbol: defaults::currency_symbol(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Directory defaults
    pub fn title() -> String {
        "Flat Directory".into()
    }
    pub fn description() -> String {
        "Currently available flats from {sources} real estate companies.".into()
    }
    pub fn data_path() -> PathBuf {
        PathBuf::from("data")
    }
    pub fn cache_ttl() -> u64 {
        30
    }
    pub fn offline_after() -> u64 {
        90
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; flatdir/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Locale defaults
    pub fn decimal_point() -> String {
        ".".into()
    }
    pub fn currency_symbol() -> String {
        "¤".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [directory]
        title = "Berlin Flats"
        data_path = "/tmp/flats"
        cache_ttl_minutes = 10

        [locale]
        decimal_point = ","
        thousands_sep = "."
        currency_symbol = "€"

        [[sources]]
        url = "https://www.howoge.de/?type=999&tx_howsite_json_list[action]=immoList"
        ad_path = "immoobjects.*"
        url_path = "link"
        title_path = "title"
        location_path = "district"
        rooms_path = "rooms"

        [[sources]]
        url = "https://www.example.org/flats/"
        ad_path = ".//div[@class='property']"
        url_path = "div/h3/a/@href"
        title_path = "div/h3/a"
        location_path = "div/div:[^,]*"
        rooms_path = "div/div[2]"
        rent_path = "div/div[3]"
        rooms_optional = true
        location_filter = "Berlin"
    "#;

    #[test]
    fn parse_full_config() {
        let config = Config::parse(CONFIG).unwrap();
        assert_eq!(config.directory.title, "Berlin Flats");
        assert_eq!(config.directory.cache_ttl().unwrap(), Duration::minutes(10));
        assert_eq!(config.directory.offline_after().unwrap(), Duration::minutes(90));
        assert_eq!(config.locale.number_format().unwrap().parse("1.250,50 €"), 1250.5);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].rent_path, None);
        assert!(!config.sources[0].rooms_optional);
        assert_eq!(config.sources[1].rent_path.as_deref(), Some("div/div[3]"));
        assert_eq!(config.sources[1].location_filter.as_deref(), Some("Berlin"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_title() {
        let mut config = Config::default();
        config.directory.title = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_huge_durations() {
        let config = Config::parse("[directory]\ncache_ttl_minutes = 1000000000000000\n").unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert!(config.directory.cache_ttl().is_err());

        let mut config = Config::default();
        config.directory.offline_after_minutes = u64::MAX;
        assert!(config.validate().is_err());
        assert!(config.directory.offline_after().is_err());
    }

    #[test]
    fn validate_rejects_relative_source_url() {
        let mut config = Config::parse(CONFIG).unwrap();
        config.sources[1].url = "flats.html".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "sources[1]: Relative url flats.html");
    }

    #[test]
    fn parse_rejects_missing_field() {
        let err = Config::parse("[[sources]]\nurl = \"https://example.org/\"\n").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }
}
