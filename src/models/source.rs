//! Real estate company configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::query::FieldPath;
use crate::utils::{absolute_url, host};

/// Field paths and filters of a source, as written in the config file.
///
/// Every path may carry a trailing `:pattern` regex post-filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the document listing the currently available flats
    pub url: String,

    /// Path matching all ads in the document
    pub ad_path: String,

    /// URL field of an ad
    pub url_path: String,

    /// Title field of an ad
    pub title_path: String,

    /// Coarse location field of an ad, i.e. district or city
    pub location_path: String,

    /// Rooms field of an ad
    pub rooms_path: String,

    /// Rent field of an ad
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_path: Option<String>,

    /// Keep ads without a rooms field (with zero rooms)
    #[serde(default)]
    pub rooms_optional: bool,

    /// Term the location of a flat needs to contain to be included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_filter: Option<String>,
}

impl SourceConfig {
    /// Create a config with the mandatory fields and no rent path.
    pub fn new(
        url: impl Into<String>,
        ad_path: impl Into<String>,
        url_path: impl Into<String>,
        title_path: impl Into<String>,
        location_path: impl Into<String>,
        rooms_path: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            ad_path: ad_path.into(),
            url_path: url_path.into(),
            title_path: title_path.into(),
            location_path: location_path.into(),
            rooms_path: rooms_path.into(),
            rent_path: None,
            rooms_optional: false,
            location_filter: None,
        }
    }

    pub fn with_rent_path(mut self, rent_path: impl Into<String>) -> Self {
        self.rent_path = Some(rent_path.into());
        self
    }

    pub fn with_rooms_optional(mut self, rooms_optional: bool) -> Self {
        self.rooms_optional = rooms_optional;
        self
    }

    pub fn with_location_filter(mut self, filter: impl Into<String>) -> Self {
        self.location_filter = Some(filter.into());
        self
    }
}

/// A validated real estate company.
#[derive(Debug, Clone)]
pub struct Source {
    url: Url,
    host: String,
    config: SourceConfig,
}

impl Source {
    /// Validate `config` into a source. The document URL must be absolute.
    pub fn new(config: SourceConfig) -> Result<Self> {
        let url = absolute_url(&config.url)?;
        let host = host(&url).ok_or_else(|| AppError::validation(format!("Bad url {url}")))?;
        Ok(Self { url, host, config })
    }

    /// URL of the listing document.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Hostname of the company, also the stem of its cache and state files.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn ad_path(&self) -> &str {
        &self.config.ad_path
    }

    pub fn rooms_optional(&self) -> bool {
        self.config.rooms_optional
    }

    /// Location filter, ignoring blank values.
    pub fn location_filter(&self) -> Option<&str> {
        self.config
            .location_filter
            .as_deref()
            .filter(|filter| !filter.trim().is_empty())
    }

    /// Parse every configured field path, reporting the first syntax error.
    pub fn check_paths(&self) -> Result<()> {
        let mut fields = vec![
            self.config.url_path.as_str(),
            self.config.title_path.as_str(),
            self.config.location_path.as_str(),
            self.config.rooms_path.as_str(),
        ];
        fields.extend(self.config.rent_path.as_deref());
        for field in fields {
            FieldPath::parse(field)?.check()?;
        }
        FieldPath::parse(&self.config.ad_path)?.check()
    }
}
