//! Flat ad data structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::utils::absolute_url;

/// A flat advertisement.
///
/// Construction validates that `url` is absolute and that `title` and
/// `location` are non-blank; both are stored trimmed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ad {
    url: String,
    host: String,
    title: String,
    location: String,
    rooms: f64,
    rent: f64,
    first_seen: DateTime<Utc>,
}

impl Ad {
    /// Create a validated ad.
    pub fn new(
        url: impl Into<String>,
        title: &str,
        location: &str,
        rooms: f64,
        rent: f64,
        first_seen: DateTime<Utc>,
    ) -> Result<Self> {
        let url = url.into();
        let host = absolute_url(&url)
            .map_err(|_| AppError::validation(format!("Bad url {url}")))?
            .host_str()
            .unwrap_or_default()
            .to_lowercase();

        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Blank title"));
        }
        let location = location.trim();
        if location.is_empty() {
            return Err(AppError::validation("Blank location"));
        }

        Ok(Self {
            url,
            host,
            title: title.to_string(),
            location: location.to_string(),
            rooms,
            rent,
            first_seen,
        })
    }

    /// URL of the ad, unique within a source.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Hostname of the related real estate company.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Coarse location of the flat, i.e. district or city.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn rooms(&self) -> f64 {
        self.rooms
    }

    /// Amount of rent, 0 if unknown.
    pub fn rent(&self) -> f64 {
        self.rent
    }

    /// Time the ad was first observed.
    pub fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }

    /// Return the ad with `first_seen` replaced.
    pub fn with_first_seen(mut self, first_seen: DateTime<Utc>) -> Self {
        self.first_seen = first_seen;
        self
    }
}

/// One row of a source state file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdRecord {
    pub url: String,
    pub title: String,
    pub location: String,
    pub rooms: f64,

    /// Missing in state files written before rent was tracked
    #[serde(default)]
    pub rent: f64,

    /// ISO 8601 first-seen timestamp
    pub time: DateTime<Utc>,
}

impl From<&Ad> for AdRecord {
    fn from(ad: &Ad) -> Self {
        Self {
            url: ad.url.clone(),
            title: ad.title.clone(),
            location: ad.location.clone(),
            rooms: ad.rooms,
            rent: ad.rent,
            time: ad.first_seen,
        }
    }
}

impl TryFrom<AdRecord> for Ad {
    type Error = AppError;

    fn try_from(record: AdRecord) -> Result<Self> {
        Ad::new(
            record.url,
            &record.title,
            &record.location,
            record.rooms,
            record.rent,
            record.time,
        )
    }
}
