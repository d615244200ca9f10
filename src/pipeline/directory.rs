// src/pipeline/directory.rs

//! Directory of flats from different real estate companies.
//!
//! The directory owns its sources. Per-source operations are reached through
//! [`BoundSource`], a handle pairing a source with the directory that supplies
//! its storage, fetcher and number format; a source cannot be fetched or
//! updated outside of a directory.

use chrono::{DateTime, Duration, Utc};

use crate::error::{AppError, ErrorKind, Result};
use crate::models::{
    Ad, Config, DirectoryConfig, HttpConfig, LocaleConfig, Source,
};
use crate::pipeline::diff::{AdDiff, calculate_diff, merge_first_seen};
use crate::query::NumberFormat;
use crate::services::{AdExtractor, DocumentFetcher};
use crate::storage::{AdStorage, LocalStorage};

/// Directory of available flats.
pub struct Directory {
    title: String,
    description: String,
    extra: Option<String>,
    currency: String,
    sources: Vec<Source>,
    storage: LocalStorage,
    fetcher: DocumentFetcher,
    format: NumberFormat,
    offline_after: Duration,
}

impl Directory {
    /// Create a directory of `sources`, kept in the given order.
    ///
    /// `{sources}` in the description expands to the number of sources.
    pub fn new(
        sources: Vec<Source>,
        directory: &DirectoryConfig,
        http: &HttpConfig,
        locale: &LocaleConfig,
    ) -> Result<Self> {
        let title = directory.title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Blank title"));
        }
        let description = directory.description.trim();
        if description.is_empty() {
            return Err(AppError::validation("Blank description"));
        }

        let storage = LocalStorage::new(&directory.data_path);
        let fetcher = DocumentFetcher::new(storage.clone(), directory.cache_ttl()?, http)?;
        Ok(Self {
            title: title.to_string(),
            description: description.replace("{sources}", &sources.len().to_string()),
            extra: directory.extra.clone().filter(|extra| !extra.trim().is_empty()),
            currency: locale.currency_symbol.clone(),
            sources,
            storage,
            fetcher,
            format: locale.number_format()?,
            offline_after: directory.offline_after()?,
        })
    }

    /// Create a directory from a validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let sources = config
            .sources
            .iter()
            .cloned()
            .map(Source::new)
            .collect::<Result<Vec<_>>>()?;
        Self::new(sources, &config.directory, &config.http, &config.locale)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Extra information about the directory as HTML.
    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref()
    }

    /// Currency symbol for rents.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// Sources in directory order.
    pub fn sources(&self) -> impl Iterator<Item = BoundSource<'_>> {
        self.sources.iter().map(|source| BoundSource {
            directory: self,
            source,
        })
    }

    /// Source with the given host.
    pub fn source(&self, host: &str) -> Option<BoundSource<'_>> {
        self.sources().find(|bound| bound.host() == host)
    }

    /// Stored ads of all sources, in source order.
    pub fn ads(&self) -> Result<Vec<Ad>> {
        let mut ads = Vec::new();
        for source in self.sources() {
            ads.extend(source.ads()?);
        }
        Ok(ads)
    }

    /// Update every source in order.
    ///
    /// A failing source is logged and recorded in the outcome; it never stops
    /// the remaining sources from being updated.
    pub fn update(&self, now: DateTime<Utc>) -> UpdateOutcome {
        let mut outcome = UpdateOutcome::default();
        for source in self.sources() {
            match source.update(now) {
                Ok(update) => {
                    log::info!(
                        "Updated {} ad(s) from {} ({} new, {} changed, {} gone)",
                        update.ads.len(),
                        update.host,
                        update.diff.added.len(),
                        update.diff.updated.len(),
                        update.diff.removed.len()
                    );
                    outcome.updated.push(update);
                }
                Err(e) => {
                    let failure = SourceFailure::new(source.host(), &e);
                    match failure.kind {
                        ErrorKind::Transport => {
                            log::error!("Failed to communicate with {} ({})", failure.host, e)
                        }
                        ErrorKind::Storage => {
                            log::error!("Failed to access data for {} ({})", failure.host, e)
                        }
                        _ => log::error!("Failed to parse flat ads from {} ({})", failure.host, e),
                    }
                    outcome.failures.push(failure);
                }
            }
        }
        outcome
    }
}

/// A source together with the directory it belongs to.
#[derive(Clone, Copy)]
pub struct BoundSource<'a> {
    directory: &'a Directory,
    source: &'a Source,
}

impl<'a> BoundSource<'a> {
    pub fn source(&self) -> &'a Source {
        self.source
    }

    pub fn host(&self) -> &'a str {
        self.source.host()
    }

    /// Query the currently published ads, first seen at `now`.
    ///
    /// The listing document is fetched unless a cached copy is fresh.
    pub fn query(&self, now: DateTime<Utc>) -> Result<Vec<Ad>> {
        let document = self.directory.fetcher.fetch(self.source, now)?;
        AdExtractor::new(self.source, &self.directory.format).extract(&document, now)
    }

    /// Query the current ads and store them, keeping the first-seen time of
    /// ads that were already known.
    pub fn update(&self, now: DateTime<Utc>) -> Result<SourceUpdate> {
        let storage = &self.directory.storage;
        let previous = storage.load(self.source)?;
        let ads = merge_first_seen(&previous, self.query(now)?);
        let diff = calculate_diff(&previous, &ads);
        storage.save(self.source, &ads)?;
        Ok(SourceUpdate {
            host: self.host().to_string(),
            ads,
            diff,
        })
    }

    /// Stored ads of the source.
    pub fn ads(&self) -> Result<Vec<Ad>> {
        self.directory.storage.load(self.source)
    }

    /// Whether the source was updated successfully recently enough at `now`.
    pub fn is_ok(&self, now: DateTime<Utc>) -> Result<bool> {
        Ok(self
            .directory
            .storage
            .last_saved(self.source)?
            .is_some_and(|saved| now - saved < self.directory.offline_after))
    }
}

/// Result of a successful source update.
#[derive(Debug, Clone)]
pub struct SourceUpdate {
    pub host: String,
    /// Ads now stored for the source
    pub ads: Vec<Ad>,
    pub diff: AdDiff,
}

/// A source whose update failed.
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub host: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl SourceFailure {
    fn new(host: &str, error: &AppError) -> Self {
        Self {
            host: host.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Summary of [`Directory::update`].
#[derive(Debug, Clone, Default)]
pub struct UpdateOutcome {
    pub updated: Vec<SourceUpdate>,
    pub failures: Vec<SourceFailure>,
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total number of ads stored by successful updates.
    pub fn ad_count(&self) -> usize {
        self.updated.iter().map(|update| update.ads.len()).sum()
    }
}
