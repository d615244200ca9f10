// src/services/fetch.rs

//! Document fetcher with an on-disk cache.
//!
//! The listing document of a source is cached as `<host>.html` or
//! `<host>.json` below the data directory. A cached document younger than the
//! TTL is reused without a network call; the file modification time is the
//! cache clock.

use chrono::{DateTime, Duration, Utc};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::Result;
use crate::models::{Document, DocumentKind, HttpConfig, Source};
use crate::storage::LocalStorage;
use crate::utils::http::{create_client, mime_essence};

/// Fetches source documents, reusing fresh cached copies.
pub struct DocumentFetcher {
    storage: LocalStorage,
    ttl: Duration,
    client: Client,
}

impl DocumentFetcher {
    /// Create a fetcher caching below `storage` with a client built from `http`.
    pub fn new(storage: LocalStorage, ttl: Duration, http: &HttpConfig) -> Result<Self> {
        Ok(Self::with_client(storage, ttl, create_client(http)?))
    }

    pub fn with_client(storage: LocalStorage, ttl: Duration, client: Client) -> Self {
        Self {
            storage,
            ttl,
            client,
        }
    }

    /// Get the listing document of `source`, from the cache if fresh at `now`.
    ///
    /// Transport failures, including HTTP error statuses, are returned as
    /// [`AppError::Http`](crate::error::AppError::Http). A response with a
    /// content type other than HTML or JSON fails before anything is cached.
    pub fn fetch(&self, source: &Source, now: DateTime<Utc>) -> Result<Document> {
        if let Some(document) = self.cached(source.host(), now)? {
            log::debug!("Using cached {} document of {}", document.kind, source.host());
            return Ok(document);
        }

        let response = self
            .client
            .get(source.url().clone())
            .send()?
            .error_for_status()?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(mime_essence)
            .unwrap_or_default();
        let kind = DocumentKind::from_content_type(&content_type)?;
        let bytes = response.bytes()?.to_vec();

        self.store(source.host(), kind, &bytes)?;
        log::debug!("Fetched {} ({} bytes)", source.url(), bytes.len());
        Ok(Document::new(kind, bytes))
    }

    /// Cached document of `host` if one is fresh at `now`.
    pub fn cached(&self, host: &str, now: DateTime<Utc>) -> Result<Option<Document>> {
        for kind in DocumentKind::ALL {
            let key = cache_key(host, kind);
            let Some(modified) = self.storage.modified(&key)? else {
                continue;
            };
            if now - modified > self.ttl {
                continue;
            }
            if let Some(bytes) = self.storage.read_bytes(&key)? {
                return Ok(Some(Document::new(kind, bytes)));
            }
        }
        Ok(None)
    }

    /// Write the document and drop a cached copy of the other kind.
    fn store(&self, host: &str, kind: DocumentKind, bytes: &[u8]) -> Result<()> {
        self.storage.write_bytes(&cache_key(host, kind), bytes)?;
        for other in DocumentKind::ALL.into_iter().filter(|k| *k != kind) {
            self.storage.remove(&cache_key(host, other))?;
        }
        Ok(())
    }
}

fn cache_key(host: &str, kind: DocumentKind) -> String {
    format!("{host}.{}", kind.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::SourceConfig;
    use tempfile::TempDir;

    fn source(url: &str) -> Source {
        Source::new(SourceConfig::new(url, "ads.*", "url", "title", "location", "rooms")).unwrap()
    }

    fn fetcher(tmp: &TempDir) -> DocumentFetcher {
        let http = HttpConfig {
            timeout_secs: 2,
            ..HttpConfig::default()
        };
        DocumentFetcher::new(LocalStorage::new(tmp.path()), Duration::minutes(30), &http).unwrap()
    }

    #[test]
    fn test_fresh_cache_is_reused() {
        let tmp = TempDir::new().unwrap();
        let fetcher = fetcher(&tmp);
        std::fs::write(tmp.path().join("127.0.0.1.json"), b"{\"ads\": []}").unwrap();

        // Nothing listens on the discard port, so a network call would fail
        let document = fetcher.fetch(&source("http://127.0.0.1:9/ads"), Utc::now()).unwrap();
        assert_eq!(document.kind, DocumentKind::Json);
        assert_eq!(document.bytes, b"{\"ads\": []}");
    }

    #[test]
    fn test_markup_cache_checked_first() {
        let tmp = TempDir::new().unwrap();
        let fetcher = fetcher(&tmp);
        std::fs::write(tmp.path().join("127.0.0.1.html"), b"<ul></ul>").unwrap();
        std::fs::write(tmp.path().join("127.0.0.1.json"), b"{}").unwrap();

        let document = fetcher.cached("127.0.0.1", Utc::now()).unwrap().unwrap();
        assert_eq!(document.kind, DocumentKind::Markup);
    }

    #[test]
    fn test_stale_cache_is_refetched() {
        let tmp = TempDir::new().unwrap();
        let fetcher = fetcher(&tmp);
        std::fs::write(tmp.path().join("127.0.0.1.html"), b"<ul></ul>").unwrap();

        let later = Utc::now() + Duration::minutes(31);
        assert!(fetcher.cached("127.0.0.1", later).unwrap().is_none());
        let err = fetcher.fetch(&source("http://127.0.0.1:9/ads"), later).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        let tmp = TempDir::new().unwrap();
        let err = fetcher(&tmp)
            .fetch(&source("http://127.0.0.1:9/ads"), Utc::now())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(!tmp.path().join("127.0.0.1.html").exists());
    }

    #[test]
    fn test_store_replaces_other_kind() {
        let tmp = TempDir::new().unwrap();
        let fetcher = fetcher(&tmp);
        std::fs::write(tmp.path().join("example.org.html"), b"<ul></ul>").unwrap();

        fetcher.store("example.org", DocumentKind::Json, b"{}").unwrap();
        assert!(!tmp.path().join("example.org.html").exists());
        assert!(tmp.path().join("example.org.json").exists());
    }
}
