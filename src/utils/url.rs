// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

use crate::error::{AppError, Result};

/// Parse `value` as an absolute URL with a host.
///
/// # Examples
/// ```
/// use flatdir::utils::url::absolute_url;
///
/// assert!(absolute_url("https://example.com/flats").is_ok());
/// assert!(absolute_url("/flats").is_err());
/// ```
pub fn absolute_url(value: &str) -> Result<Url> {
    let url = Url::parse(value).map_err(|_| AppError::validation(format!("Relative url {value}")))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(AppError::validation(format!("Bad url {value}")));
    }
    Ok(url)
}

/// Extract the lowercase host of an absolute URL.
pub fn host(url: &Url) -> Option<String> {
    url.host_str().map(str::to_lowercase)
}

/// Resolve a potentially relative URL against a base URL.
pub fn resolve(base: &Url, href: &str) -> Result<Url> {
    Ok(base.join(href.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url() {
        assert!(absolute_url("https://example.com/path").is_ok());
        assert!(absolute_url("mitte.html").is_err());
        assert!(absolute_url("file:///tmp/ads.json").is_err());
    }

    #[test]
    fn test_host() {
        let url = Url::parse("https://Sub.Example.com:8080/path").unwrap();
        assert_eq!(host(&url), Some("sub.example.com".to_string()));
    }

    #[test]
    fn test_resolve() {
        let base = Url::parse("https://example.com/path/index.html").unwrap();
        assert_eq!(
            resolve(&base, "page.html").unwrap().as_str(),
            "https://example.com/path/page.html"
        );
        assert_eq!(
            resolve(&base, "/root.html").unwrap().as_str(),
            "https://example.com/root.html"
        );
        assert_eq!(
            resolve(&base, "https://other.com/x").unwrap().as_str(),
            "https://other.com/x"
        );
        assert!(resolve(&base, "http://[::1").is_err());
    }
}
