//! The single news source this service summarizes.
//!
//! Article URLs are recognised by a plain substring check on the domain, the
//! same rule used on both sides of the wire.

use url::Url;

use crate::error::{AppError, Result};

pub const SOURCE_DOMAIN: &str = "cnbcindonesia.com";
pub const SOURCE_ORIGIN: &str = "https://www.cnbcindonesia.com";

/// Notice shown when the submitted text is not an article of the source site.
pub const INVALID_ARTICLE_NOTICE: &str = "Please enter a valid CNBC Indonesia article";

pub fn is_source_article(input: &str) -> bool {
    input.contains(SOURCE_DOMAIN)
}

/// Whether command-line input is a full article URL rather than an article path.
///
/// Scheme-less input such as `www.cnbcindonesia.com/tech/x` counts as a URL.
pub fn names_article_url(input: &str) -> bool {
    input.contains("://") || is_source_article(input)
}

pub fn ensure_source_article(url: &str) -> Result<()> {
    if is_source_article(url) {
        Ok(())
    } else {
        Err(AppError::InvalidSource(url.to_string()))
    }
}

/// Rebuilds an article URL from the path segments of the page address.
///
/// Returns `None` when there are no segments, so nothing should be requested.
pub fn url_from_segments<S: AsRef<str>>(segments: &[S]) -> Option<String> {
    let segments: Vec<&str> = segments
        .iter()
        .map(AsRef::as_ref)
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(format!("{}/{}", SOURCE_ORIGIN, segments.join("/")))
}

/// Canonical article path used as the page address, e.g. `/tech/example-article`.
pub fn article_path(url: &str) -> Option<String> {
    if let Ok(parsed) = Url::parse(url) {
        return Some(parsed.path().to_string());
    }
    // Scheme-less input such as `www.cnbcindonesia.com/tech/x`
    let (_, rest) = url.split_once(".com")?;
    let path = rest.split(['?', '#']).next().unwrap_or_default();
    if path.starts_with('/') {
        Some(path.to_string())
    } else {
        Some(format!("/{}", path))
    }
}
