// src/services/extract.rs

//! Ad extraction from listing documents.
//!
//! Extraction is all or nothing: the first ad that cannot be extracted fails
//! the whole document.

use chrono::{DateTime, Utc};
use scraper::Html;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Ad, Document, DocumentKind, Source};
use crate::query::{
    CompiledField, FieldPath, JsonNode, MarkupNode, NumberFormat, QueryNode, ScalarKind,
    fuzzy_float,
};
use crate::utils::{decode_html, resolve};

/// Placeholder for a blank title or location.
const UNKNOWN: &str = "?";

/// Extracts the ads of one source from its listing document.
pub struct AdExtractor<'a> {
    source: &'a Source,
    format: &'a NumberFormat,
}

impl<'a> AdExtractor<'a> {
    pub fn new(source: &'a Source, format: &'a NumberFormat) -> Self {
        Self { source, format }
    }

    /// Extract all ads of `document`, first seen at `now`, and apply the
    /// source filters.
    pub fn extract(&self, document: &Document, now: DateTime<Utc>) -> Result<Vec<Ad>> {
        let ads = match document.kind {
            DocumentKind::Markup => self.extract_markup(&document.bytes, now)?,
            DocumentKind::Json => self.extract_json(&document.bytes, now)?,
        };
        Ok(ads.into_iter().filter(|ad| self.keep(ad)).collect())
    }

    fn extract_markup(&self, bytes: &[u8], now: DateTime<Utc>) -> Result<Vec<Ad>> {
        // Real-world listings are rarely valid, so parse leniently
        let html = Html::parse_document(&decode_html(bytes));
        let root = MarkupNode::Element(html.root_element());

        let base = match root.query(".//base/@href")?.first() {
            Some(href) => resolve(self.source.url(), href.text().trim())?,
            None => self.source.url().clone(),
        };
        let nodes = root.query(self.source.ad_path())?;
        self.extract_nodes(&nodes, &base, now)
    }

    fn extract_json(&self, bytes: &[u8], now: DateTime<Utc>) -> Result<Vec<Ad>> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| AppError::decode(format!("Bad document line {}", e.line())))?;
        let root = JsonNode(&value);
        if !value.is_object() {
            return Err(AppError::decode(format!(
                "Bad document root type {}",
                root.type_name()
            )));
        }

        let nodes = root.query(self.source.ad_path())?;
        if let Some(node) = nodes.iter().find(|node| !node.value().is_object()) {
            return Err(AppError::lookup(format!(
                "Bad item type {} at {}",
                node.type_name(),
                self.source.ad_path()
            )));
        }
        self.extract_nodes(&nodes, self.source.url(), now)
    }

    fn extract_nodes<N: QueryNode>(
        &self,
        nodes: &[N],
        base: &Url,
        now: DateTime<Utc>,
    ) -> Result<Vec<Ad>> {
        let config = self.source.config();
        let compile = |field: &str| FieldPath::parse(field)?.compile::<N>();
        let url = compile(config.url_path.as_str())?;
        let title = compile(config.title_path.as_str())?;
        let location = compile(config.location_path.as_str())?;
        let rooms = compile(config.rooms_path.as_str())?;
        let rent = config.rent_path.as_deref().map(compile).transpose()?;

        nodes
            .iter()
            .map(|node| {
                let href = url.extract_text(node, false)?;
                let url = resolve(base, href.trim())?;
                let title = or_unknown(title.extract_text(node, false)?);
                let location = or_unknown(location.extract_text(node, false)?);
                let rooms = self.number(&rooms, node, self.source.rooms_optional())?;
                let rent = match &rent {
                    Some(rent) => self.number(rent, node, false)?,
                    None => 0.0,
                };
                Ad::new(url, &title, &location, rooms, rent, now)
            })
            .collect()
    }

    /// Extract a numeric field; an absent optional field is 0.
    fn number<N: QueryNode>(
        &self,
        field: &CompiledField<N>,
        node: &N,
        optional: bool,
    ) -> Result<f64> {
        Ok(field
            .extract(node, ScalarKind::NUMBER, optional)?
            .map(|value| fuzzy_float(&value, self.format))
            .unwrap_or(0.0))
    }

    fn keep(&self, ad: &Ad) -> bool {
        if ad.rooms() == 0.0 && !self.source.rooms_optional() {
            return false;
        }
        self.source
            .location_filter()
            .is_none_or(|filter| ad.location().contains(filter))
    }
}

fn or_unknown(text: String) -> String {
    if text.trim().is_empty() {
        UNKNOWN.to_string()
    } else {
        text
    }
}
