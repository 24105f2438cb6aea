//! Locating the embedded forecast payload and the date selector in a page.

use super::entities::decode_entities;
use crate::error::ExtractionError;
use regex_lite::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// `data-forecast` on the first `<custom-forecast>` tag, either quote style.
static PAYLOAD_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    let other_attr = r#"[^\s=>/]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>"']+))?"#;
    Regex::new(&format!(
        r#"(?is)<custom-forecast\b(?:\s+{other_attr})*?\s+data-forecast\s*=\s*(?:"([^"]*)"|'([^']*)')"#
    ))
    .expect("payload pattern is valid")
});

static DATE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("select#date_selector").expect("selector is valid"));
static OPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("option").expect("selector is valid"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("selector is valid"));

/// Decoded payload exactly as the site embeds it
#[derive(Debug, Clone, PartialEq)]
pub struct RawForecastBlob(pub serde_json::Value);

/// Date labels of the day selector, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateIndex(pub Vec<String>);

impl DateIndex {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A forecast page parsed once and queried for each embedded piece.
pub struct SourcePage<'a> {
    raw: &'a str,
    document: Html,
}

impl<'a> SourcePage<'a> {
    pub fn parse(raw: &'a str) -> Self {
        Self {
            raw,
            document: Html::parse_document(raw),
        }
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    pub fn payload(&self) -> Result<RawForecastBlob, ExtractionError> {
        let attribute = locate_payload(self.raw)?;
        decode_payload(attribute)
    }

    pub fn dates(&self) -> Result<DateIndex, ExtractionError> {
        let select = self
            .document
            .select(&DATE_SELECTOR)
            .next()
            .ok_or(ExtractionError::MissingDateSelector)?;

        let dates = select
            .select(&OPTION)
            .filter_map(|option| {
                // placeholder options carry no value
                let value = option.value().attr("value")?.trim();
                if value.is_empty() {
                    return None;
                }
                let text = option.text().collect::<String>();
                let label = match text.trim() {
                    "" => value,
                    label => label,
                };
                Some(label.to_string())
            })
            .collect();

        Ok(DateIndex(dates))
    }

    /// Place name from a title shaped like `Weather - Sartrouville - 14-Day Forecast`.
    pub fn title_location(&self) -> Option<String> {
        let title = self
            .document
            .select(&TITLE)
            .next()?
            .text()
            .collect::<String>();
        let place = title.split(" - ").nth(1)?.trim();
        (!place.is_empty()).then(|| place.to_string())
    }
}

/// Pull the payload and the date index out of a page.
pub fn extract(html: &str) -> Result<(RawForecastBlob, DateIndex), ExtractionError> {
    let page = SourcePage::parse(html);
    Ok((page.payload()?, page.dates()?))
}

/// Raw (still entity-escaped) attribute text; empty counts as absent.
pub fn locate_payload(html: &str) -> Result<&str, ExtractionError> {
    PAYLOAD_ATTRIBUTE
        .captures(html)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .filter(|attr| !attr.trim().is_empty())
        .ok_or(ExtractionError::MissingBlob)
}

pub fn decode_payload(attribute: &str) -> Result<RawForecastBlob, ExtractionError> {
    let decoded = decode_entities(attribute);
    serde_json::from_str(&decoded)
        .map(RawForecastBlob)
        .map_err(|e| ExtractionError::MalformedJson(e.to_string()))
}
