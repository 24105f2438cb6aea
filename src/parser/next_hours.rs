//! The hour-by-hour table for the next 24 hours (`<div id="forecast_24">`).

use super::extract::DateIndex;
use crate::models::{parse_date, NextHourSlot};
use chrono::Duration;
use regex_lite::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#forecast_24 table").expect("selector is valid"));
static HEADER_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("thead th").expect("selector is valid"));
static BODY_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody tr").expect("selector is valid"));
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("selector is valid"));
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").expect("selector is valid"));
static DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div").expect("selector is valid"));
static SPAN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("selector is valid"));

static SIGNED_INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+").expect("valid pattern"));
static UNSIGNED_INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid pattern"));
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid pattern"));
static ARROW_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^arrow_(\d+)$").expect("valid pattern"));

const DATE_LABEL: &str = "%Y/%m/%d";

/// One table column as read from the page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNextHour {
    pub header: String,
    pub description: Option<String>,
    pub temperature_c: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub precipitation_probability_pct: Option<f64>,
    pub wind_direction: Option<String>,
    pub wind_direction_deg: Option<u16>,
    pub wind_speed_kmh: Option<f64>,
}

/// Columns of the next-24h table; empty when the section is absent.
pub fn extract_next_hours(document: &Html) -> Vec<RawNextHour> {
    let Some(table) = document.select(&TABLE).next() else {
        return Vec::new();
    };

    let headers: Vec<String> = table
        .select(&HEADER_CELL)
        .map(collapse_text)
        .collect();

    let Some(row) = table.select(&BODY_ROW).next() else {
        return Vec::new();
    };

    row.select(&CELL)
        .enumerate()
        .map(|(i, cell)| {
            let mut column = read_cell(cell);
            column.header = headers.get(i).cloned().unwrap_or_default();
            column
        })
        .collect()
}

fn read_cell(cell: ElementRef<'_>) -> RawNextHour {
    let mut column = RawNextHour {
        description: cell
            .select(&IMG)
            .next()
            .and_then(|img| img.value().attr("alt"))
            .map(str::to_string),
        ..Default::default()
    };

    for span in cell.select(&SPAN) {
        let text = collapse_text(span);
        if text.contains("mm") {
            column.precipitation_mm = first_number(&DECIMAL, &text);
        } else if text.contains('%') {
            column.precipitation_probability_pct = first_number(&UNSIGNED_INT, &text);
        }
    }

    for div in cell.select(&DIV) {
        let classes: Vec<&str> = div.value().classes().collect();
        if column.temperature_c.is_none() && classes.iter().any(|c| c.contains("temperature_line")) {
            column.temperature_c = first_number(&SIGNED_INT, &collapse_text(div));
        }
        if column.wind_direction.is_none() && classes.iter().any(|c| c.contains("wind_ico")) {
            column.wind_direction = Some(collapse_text(div)).filter(|t| !t.is_empty());
            column.wind_direction_deg = classes.iter().find_map(|c| {
                ARROW_CLASS
                    .captures(c)
                    .and_then(|caps| caps[1].parse::<u16>().ok())
            });
        }
        if column.wind_speed_kmh.is_none() {
            let text = collapse_text(div);
            if text.contains("km/h") {
                column.wind_speed_kmh = first_number(&UNSIGNED_INT, &text);
            }
        }
    }

    column
}

/// Attach dates: columns marked "tomorrow" take the first day-group's date,
/// the rest take the day before it.
pub fn normalize_next_hours(columns: &[RawNextHour], dates: &DateIndex) -> Vec<NextHourSlot> {
    let tomorrow = dates.get(0).and_then(parse_date);
    let today = tomorrow.map(|d| d - Duration::days(1));

    columns
        .iter()
        .map(|column| {
            let is_tomorrow = column.header.contains("tomorrow");
            let date = if is_tomorrow { tomorrow } else { today };
            let time = column
                .header
                .split_whitespace()
                .next()
                .unwrap_or("??:??")
                .to_string();

            NextHourSlot {
                date: date.map(|d| d.format(DATE_LABEL).to_string()),
                time,
                weather_description: column
                    .description
                    .clone()
                    .unwrap_or_else(|| "unknown".into()),
                temperature_c: column.temperature_c,
                precipitation_mm: column.precipitation_mm,
                precipitation_probability_pct: column.precipitation_probability_pct,
                wind_direction: column.wind_direction.clone(),
                wind_direction_deg: column.wind_direction_deg,
                wind_speed_kmh: column.wind_speed_kmh,
            }
        })
        .collect()
}

fn collapse_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_number(pattern: &Regex, text: &str) -> Option<f64> {
    pattern.find(text)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::testdata;

    fn columns() -> Vec<RawNextHour> {
        let html = testdata::page(&testdata::payload(1), &["2026/02/25"]);
        extract_next_hours(&Html::parse_document(&html))
    }

    #[test]
    fn reads_every_column() {
        let columns = columns();
        assert_eq!(columns.len(), 3);

        let first = &columns[0];
        assert_eq!(first.header, "22:00");
        assert_eq!(first.description.as_deref(), Some("clear sky"));
        assert_eq!(first.temperature_c, Some(5.0));
        assert_eq!(first.precipitation_mm, Some(0.2));
        assert_eq!(first.precipitation_probability_pct, Some(30.0));
        assert_eq!(first.wind_direction.as_deref(), Some("E"));
        assert_eq!(first.wind_direction_deg, Some(90));
        assert_eq!(first.wind_speed_kmh, Some(12.0));

        assert_eq!(columns[1].temperature_c, Some(-1.0));
        assert_eq!(columns[1].precipitation_mm, None);
        assert_eq!(columns[2].header, "00:00 tomorrow");
        assert_eq!(columns[2].description, None);
    }

    #[test]
    fn dates_follow_tomorrow_marker() {
        let slots = normalize_next_hours(&columns(), &DateIndex(vec!["2026/02/25".into()]));
        assert_eq!(slots[0].date.as_deref(), Some("2026/02/24"));
        assert_eq!(slots[0].time, "22:00");
        assert_eq!(slots[2].date.as_deref(), Some("2026/02/25"));
        assert_eq!(slots[2].time, "00:00");
        assert_eq!(slots[2].weather_description, "unknown");
    }

    #[test]
    fn no_dates_without_first_day() {
        let slots = normalize_next_hours(&columns(), &DateIndex::default());
        assert!(slots.iter().all(|s| s.date.is_none()));
    }

    #[test]
    fn missing_section_is_empty() {
        let html = testdata::page_without_payload(&[]);
        assert!(extract_next_hours(&Html::parse_document(&html)).is_empty());
    }
}
