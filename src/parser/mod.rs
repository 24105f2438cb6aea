pub mod entities;
pub mod extract;
pub mod next_hours;
pub mod normalize;
pub mod validate;

#[cfg(test)]
pub(crate) mod testdata;

use crate::error::PageError;
use crate::models::Forecast;
use extract::SourcePage;
use normalize::normalize;
use validate::{validate, ValidationWarning};

const UNKNOWN_LOCATION: &str = "unknown";

#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub forecast: Forecast,
    pub warnings: Vec<ValidationWarning>,
}

/// Full pipeline over one page: extract, normalize, attach the next-24h
/// table, validate.
///
/// `location` wins over the place name in the page title.
pub fn parse_page(html: &str, location: Option<&str>) -> Result<ParsedPage, PageError> {
    let page = SourcePage::parse(html);
    let blob = page.payload()?;
    let dates = page.dates()?;

    let location = location
        .map(str::to_string)
        .or_else(|| page.title_location())
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

    let mut forecast = normalize(&blob, &dates, &location)?;
    let columns = next_hours::extract_next_hours(page.document());
    forecast.hourly_24h = next_hours::normalize_next_hours(&columns, &dates);

    let mut warnings = validate(&forecast);
    warnings.extend(validate::check_alignment(forecast.forecast.len(), &dates));

    Ok(ParsedPage { forecast, warnings })
}
