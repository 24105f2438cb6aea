//! Canonical JSON interchange for [`Forecast`] documents.

use crate::error::{Result, SchemaError};
use crate::models::{DayForecast, Forecast};
use serde_json::Value;
use std::path::Path;

pub fn serialize(forecast: &Forecast) -> std::result::Result<String, SchemaError> {
    serde_json::to_string_pretty(forecast).map_err(|e| SchemaError::InvalidStructure(e.to_string()))
}

pub fn deserialize(text: &str) -> std::result::Result<Forecast, SchemaError> {
    serde_json::from_str(text).map_err(|e| SchemaError::InvalidStructure(e.to_string()))
}

pub fn write_forecast(path: &Path, forecast: &Forecast) -> Result<()> {
    let mut text = serialize(forecast)?;
    text.push('\n');
    std::fs::write(path, text)?;
    Ok(())
}

pub fn read_forecast(path: &Path) -> Result<Forecast> {
    let text = std::fs::read_to_string(path)?;
    Ok(deserialize(&text)?)
}

/// One slot's value for a selected field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub date: Option<String>,
    pub time: String,
    pub value: Value,
}

/// The named slot field across every day, day-then-time order.
pub fn select_field(
    forecast: &Forecast,
    field: &str,
) -> std::result::Result<Vec<FieldValue>, SchemaError> {
    let mut values = Vec::new();
    for day in &forecast.forecast {
        values.extend(select_day_field(day, field)?);
    }
    Ok(values)
}

pub fn select_day_field(
    day: &DayForecast,
    field: &str,
) -> std::result::Result<Vec<FieldValue>, SchemaError> {
    day.hourly
        .iter()
        .map(|slot| {
            let encoded = serde_json::to_value(slot)
                .map_err(|e| SchemaError::InvalidStructure(e.to_string()))?;
            let Value::Object(mut map) = encoded else {
                return Err(SchemaError::InvalidStructure("slot is not an object".into()));
            };
            let Some(value) = map.remove(field) else {
                return Err(SchemaError::UnknownField {
                    field: field.to_string(),
                    available: map.keys().cloned().collect(),
                });
            };
            Ok(FieldValue {
                date: day.date.clone(),
                time: slot.time.clone(),
                value,
            })
        })
        .collect()
}
