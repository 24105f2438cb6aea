//! Mapping the raw payload onto the canonical forecast schema.
//!
//! Day-groups are the payload keys `d_<n>`, taken in ascending `n`. Each group
//! holds parallel arrays, one entry per slot:
//!
//! | key    | slot field                      |
//! |--------|---------------------------------|
//! | `s`    | weather code (negative = night) |
//! | `td`   | temperature, °C                 |
//! | `sr`   | precipitation, mm               |
//! | `rp`   | precipitation probability, %    |
//! | `vsd`  | wind speed, km/h                |
//! | `vg`   | wind gust, km/h (optional)      |
//! | `vd45` | wind bearing, degrees           |
//!
//! The weather-code array sets the slot count; every other array must match it.

use super::extract::{DateIndex, RawForecastBlob};
use crate::error::NormalizationError;
use crate::models::{CompassPoint, DayForecast, Forecast, HourlySlot, Units, TIME_SLOTS};
use serde_json::{Map, Value};
use std::collections::HashMap;

const UNKNOWN_DESCRIPTION: &str = "unknown";

/// Description lookup keyed by `|weather_code|`, read from the payload's `sDesc`.
#[derive(Debug, Clone, Default)]
pub struct DescriptionTable(HashMap<u32, String>);

impl DescriptionTable {
    pub fn from_payload(descriptions: Option<&Value>) -> Self {
        let table = descriptions
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(code, desc)| {
                        Some((code.trim().parse::<u32>().ok()?, desc.as_str()?.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self(table)
    }

    pub fn describe(&self, weather_code: i32) -> &str {
        self.0
            .get(&weather_code.unsigned_abs())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_DESCRIPTION)
    }
}

/// Build a [`Forecast`] from an extracted payload.
///
/// Day-groups pair positionally with `dates`; a group past the end of the
/// date list gets `date: None` instead of failing.
pub fn normalize(
    blob: &RawForecastBlob,
    dates: &DateIndex,
    location: &str,
) -> Result<Forecast, NormalizationError> {
    let root = blob
        .0
        .as_object()
        .ok_or_else(|| invalid("payload", "<root>", "expected a JSON object"))?;
    let descriptions = DescriptionTable::from_payload(root.get("sDesc"));

    let forecast = day_groups(root)
        .into_iter()
        .enumerate()
        .map(|(i, (key, group))| normalize_day(key, group, dates.get(i), &descriptions))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Forecast {
        location: location.to_string(),
        units: Units::default(),
        hourly_24h: Vec::new(),
        forecast,
    })
}

/// `d_<n>` entries sorted by `n`
pub fn day_groups(root: &Map<String, Value>) -> Vec<(&str, &Value)> {
    let mut groups: Vec<(u32, &str, &Value)> = root
        .iter()
        .filter_map(|(key, group)| {
            let n = key.strip_prefix("d_")?.parse::<u32>().ok()?;
            Some((n, key.as_str(), group))
        })
        .collect();
    groups.sort_by_key(|(n, _, _)| *n);
    groups.into_iter().map(|(_, key, group)| (key, group)).collect()
}

fn normalize_day(
    key: &str,
    group: &Value,
    date: Option<&str>,
    descriptions: &DescriptionTable,
) -> Result<DayForecast, NormalizationError> {
    let fields = group
        .as_object()
        .ok_or_else(|| invalid(key, "<day>", "expected a JSON object"))?;

    let codes = series(key, fields, "s")?;
    let count = codes.len();
    if count > TIME_SLOTS.len() {
        return Err(NormalizationError::CountMismatch {
            day: key.to_string(),
            field: "s".into(),
            expected: TIME_SLOTS.len(),
            found: count,
        });
    }

    let temperatures = aligned(key, fields, "td", count)?;
    let precipitation = aligned(key, fields, "sr", count)?;
    let probabilities = aligned(key, fields, "rp", count)?;
    let wind_speeds = aligned(key, fields, "vsd", count)?;
    let bearings = aligned(key, fields, "vd45", count)?;
    let gusts = match fields.get("vg") {
        None | Some(Value::Null) => None,
        Some(_) => Some(aligned(key, fields, "vg", count)?),
    };

    let mut hourly = Vec::with_capacity(count);
    for (i, time) in TIME_SLOTS.iter().take(count).enumerate() {
        let weather_code = integer(key, "s", &codes[i])?;
        let bearing = number(key, "vd45", &bearings[i])?.round() as i64;
        let wind_direction_deg = bearing.rem_euclid(360) as u16;

        hourly.push(HourlySlot {
            time: time.to_string(),
            temperature_c: number(key, "td", &temperatures[i])?,
            weather_code,
            weather_description: descriptions.describe(weather_code).to_string(),
            is_night: weather_code < 0,
            precipitation_mm: non_negative(key, "sr", &precipitation[i])?,
            precipitation_probability_pct: probability(key, "rp", &probabilities[i])?,
            wind_speed_kmh: non_negative(key, "vsd", &wind_speeds[i])?,
            wind_gust_kmh: match gusts {
                Some(values) if !values[i].is_null() => Some(non_negative(key, "vg", &values[i])?),
                _ => None,
            },
            wind_direction_deg,
            wind_direction: CompassPoint::from_degrees(f64::from(wind_direction_deg)),
        });
    }

    Ok(DayForecast {
        day: key.to_string(),
        date: date.map(str::to_string),
        hourly,
    })
}

fn series<'a>(
    day: &str,
    fields: &'a Map<String, Value>,
    field: &str,
) -> Result<&'a Vec<Value>, NormalizationError> {
    match fields.get(field) {
        Some(Value::Array(values)) => Ok(values),
        Some(other) => Err(invalid(day, field, &format!("expected an array, found {}", other))),
        None => Err(invalid(day, field, "missing")),
    }
}

fn aligned<'a>(
    day: &str,
    fields: &'a Map<String, Value>,
    field: &str,
    expected: usize,
) -> Result<&'a Vec<Value>, NormalizationError> {
    let values = series(day, fields, field)?;
    if values.len() != expected {
        return Err(NormalizationError::CountMismatch {
            day: day.to_string(),
            field: field.to_string(),
            expected,
            found: values.len(),
        });
    }
    Ok(values)
}

fn number(day: &str, field: &str, value: &Value) -> Result<f64, NormalizationError> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(day, field, &format!("expected a number, found {}", value)))
}

fn integer(day: &str, field: &str, value: &Value) -> Result<i32, NormalizationError> {
    value
        .as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| invalid(day, field, &format!("expected an integer, found {}", value)))
}

fn non_negative(day: &str, field: &str, value: &Value) -> Result<f64, NormalizationError> {
    let v = number(day, field, value)?;
    if v < 0.0 {
        return Err(invalid(day, field, &format!("negative value {}", v)));
    }
    Ok(v)
}

/// `null` and the page's negative "no data" sentinel both become `None`.
fn probability(day: &str, field: &str, value: &Value) -> Result<Option<f64>, NormalizationError> {
    if value.is_null() {
        return Ok(None);
    }
    let v = number(day, field, value)?;
    Ok((v >= 0.0).then_some(v))
}

fn invalid(day: &str, field: &str, reason: &str) -> NormalizationError {
    NormalizationError::InvalidField {
        day: day.to_string(),
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::testdata;
    use serde_json::json;

    fn dates(labels: &[&str]) -> DateIndex {
        DateIndex(labels.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn normalizes_a_full_day() {
        let blob = RawForecastBlob(testdata::payload(1));
        let forecast = normalize(&blob, &dates(&["2026/02/25"]), "Sartrouville").unwrap();

        assert_eq!(forecast.location, "Sartrouville");
        assert_eq!(forecast.units, Units::default());
        assert_eq!(forecast.forecast.len(), 1);

        let day = &forecast.forecast[0];
        assert_eq!(day.day, "d_1");
        assert_eq!(day.date.as_deref(), Some("2026/02/25"));
        assert_eq!(day.hourly.len(), 8);

        let times: Vec<_> = day.hourly.iter().map(|s| s.time.as_str()).collect();
        assert_eq!(times, TIME_SLOTS);

        let first = &day.hourly[0];
        assert_eq!(first.weather_code, -2);
        assert!(first.is_night);
        assert_eq!(first.weather_description, "partly cloudy");
        assert_eq!(first.wind_direction_deg, 90);
        assert_eq!(first.wind_direction, CompassPoint::East);
        assert_eq!(first.wind_gust_kmh, Some(20.0));
        assert_eq!(first.precipitation_probability_pct, Some(5.0));
    }

    #[test]
    fn night_flag_follows_code_sign() {
        let blob = RawForecastBlob(testdata::payload(2));
        let forecast = normalize(&blob, &dates(&[]), "x").unwrap();
        for (_, slot) in forecast.slots() {
            assert_eq!(slot.is_night, slot.weather_code < 0);
        }
    }

    #[test]
    fn bearing_of_360_wraps_to_north() {
        let blob = RawForecastBlob(testdata::payload(1));
        let forecast = normalize(&blob, &dates(&[]), "x").unwrap();
        let last = forecast.forecast[0].hourly.last().unwrap();
        assert_eq!(last.wind_direction_deg, 0);
        assert_eq!(last.wind_direction, CompassPoint::North);
    }

    #[test]
    fn short_date_index_leaves_dates_empty() {
        let blob = RawForecastBlob(testdata::payload(3));
        let forecast = normalize(&blob, &dates(&["2026/02/25"]), "x").unwrap();

        assert_eq!(forecast.forecast.len(), 3);
        assert_eq!(forecast.forecast[0].date.as_deref(), Some("2026/02/25"));
        assert!(forecast.forecast[1].date.is_none());
        assert!(forecast.forecast[2].date.is_none());
        assert!(forecast.forecast.iter().all(|d| d.hourly.len() == 8));
        assert_eq!(forecast.forecast[2].hourly[4].temperature_c, 10.5);
    }

    #[test]
    fn day_groups_sort_numerically() {
        let mut payload = testdata::payload(0);
        for n in [10, 2, 1] {
            payload[format!("d_{}", n)] = testdata::day_group(1, 0);
        }
        payload["d_x"] = json!({});
        let forecast = normalize(&RawForecastBlob(payload), &dates(&[]), "x").unwrap();
        let keys: Vec<_> = forecast.forecast.iter().map(|d| d.day.as_str()).collect();
        assert_eq!(keys, vec!["d_1", "d_2", "d_10"]);
    }

    #[test]
    fn unknown_codes_get_generic_description() {
        let mut payload = testdata::payload(1);
        payload["d_1"]["s"][0] = json!(-42);
        let forecast = normalize(&RawForecastBlob(payload), &dates(&[]), "x").unwrap();
        assert_eq!(forecast.forecast[0].hourly[0].weather_description, "unknown");
    }

    #[test]
    fn short_groups_pass_through() {
        let payload = json!({
            "d_1": {
                "s": [1, 2], "td": [1.0, 2.0], "sr": [0, 0], "rp": [0, null],
                "vsd": [5, 6], "vd45": [0, 180]
            }
        });
        let forecast = normalize(&RawForecastBlob(payload), &dates(&[]), "x").unwrap();
        let day = &forecast.forecast[0];
        assert_eq!(day.hourly.len(), 2);
        assert_eq!(day.hourly[1].time, "04:00");
        assert_eq!(day.hourly[1].precipitation_probability_pct, None);
        assert_eq!(day.hourly[1].wind_gust_kmh, None);
        assert_eq!(day.hourly[1].weather_description, "unknown");
    }

    #[test]
    fn probability_sentinel_becomes_none() {
        let blob = RawForecastBlob(testdata::payload(1));
        let forecast = normalize(&blob, &dates(&[]), "x").unwrap();
        assert_eq!(forecast.forecast[0].hourly[7].precipitation_probability_pct, None);
    }

    #[test]
    fn mismatched_arrays_are_count_mismatch() {
        let mut payload = testdata::payload(1);
        payload["d_1"]["td"] = json!([1.0, 2.0]);
        let err = normalize(&RawForecastBlob(payload), &dates(&[]), "x").unwrap_err();
        assert_eq!(
            err,
            NormalizationError::CountMismatch {
                day: "d_1".into(),
                field: "td".into(),
                expected: 8,
                found: 2,
            }
        );
    }

    #[test]
    fn too_many_slots_is_count_mismatch() {
        let mut payload = testdata::payload(1);
        payload["d_1"]["s"] = json!([1, 1, 1, 1, 1, 1, 1, 1, 1]);
        assert!(matches!(
            normalize(&RawForecastBlob(payload), &dates(&[]), "x"),
            Err(NormalizationError::CountMismatch { found: 9, .. })
        ));
    }

    #[test]
    fn invalid_values() {
        let mut payload = testdata::payload(1);
        payload["d_1"]["td"][3] = json!("warm");
        assert!(matches!(
            normalize(&RawForecastBlob(payload), &dates(&[]), "x"),
            Err(NormalizationError::InvalidField { ref field, .. }) if field == "td"
        ));

        let mut payload = testdata::payload(1);
        payload["d_1"]["vsd"][0] = json!(-3);
        assert!(matches!(
            normalize(&RawForecastBlob(payload), &dates(&[]), "x"),
            Err(NormalizationError::InvalidField { ref field, .. }) if field == "vsd"
        ));

        let mut payload = testdata::payload(1);
        payload["d_1"]["s"][0] = json!(1.5);
        assert!(matches!(
            normalize(&RawForecastBlob(payload), &dates(&[]), "x"),
            Err(NormalizationError::InvalidField { ref field, .. }) if field == "s"
        ));

        let mut payload = testdata::payload(1);
        payload.as_object_mut().unwrap().get_mut("d_1").unwrap().as_object_mut().unwrap().remove("vd45");
        assert!(matches!(
            normalize(&RawForecastBlob(payload), &dates(&[]), "x"),
            Err(NormalizationError::InvalidField { ref reason, .. }) if reason == "missing"
        ));

        assert!(normalize(&RawForecastBlob(json!([1, 2])), &dates(&[]), "x").is_err());
    }

    #[test]
    fn normalize_does_not_touch_inputs() {
        let blob = RawForecastBlob(testdata::payload(2));
        let index = dates(&["2026/02/25"]);
        let before = (blob.clone(), index.clone());
        let _ = normalize(&blob, &index, "x").unwrap();
        assert_eq!((blob, index), before);
    }
}
