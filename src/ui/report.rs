use super::Theme;
use crate::error::{Result, VentuskyError};
use crate::models::{DayForecast, Forecast, HourlySlot, NextHourSlot};
use crate::schema;
use serde_json::Value;
use std::fmt::Write;

/// Plain-text rendering of a canonical forecast document.
pub struct ForecastReport<'a> {
    forecast: &'a Forecast,
    day: Option<&'a str>,
    field: Option<&'a str>,
}

impl<'a> ForecastReport<'a> {
    pub fn new(forecast: &'a Forecast) -> Self {
        Self {
            forecast,
            day: None,
            field: None,
        }
    }

    /// Only show the day whose date label equals `day`
    pub fn with_day(mut self, day: Option<&'a str>) -> Self {
        self.day = day;
        self
    }

    /// One `time: value` line per day instead of full tables
    pub fn with_field(mut self, field: Option<&'a str>) -> Self {
        self.field = field;
        self
    }

    fn days(&self) -> Result<Vec<&'a DayForecast>> {
        let days: Vec<_> = match self.day {
            Some(date) => self
                .forecast
                .forecast
                .iter()
                .filter(|d| d.date.as_deref() == Some(date))
                .collect(),
            None => self.forecast.forecast.iter().collect(),
        };
        match self.day {
            Some(date) if days.is_empty() => Err(VentuskyError::NotFound(format!(
                "no data found for date '{}'",
                date
            ))),
            _ => Ok(days),
        }
    }

    pub fn render(&self) -> Result<String> {
        let days = self.days()?;
        let mut out = String::new();
        let units = &self.forecast.units;

        let _ = writeln!(out, "\nWeather forecast for {}", self.forecast.location);
        let _ = writeln!(
            out,
            "Units: temperature={}  precipitation={}  wind={}",
            units.temperature, units.precipitation, units.wind_speed
        );

        if self.day.is_none() {
            render_next_hours(&mut out, &self.forecast.hourly_24h);
        }
        let _ = writeln!(out, "\n{} = night slot", Theme::NIGHT_MARKER);

        for day in days {
            match self.field {
                Some(field) => render_field(&mut out, day, field)?,
                None => render_day(&mut out, day),
            }
        }
        Ok(out)
    }
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

fn rain(mm: Option<f64>) -> String {
    or_dash(mm.filter(|v| *v > 0.0).map(|v| format!("{} mm", v)))
}

fn probability(pct: Option<f64>) -> String {
    or_dash(pct.filter(|v| *v > 0.0).map(|v| format!("{}%", v)))
}

fn render_next_hours(out: &mut String, slots: &[NextHourSlot]) {
    if slots.is_empty() {
        return;
    }

    let heavy = Theme::rule(Theme::RULE_HEAVY, Theme::LINE_WIDTH);
    let _ = writeln!(out, "\n{}\n  Next 24 hours, hour by hour\n{}", heavy, heavy);

    let mut current: Option<Option<&str>> = None;
    for slot in slots {
        let date = slot.date.as_deref();
        if current != Some(date) {
            current = Some(date);
            let rule = |n| Theme::rule(Theme::RULE_LIGHT, n);
            let _ = writeln!(
                out,
                "\n  {} {} {}",
                rule(2),
                date.unwrap_or("unknown date"),
                rule(2)
            );
            let _ = writeln!(
                out,
                "  {:>5}  {:<28}  {:>6}  {:>8}  {:>5}  {:>12}",
                "Time", "Sky", "Temp", "Rain", "Prob", "Wind"
            );
            let _ = writeln!(
                out,
                "  {}  {}  {}  {}  {}  {}",
                rule(5),
                rule(28),
                rule(6),
                rule(8),
                rule(5),
                rule(12)
            );
        }

        let direction = slot.wind_direction.as_deref().unwrap_or("");
        let wind = format!(
            "{} {} {} km/h",
            Theme::wind_arrow_label(direction),
            direction,
            or_dash(slot.wind_speed_kmh.map(|v| v.to_string()))
        );
        let _ = writeln!(
            out,
            "  {:>5}  {}  {:>4} °C  {:>8}  {:>5}  {}",
            slot.time,
            Theme::sky(&slot.weather_description),
            or_dash(slot.temperature_c.map(|v| v.to_string())),
            rain(slot.precipitation_mm),
            probability(slot.precipitation_probability_pct),
            wind.trim()
        );
    }
}

fn slot_line(slot: &HourlySlot) -> String {
    let marker = if slot.is_night { Theme::NIGHT_MARKER } else { ' ' };
    let wind = format!(
        "{} {} {} km/h",
        Theme::wind_arrow(slot.wind_direction),
        slot.wind_direction,
        slot.wind_speed_kmh
    );
    format!(
        "  {:>6}{} {}  {:>4} °C  {:>8}  {:>5}  {}",
        slot.time,
        marker,
        Theme::sky(&slot.weather_description),
        slot.temperature_c,
        rain(Some(slot.precipitation_mm)),
        probability(slot.precipitation_probability_pct),
        wind
    )
}

fn render_day(out: &mut String, day: &DayForecast) {
    let rule = Theme::rule(Theme::RULE_DAY, Theme::LINE_WIDTH);
    let label = day.date.as_deref().unwrap_or(&day.day);
    let _ = writeln!(out, "\n{}\n  {}\n{}", rule, label, rule);

    let col = |n| Theme::rule(Theme::RULE_COLUMN, n);
    let _ = writeln!(
        out,
        "  {:>6}  {:<28}  {:>6}  {:>8}  {:>5}  {:>10}",
        "Time", "Sky", "Temp", "Rain", "Prob", "Wind"
    );
    let _ = writeln!(
        out,
        "  {}  {}  {}  {}  {}  {}",
        col(6),
        col(28),
        col(6),
        col(8),
        col(5),
        col(10)
    );

    for slot in &day.hourly {
        let _ = writeln!(out, "{}", slot_line(slot));
    }

    if let Some((low, high)) = day.temperature_range() {
        let _ = writeln!(
            out,
            "\n  Summary: {}–{} °C  |  Total rain: {:.1} mm",
            low,
            high,
            day.total_precipitation_mm()
        );
    }
}

fn render_field(out: &mut String, day: &DayForecast, field: &str) -> Result<()> {
    let values = schema::select_day_field(day, field)?;
    let joined: Vec<String> = values
        .iter()
        .map(|v| {
            let value = match &v.value {
                Value::String(s) => s.clone(),
                Value::Null => "-".to_string(),
                other => other.to_string(),
            };
            format!("{}: {}", v.time, value)
        })
        .collect();
    let _ = writeln!(
        out,
        "{}  |  {}",
        day.date.as_deref().unwrap_or(&day.day),
        joined.join("  ")
    );
    Ok(())
}
