use super::forecast::{parse_date, CompassPoint, Forecast, HourlySlot};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Condition tokens understood by the home-automation weather entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Condition {
    #[serde(rename = "sunny")]
    Sunny,
    #[serde(rename = "clear-night")]
    ClearNight,
    #[serde(rename = "partlycloudy")]
    PartlyCloudy,
    #[serde(rename = "cloudy")]
    Cloudy,
    #[serde(rename = "fog")]
    Fog,
    #[serde(rename = "rainy")]
    Rainy,
    #[serde(rename = "pouring")]
    Pouring,
    #[serde(rename = "snowy")]
    Snowy,
    #[serde(rename = "snowy-rainy")]
    SnowyRainy,
    #[serde(rename = "lightning")]
    Lightning,
    #[serde(rename = "lightning-rainy")]
    LightningRainy,
    #[serde(rename = "hail")]
    Hail,
    #[default]
    #[serde(rename = "exceptional")]
    Exceptional,
}

impl Condition {
    /// Map a page description; anything unrecognised is `Exceptional`.
    pub fn from_description(description: &str) -> Self {
        match description.trim().to_lowercase().as_str() {
            "clear sky" => Condition::Sunny,
            "clear sky with few clouds" | "partly cloudy" | "high clouds" => {
                Condition::PartlyCloudy
            }
            "mostly cloudy" | "overcast" => Condition::Cloudy,
            "fog" | "freezing fog" => Condition::Fog,
            "light rain"
            | "rain"
            | "overcast with light rain"
            | "overcast with rain"
            | "light drizzle"
            | "drizzle"
            | "freezing drizzle" => Condition::Rainy,
            "heavy rain" | "overcast with heavy rain" => Condition::Pouring,
            "light snow" | "snow" | "heavy snow" => Condition::Snowy,
            "sleet" | "light sleet" => Condition::SnowyRainy,
            "thunderstorm" => Condition::Lightning,
            "thunderstorm with light rain"
            | "thunderstorm with rain"
            | "thunderstorm with heavy rain"
            | "thunderstorm with snow" => Condition::LightningRainy,
            "hail" => Condition::Hail,
            _ => Condition::Exceptional,
        }
    }

    /// Like [`Condition::from_description`], but a clear sky outside 07:00-20:00
    /// or on a night-coded slot becomes `ClearNight`.
    pub fn for_time(description: &str, is_night: bool, hour: u32) -> Self {
        match Self::from_description(description) {
            Condition::Sunny if is_night || !(7..20).contains(&hour) => Condition::ClearNight,
            other => other,
        }
    }

    pub fn for_slot(slot: &HourlySlot) -> Self {
        let hour = slot.time_of_day().map(|t| t.hour()).unwrap_or(12);
        Self::for_time(&slot.weather_description, slot.is_night, hour)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Sunny => "sunny",
            Condition::ClearNight => "clear-night",
            Condition::PartlyCloudy => "partlycloudy",
            Condition::Cloudy => "cloudy",
            Condition::Fog => "fog",
            Condition::Rainy => "rainy",
            Condition::Pouring => "pouring",
            Condition::Snowy => "snowy",
            Condition::SnowyRainy => "snowy-rainy",
            Condition::Lightning => "lightning",
            Condition::LightningRainy => "lightning-rainy",
            Condition::Hail => "hail",
            Condition::Exceptional => "exceptional",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Conditions at the slot nearest to a reference time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub observed_for: Option<NaiveDateTime>,
    pub temperature_c: f64,
    pub condition: Condition,
    pub weather_description: String,
    pub wind_speed_kmh: f64,
    pub wind_bearing_deg: u16,
    pub wind_direction: CompassPoint,
}

impl CurrentConditions {
    /// Nearest slot by absolute time difference across the first two days.
    ///
    /// Falls back to the very first slot when none of those days carries a
    /// usable date.
    pub fn select(forecast: &Forecast, now: NaiveDateTime) -> Option<Self> {
        let nearest = forecast
            .forecast
            .iter()
            .take(2)
            .filter_map(|day| day.date_naive().map(|date| (date, day)))
            .flat_map(|(date, day)| {
                day.hourly
                    .iter()
                    .filter_map(move |slot| slot.datetime_on(date).map(|dt| (dt, slot)))
            })
            .min_by_key(|(dt, _)| (*dt - now).num_seconds().abs());

        match nearest {
            Some((dt, slot)) => Some(Self::from_slot(slot, Some(dt))),
            None => forecast
                .forecast
                .first()
                .and_then(|day| day.hourly.first())
                .map(|slot| Self::from_slot(slot, None)),
        }
    }

    fn from_slot(slot: &HourlySlot, observed_for: Option<NaiveDateTime>) -> Self {
        Self {
            observed_for,
            temperature_c: slot.temperature_c,
            condition: Condition::for_slot(slot),
            weather_description: slot.weather_description.clone(),
            wind_speed_kmh: slot.wind_speed_kmh,
            wind_bearing_deg: slot.wind_direction_deg,
            wind_direction: slot.wind_direction,
        }
    }
}

/// One slot as exposed on the hourly forecast feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub datetime: Option<NaiveDateTime>,
    pub condition: Condition,
    #[serde(flatten)]
    pub slot: HourlySlot,
}

impl HourlyForecast {
    pub fn from_forecast(forecast: &Forecast) -> Vec<Self> {
        forecast
            .slots()
            .map(|(day, slot)| Self {
                datetime: day.date_naive().and_then(|d| slot.datetime_on(d)),
                condition: Condition::for_slot(slot),
                slot: slot.clone(),
            })
            .collect()
    }
}

/// Daily summary built around a representative midday slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub condition: Condition,
    pub temperature_high_c: f64,
    pub temperature_low_c: f64,
    pub precipitation_mm: Option<f64>,
    pub precipitation_probability_pct: Option<f64>,
    pub representative: HourlySlot,
}

impl DailyForecast {
    pub const REPRESENTATIVE_TIME: &'static str = "13:00";

    /// Days without a parseable date or without slots are skipped.
    pub fn from_forecast(forecast: &Forecast) -> Vec<Self> {
        forecast
            .forecast
            .iter()
            .filter_map(|day| {
                let date = day.date_naive()?;
                let (low, high) = day.temperature_range()?;
                let representative = day
                    .slot_at(Self::REPRESENTATIVE_TIME)
                    .or_else(|| day.hourly.first())?;
                let total = day.total_precipitation_mm();

                Some(Self {
                    date,
                    condition: Condition::for_time(
                        &representative.weather_description,
                        false,
                        13,
                    ),
                    temperature_high_c: high,
                    temperature_low_c: low,
                    precipitation_mm: (total > 0.0).then_some(total),
                    precipitation_probability_pct: day.max_precipitation_probability(),
                    representative: representative.clone(),
                })
            })
            .collect()
    }
}

/// Values behind the per-location sensor entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    pub temperature_c: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub wind_bearing_deg: Option<u16>,
    pub rain_today_mm: Option<f64>,
}

impl SensorReadings {
    /// Rain today sums the next-24h entries dated today; the day-groups
    /// start tomorrow. No next-24h table means no reading.
    pub fn from_forecast(forecast: &Forecast, now: NaiveDateTime) -> Self {
        let current = CurrentConditions::select(forecast, now);
        let today = now.date();
        let rain_today_mm = (!forecast.hourly_24h.is_empty()).then(|| {
            let total: f64 = forecast
                .hourly_24h
                .iter()
                .filter(|slot| slot.date.as_deref().and_then(parse_date) == Some(today))
                .map(|slot| slot.precipitation_mm.unwrap_or(0.0))
                .sum();
            (total * 100.0).round() / 100.0
        });

        Self {
            temperature_c: current.as_ref().map(|c| c.temperature_c),
            wind_speed_kmh: current.as_ref().map(|c| c.wind_speed_kmh),
            wind_bearing_deg: current.as_ref().map(|c| c.wind_bearing_deg),
            rain_today_mm,
        }
    }
}
