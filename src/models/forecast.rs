use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Wall-clock labels of the three-hourly slots in each day-group.
pub const TIME_SLOTS: [&str; 8] = [
    "01:00", "04:00", "07:00", "10:00", "13:00", "16:00", "19:00", "22:00",
];

/// Number of day-groups a complete page carries.
pub const EXPECTED_DAYS: usize = 8;

const DATE_FORMATS: [&str; 2] = ["%Y/%m/%d", "%Y-%m-%d"];

/// Canonical forecast for one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub location: String,
    pub units: Units,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hourly_24h: Vec<NextHourSlot>,
    pub forecast: Vec<DayForecast>,
}

impl Forecast {
    /// All slots of all days, day-then-time order
    pub fn slots(&self) -> impl Iterator<Item = (&DayForecast, &HourlySlot)> {
        self.forecast
            .iter()
            .flat_map(|day| day.hourly.iter().map(move |slot| (day, slot)))
    }

    pub fn first_date(&self) -> Option<&str> {
        self.forecast.first().and_then(|d| d.date.as_deref())
    }

    pub fn last_date(&self) -> Option<&str> {
        self.forecast.last().and_then(|d| d.date.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Units {
    pub temperature: String,
    pub precipitation: String,
    pub wind_speed: String,
}

impl Default for Units {
    fn default() -> Self {
        Self {
            temperature: "°C".into(),
            precipitation: "mm".into(),
            wind_speed: "km/h".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub day: String,
    /// Null when the page's date selector had no entry for this day-group
    #[serde(deserialize_with = "Option::deserialize")]
    pub date: Option<String>,
    pub hourly: Vec<HourlySlot>,
}

impl DayForecast {
    pub fn date_naive(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_date)
    }

    pub fn temperature_range(&self) -> Option<(f64, f64)> {
        let mut temps = self.hourly.iter().map(|s| s.temperature_c);
        let first = temps.next()?;
        Some(temps.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }

    pub fn total_precipitation_mm(&self) -> f64 {
        self.hourly.iter().map(|s| s.precipitation_mm).sum()
    }

    pub fn max_precipitation_probability(&self) -> Option<f64> {
        self.hourly
            .iter()
            .filter_map(|s| s.precipitation_probability_pct)
            .max_by(|a, b| a.total_cmp(b))
    }

    pub fn slot_at(&self, time: &str) -> Option<&HourlySlot> {
        self.hourly.iter().find(|s| s.time == time)
    }
}

/// A single three-hourly forecast point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySlot {
    pub time: String,
    pub temperature_c: f64,
    pub weather_code: i32,
    pub weather_description: String,
    pub is_night: bool,
    pub precipitation_mm: f64,
    /// The page uses a negative sentinel when no probability is published
    #[serde(deserialize_with = "Option::deserialize")]
    pub precipitation_probability_pct: Option<f64>,
    pub wind_speed_kmh: f64,
    #[serde(deserialize_with = "Option::deserialize")]
    pub wind_gust_kmh: Option<f64>,
    pub wind_direction_deg: u16,
    pub wind_direction: CompassPoint,
}

impl HourlySlot {
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.time, "%H:%M").ok()
    }

    pub fn datetime_on(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        self.time_of_day().map(|t| date.and_time(t))
    }
}

/// Entry of the hour-by-hour table covering the next 24 hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextHourSlot {
    pub date: Option<String>,
    pub time: String,
    pub weather_description: String,
    pub temperature_c: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub precipitation_probability_pct: Option<f64>,
    pub wind_direction: Option<String>,
    pub wind_direction_deg: Option<u16>,
    pub wind_speed_kmh: Option<f64>,
}

/// Eight-point compass label for a wind bearing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassPoint {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "NE")]
    NorthEast,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "SE")]
    SouthEast,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "SW")]
    SouthWest,
    #[serde(rename = "W")]
    West,
    #[serde(rename = "NW")]
    NorthWest,
}

impl CompassPoint {
    pub const ALL: [CompassPoint; 8] = [
        CompassPoint::North,
        CompassPoint::NorthEast,
        CompassPoint::East,
        CompassPoint::SouthEast,
        CompassPoint::South,
        CompassPoint::SouthWest,
        CompassPoint::West,
        CompassPoint::NorthWest,
    ];

    /// 45° sectors centred on each label: `round(deg / 45) mod 8`, 0 = N.
    pub fn from_degrees(deg: f64) -> Self {
        let sector = ((deg / 45.0).round() as i64).rem_euclid(8) as usize;
        Self::ALL[sector]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompassPoint::North => "N",
            CompassPoint::NorthEast => "NE",
            CompassPoint::East => "E",
            CompassPoint::SouthEast => "SE",
            CompassPoint::South => "S",
            CompassPoint::SouthWest => "SW",
            CompassPoint::West => "W",
            CompassPoint::NorthWest => "NW",
        }
    }
}

impl std::fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a page date label (`2026/02/25`, or ISO as a fallback).
pub fn parse_date(label: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(label.trim(), fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(time: &str, temp: f64, rain: f64, prob: Option<f64>) -> HourlySlot {
        HourlySlot {
            time: time.into(),
            temperature_c: temp,
            weather_code: 1,
            weather_description: "clear sky".into(),
            is_night: false,
            precipitation_mm: rain,
            precipitation_probability_pct: prob,
            wind_speed_kmh: 10.0,
            wind_gust_kmh: None,
            wind_direction_deg: 0,
            wind_direction: CompassPoint::North,
        }
    }

    #[test]
    fn compass_cardinal_points() {
        assert_eq!(CompassPoint::from_degrees(0.0), CompassPoint::North);
        assert_eq!(CompassPoint::from_degrees(90.0), CompassPoint::East);
        assert_eq!(CompassPoint::from_degrees(180.0), CompassPoint::South);
        assert_eq!(CompassPoint::from_degrees(270.0), CompassPoint::West);
        assert_eq!(CompassPoint::from_degrees(315.0), CompassPoint::NorthWest);
    }

    #[test]
    fn compass_wraps_at_full_circle() {
        assert_eq!(CompassPoint::from_degrees(360.0), CompassPoint::North);
        assert_eq!(CompassPoint::from_degrees(359.0), CompassPoint::North);
        assert_eq!(CompassPoint::from_degrees(338.0), CompassPoint::North);
        assert_eq!(CompassPoint::from_degrees(337.0), CompassPoint::NorthWest);
    }

    #[test]
    fn compass_every_degree_has_a_label() {
        for deg in 0..360 {
            let point = CompassPoint::from_degrees(deg as f64);
            assert!(CompassPoint::ALL.contains(&point));
        }
    }

    #[test]
    fn compass_sector_boundaries_round_up() {
        assert_eq!(CompassPoint::from_degrees(22.4), CompassPoint::North);
        assert_eq!(CompassPoint::from_degrees(22.5), CompassPoint::NorthEast);
        assert_eq!(CompassPoint::from_degrees(67.5), CompassPoint::East);
    }

    #[test]
    fn compass_serializes_as_label() {
        let json = serde_json::to_string(&CompassPoint::SouthWest).unwrap();
        assert_eq!(json, "\"SW\"");
        let back: CompassPoint = serde_json::from_str("\"NE\"").unwrap();
        assert_eq!(back, CompassPoint::NorthEast);
    }

    #[test]
    fn day_aggregates() {
        let day = DayForecast {
            day: "d_1".into(),
            date: Some("2026/02/25".into()),
            hourly: vec![
                slot("01:00", 3.0, 0.0, Some(10.0)),
                slot("13:00", 11.5, 1.2, None),
                slot("22:00", 5.0, 0.3, Some(40.0)),
            ],
        };

        assert_eq!(day.temperature_range(), Some((3.0, 11.5)));
        assert!((day.total_precipitation_mm() - 1.5).abs() < 1e-9);
        assert_eq!(day.max_precipitation_probability(), Some(40.0));
        assert_eq!(day.slot_at("13:00").map(|s| s.temperature_c), Some(11.5));
        assert_eq!(
            day.date_naive(),
            NaiveDate::from_ymd_opt(2026, 2, 25)
        );
    }

    #[test]
    fn empty_day_has_no_range() {
        let day = DayForecast {
            day: "d_1".into(),
            date: None,
            hourly: Vec::new(),
        };
        assert!(day.temperature_range().is_none());
        assert!(day.date_naive().is_none());
    }

    #[test]
    fn parse_date_formats() {
        assert_eq!(parse_date("2026/02/25"), NaiveDate::from_ymd_opt(2026, 2, 25));
        assert_eq!(parse_date(" 2026-03-01 "), NaiveDate::from_ymd_opt(2026, 3, 1));
        assert!(parse_date("unknown").is_none());
    }
}
