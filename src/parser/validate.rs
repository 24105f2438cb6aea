//! Non-fatal shape checks on a normalized forecast.

use super::extract::DateIndex;
use crate::models::{Forecast, EXPECTED_DAYS, TIME_SLOTS};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    DayCount { found: usize },
    SlotCount { day: String, found: usize },
    MissingDate { day: String },
    DatesOutOfOrder { day: String },
    UnusedDates { count: usize },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::DayCount { found } => {
                write!(f, "expected {} days, found {}", EXPECTED_DAYS, found)
            }
            ValidationWarning::SlotCount { day, found } => write!(
                f,
                "{}: expected {} slots, found {}",
                day,
                TIME_SLOTS.len(),
                found
            ),
            ValidationWarning::MissingDate { day } => write!(f, "{}: no date in selector", day),
            ValidationWarning::DatesOutOfOrder { day } => {
                write!(f, "{}: date is not after the previous day", day)
            }
            ValidationWarning::UnusedDates { count } => {
                write!(f, "{} selector date(s) without a day-group", count)
            }
        }
    }
}

pub fn validate(forecast: &Forecast) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if forecast.forecast.len() != EXPECTED_DAYS {
        warnings.push(ValidationWarning::DayCount {
            found: forecast.forecast.len(),
        });
    }

    let mut previous = None;
    for day in &forecast.forecast {
        if day.hourly.len() != TIME_SLOTS.len() {
            warnings.push(ValidationWarning::SlotCount {
                day: day.day.clone(),
                found: day.hourly.len(),
            });
        }
        match day.date_naive() {
            Some(date) => {
                if previous.is_some_and(|p| date <= p) {
                    warnings.push(ValidationWarning::DatesOutOfOrder {
                        day: day.day.clone(),
                    });
                }
                previous = Some(date);
            }
            None if day.date.is_none() => warnings.push(ValidationWarning::MissingDate {
                day: day.day.clone(),
            }),
            None => {}
        }
    }

    warnings
}

/// Dates left over once every day-group has taken one.
pub fn check_alignment(day_groups: usize, dates: &DateIndex) -> Option<ValidationWarning> {
    (dates.len() > day_groups).then(|| ValidationWarning::UnusedDates {
        count: dates.len() - day_groups,
    })
}
