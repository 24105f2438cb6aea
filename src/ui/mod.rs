pub mod report;
pub mod theme;

pub use report::ForecastReport;
pub use theme::Theme;
