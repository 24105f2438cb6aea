use crate::models::CompassPoint;

pub struct Theme;

impl Theme {
    pub const RULE_HEAVY: char = '═';
    pub const RULE_DAY: char = '=';
    pub const RULE_COLUMN: char = '-';
    pub const RULE_LIGHT: char = '─';
    pub const NIGHT_MARKER: char = '*';
    pub const UNKNOWN_ICON: &'static str = "?";

    pub const LINE_WIDTH: usize = 72;
    pub const SKY_WIDTH: usize = 26;

    pub fn icon(description: &str) -> &'static str {
        match description {
            "clear sky" => "☀",
            "clear sky with few clouds" | "high clouds" => "🌤",
            "partly cloudy" => "⛅",
            "mostly cloudy" => "🌥",
            "overcast" => "☁",
            "overcast with light rain" => "🌧",
            _ => Self::UNKNOWN_ICON,
        }
    }

    /// Emoji icons take two terminal columns.
    pub fn is_wide(icon: &str) -> bool {
        matches!(icon, "🌤" | "⛅" | "🌥" | "🌧")
    }

    /// Icon followed by the description, padded to a constant visual width.
    pub fn sky(description: &str) -> String {
        let icon = Self::icon(description);
        let width = if Self::is_wide(icon) {
            Self::SKY_WIDTH - 1
        } else {
            Self::SKY_WIDTH
        };
        format!("{} {:<width$}", icon, description, width = width)
    }

    /// Arrow pointing where the wind blows to.
    pub fn wind_arrow(direction: CompassPoint) -> &'static str {
        match direction {
            CompassPoint::North => "↓",
            CompassPoint::NorthEast => "↙",
            CompassPoint::East => "←",
            CompassPoint::SouthEast => "↖",
            CompassPoint::South => "↑",
            CompassPoint::SouthWest => "↗",
            CompassPoint::West => "→",
            CompassPoint::NorthWest => "↘",
        }
    }

    /// Same as [`Theme::wind_arrow`] for free-form labels; unknown labels pass through.
    pub fn wind_arrow_label(label: &str) -> String {
        CompassPoint::ALL
            .iter()
            .find(|p| p.as_str() == label)
            .map(|p| Self::wind_arrow(*p).to_string())
            .unwrap_or_else(|| label.to_string())
    }

    pub fn rule(c: char, width: usize) -> String {
        std::iter::repeat(c).take(width).collect()
    }
}
