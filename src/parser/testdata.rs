//! Page fixtures shaped like the site's markup.

use serde_json::{json, Map, Value};

/// One day-group; slot 0 gets `first_code` and `first_bearing`.
pub fn day_group(first_code: i64, first_bearing: i64) -> Value {
    json!({
        "s": [first_code, -1, 1, 2, 3, 2, -2, -1],
        "td": [4.5, 3.0, 2.5, 6.0, 10.5, 11.0, 8.0, 6.5],
        "sr": [0.0, 0.0, 0.2, 0.0, 0.0, 1.4, 0.0, 0.0],
        "rp": [5, 10, 30, 10, 5, 60, 20, -1],
        "vsd": [10, 12, 15, 18, 20, 22, 16, 11],
        "vg": [20, 24, 30, 35, 40, 44, 30, 22],
        "vd45": [first_bearing, 45, 90, 135, 180, 225, 270, 360],
        "vdId": ["E", "NE", "E", "SE", "S", "SW", "W", "N"]
    })
}

pub fn payload(days: usize) -> Value {
    let mut root = Map::new();
    root.insert(
        "units".into(),
        json!({"t": "°C", "ws": "mm", "s": "km/h"}),
    );
    root.insert(
        "sDesc".into(),
        json!({
            "1": "clear sky",
            "2": "partly cloudy",
            "3": "overcast",
            "6": "heavy rain"
        }),
    );
    for n in 1..=days {
        root.insert(format!("d_{}", n), day_group(-2, 90));
    }
    Value::Object(root)
}

pub fn escape_attribute(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('"', "&quot;")
}

fn date_selector(dates: &[&str]) -> String {
    let options: String = dates
        .iter()
        .enumerate()
        .map(|(i, d)| format!(r#"<option value="{}">{}</option>"#, i + 1, d))
        .collect();
    format!(r#"<select id="date_selector">{}</select>"#, options)
}

const NEXT_HOURS: &str = r#"
<div id="forecast_24"><table>
  <thead><tr><th>22:00</th><th>23:00</th><th>00:00 <span>tomorrow</span></th></tr></thead>
  <tbody><tr>
    <td><img src="a.png" alt="clear sky"><div class="temperature_line t_5">5 °C</div>
        <span>0.2 mm</span><span>30 %</span>
        <div class="wind_ico arrow_90">E</div><div>12 km/h</div></td>
    <td><img src="b.png" alt="overcast"><div class="temperature_line">-1 °C</div>
        <div class="wind_ico arrow_180">S</div><div>8 km/h</div></td>
    <td><div class="temperature_line">-2 °C</div></td>
  </tr></tbody>
</table></div>"#;

pub fn page(payload: &Value, dates: &[&str]) -> String {
    format!(
        r#"<!DOCTYPE html><html><head>
<title>Weather - Sartrouville - 14-Day Forecast &amp; Rain | Ventusky</title></head>
<body>
{}
<custom-forecast data-forecast="{}"></custom-forecast>
{}
</body></html>"#,
        date_selector(dates),
        escape_attribute(&payload.to_string()),
        NEXT_HOURS
    )
}

pub fn page_without_payload(dates: &[&str]) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>Weather - Sartrouville - Forecast</title></head>
<body>{}<div class="forecast"></div></body></html>"#,
        date_selector(dates)
    )
}
