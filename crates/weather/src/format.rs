//! NWS payloads and their plain-text rendering.

use serde::Deserialize;

/// Separator between alerts and between forecast periods.
pub const SEPARATOR: &str = "\n---\n";

/// Periods included in a forecast report.
pub const MAX_PERIODS: usize = 5;

pub const NO_ALERTS: &str = "No active alerts for this state.";
pub const ALERTS_UNAVAILABLE: &str = "Unable to fetch alerts or no alerts found.";
pub const POINT_UNAVAILABLE: &str = "Unable to fetch forecast data for this location.";
pub const FORECAST_UNAVAILABLE: &str = "Unable to fetch detailed forecast.";

/// `GET /alerts/active/area/{state}`
///
/// `features` is required: a body without it is not an empty listing.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertCollection {
    pub features: Vec<AlertFeature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertFeature {
    #[serde(default)]
    pub properties: AlertProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertProperties {
    pub event: Option<String>,
    pub area_desc: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
}

/// `GET /points/{lat},{lon}`; only the forecast link is needed.
#[derive(Debug, Clone, Deserialize)]
pub struct Point {
    pub properties: PointProperties,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointProperties {
    pub forecast: String,
}

/// The document behind [`PointProperties::forecast`].
#[derive(Debug, Clone, Deserialize)]
pub struct Forecast {
    pub properties: ForecastProperties,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastProperties {
    pub periods: Vec<Period>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub name: String,
    pub temperature: f64,
    pub temperature_unit: String,
    pub wind_speed: String,
    pub wind_direction: String,
    pub detailed_forecast: String,
}

pub fn format_alert(alert: &AlertProperties) -> String {
    fn or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
        value.as_deref().unwrap_or(fallback)
    }

    format!(
        "Event: {}\nArea: {}\nSeverity: {}\nDescription: {}\nInstructions: {}",
        or(&alert.event, "Unknown"),
        or(&alert.area_desc, "Unknown"),
        or(&alert.severity, "Unknown"),
        or(&alert.description, "No description available"),
        or(&alert.instruction, "No specific instructions provided"),
    )
}

/// Render an alert listing. An empty listing gets its own message.
pub fn alerts_report(alerts: &AlertCollection) -> String {
    if alerts.features.is_empty() {
        return NO_ALERTS.to_string();
    }
    alerts
        .features
        .iter()
        .map(|feature| format_alert(&feature.properties))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

pub fn format_period(period: &Period) -> String {
    format!(
        "{}:\nTemperature: {}°{}\nWind: {} {}\nForecast: {}",
        period.name,
        period.temperature,
        period.temperature_unit,
        period.wind_speed,
        period.wind_direction,
        period.detailed_forecast,
    )
}

/// Render the first [`MAX_PERIODS`] periods of a forecast.
pub fn forecast_report(forecast: &Forecast) -> String {
    forecast
        .properties
        .periods
        .iter()
        .take(MAX_PERIODS)
        .map(format_period)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alerts(value: serde_json::Value) -> AlertCollection {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn zero_alerts_has_exact_message() {
        let report = alerts_report(&alerts(json!({"type": "FeatureCollection", "features": []})));
        assert_eq!(report, "No active alerts for this state.");
    }

    #[test]
    fn body_without_features_is_not_an_empty_listing() {
        let parsed = serde_json::from_value::<AlertCollection>(json!({"title": "unexpected"}));
        assert!(parsed.is_err());

        let parsed = serde_json::from_value::<Forecast>(json!({"properties": {}}));
        assert!(parsed.is_err());
    }

    #[test]
    fn alert_fields_and_fallbacks() {
        let collection = alerts(json!({
            "features": [
                {"properties": {
                    "event": "Flood Warning",
                    "areaDesc": "Sacramento",
                    "severity": "Severe",
                    "description": "River rising.",
                    "instruction": null
                }},
                {"properties": {}}
            ]
        }));

        let report = alerts_report(&collection);
        let parts: Vec<_> = report.split(SEPARATOR).collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            "Event: Flood Warning\nArea: Sacramento\nSeverity: Severe\n\
             Description: River rising.\nInstructions: No specific instructions provided"
        );
        assert!(parts[1].starts_with("Event: Unknown\nArea: Unknown\nSeverity: Unknown"));
        assert!(parts[1].contains("Description: No description available"));
    }

    fn period(n: usize) -> serde_json::Value {
        json!({
            "number": n,
            "name": format!("Period {n}"),
            "temperature": 60 + n,
            "temperatureUnit": "F",
            "windSpeed": "5 to 10 mph",
            "windDirection": "NW",
            "detailedForecast": "Sunny."
        })
    }

    #[test]
    fn forecast_period_layout() {
        let forecast: Forecast =
            serde_json::from_value(json!({"properties": {"periods": [period(1)]}})).unwrap();
        assert_eq!(
            forecast_report(&forecast),
            "Period 1:\nTemperature: 61°F\nWind: 5 to 10 mph NW\nForecast: Sunny."
        );
    }

    #[test]
    fn forecast_keeps_first_five_periods() {
        let periods: Vec<_> = (1..=14).map(period).collect();
        let forecast: Forecast =
            serde_json::from_value(json!({"properties": {"periods": periods}})).unwrap();

        let report = forecast_report(&forecast);
        assert_eq!(report.split(SEPARATOR).count(), MAX_PERIODS);
        assert!(report.contains("Period 5:"));
        assert!(!report.contains("Period 6:"));
    }

    #[test]
    fn point_exposes_forecast_link() {
        let point: Point = serde_json::from_value(json!({
            "properties": {
                "gridId": "MTR",
                "forecast": "https://api.weather.gov/gridpoints/MTR/85,105/forecast"
            }
        }))
        .unwrap();
        assert!(point.properties.forecast.ends_with("/forecast"));
    }
}
