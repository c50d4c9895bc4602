//! The weather tools as an MCP [`ToolHandler`].

use mcp::host::ToolHandler;
use mcp::{CallToolResult, ServerInfo, Tool};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::format::{
    ALERTS_UNAVAILABLE, FORECAST_UNAVAILABLE, POINT_UNAVAILABLE, alerts_report, forecast_report,
};
use crate::nws::NwsClient;

/// Serves `get_alerts` and `get_forecast`.
///
/// Upstream failures come back as ordinary text so the caller's model can
/// relay them; only malformed calls are flagged as errors.
#[derive(Debug, Clone)]
pub struct WeatherService {
    nws: NwsClient,
}

impl WeatherService {
    pub fn new(nws: NwsClient) -> Self {
        Self { nws }
    }

    pub async fn get_alerts(&self, state: &str) -> String {
        match self.nws.alerts(state).await {
            Ok(alerts) => alerts_report(&alerts),
            Err(e) => {
                warn!(state, error = %e, "alert lookup failed");
                ALERTS_UNAVAILABLE.to_string()
            }
        }
    }

    pub async fn get_forecast(&self, latitude: f64, longitude: f64) -> String {
        let point = match self.nws.point(latitude, longitude).await {
            Ok(point) => point,
            Err(e) => {
                warn!(latitude, longitude, error = %e, "point lookup failed");
                return POINT_UNAVAILABLE.to_string();
            }
        };

        match self.nws.forecast(&point.properties.forecast).await {
            Ok(forecast) => forecast_report(&forecast),
            Err(e) => {
                warn!(url = %point.properties.forecast, error = %e, "forecast lookup failed");
                FORECAST_UNAVAILABLE.to_string()
            }
        }
    }
}

impl ToolHandler for WeatherService {
    fn info(&self) -> ServerInfo {
        ServerInfo {
            name: "weather".into(),
            version: Some(env!("CARGO_PKG_VERSION").into()),
        }
    }

    fn tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "get_alerts".into(),
                description: Some("Get weather alerts for a US state.".into()),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "state": {
                            "type": "string",
                            "description": "Two-letter US state code (e.g. CA, NY)",
                            "minLength": 2,
                            "maxLength": 2
                        }
                    },
                    "required": ["state"]
                }),
            },
            Tool {
                name: "get_forecast".into(),
                description: Some("Get weather forecast for a location.".into()),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "latitude": {"type": "number", "description": "Latitude of the location"},
                        "longitude": {"type": "number", "description": "Longitude of the location"}
                    },
                    "required": ["latitude", "longitude"]
                }),
            },
        ]
    }

    async fn call(&self, name: &str, arguments: Value) -> CallToolResult {
        info!(tool = name, "tool call");
        let text = match name {
            "get_alerts" => match state_arg(&arguments) {
                Ok(state) => self.get_alerts(&state).await,
                Err(e) => return CallToolResult::error(e.to_string()),
            },
            "get_forecast" => match coordinate_args(&arguments) {
                Ok((latitude, longitude)) => self.get_forecast(latitude, longitude).await,
                Err(e) => return CallToolResult::error(e.to_string()),
            },
            other => return CallToolResult::error(format!("unknown tool: {other}")),
        };
        CallToolResult::text(text)
    }
}

fn state_arg(arguments: &Value) -> Result<String> {
    let state = arguments
        .get("state")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidArguments("state must be a string".into()))?;
    if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::InvalidArguments(format!(
            "state must be a two-letter code, got {state:?}"
        )));
    }
    Ok(state.to_ascii_uppercase())
}

fn coordinate_args(arguments: &Value) -> Result<(f64, f64)> {
    let number = |key: &str| {
        arguments
            .get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| Error::InvalidArguments(format!("{key} must be a number")))
    };
    Ok((number("latitude")?, number("longitude")?))
}
