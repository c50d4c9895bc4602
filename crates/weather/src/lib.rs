//! A weather tool service backed by the National Weather Service API.
//!
//! Exposes two tools over MCP stdio:
//!
//! - `get_alerts(state)`: active alerts for a US state.
//! - `get_forecast(latitude, longitude)`: the next few forecast periods.
//!
//! Run the `weather` binary directly, or point the toolbridge CLI at it.

mod error;
pub mod format;
mod nws;
mod service;

pub use error::{Error, Result};
pub use nws::{NWS_API_BASE, NwsClient, REQUEST_TIMEOUT, USER_AGENT};
pub use service::WeatherService;
