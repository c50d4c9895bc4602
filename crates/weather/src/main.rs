use tracing_subscriber::EnvFilter;
use weather::{NwsClient, WeatherService};

#[tokio::main]
async fn main() {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let nws = match NwsClient::new() {
        Ok(nws) => nws,
        Err(e) => {
            tracing::error!(error = %e, "failed to build http client");
            std::process::exit(1);
        }
    };

    if let Err(e) = mcp::host::serve_stdio(&WeatherService::new(nws)).await {
        tracing::error!(error = %e, "weather service stopped");
        std::process::exit(1);
    }
}
