mod config;
mod error;

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use runtime::{
    AnthropicBackend, OrchestrationError, Orchestrator, ProcessConnector, Session, Transport,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

use config::Config;
use error::Result;

#[derive(Parser)]
#[command(name = "toolbridge")]
#[command(about = "Ask a language model questions it can answer with a local tool service", long_about = None)]
#[command(version)]
struct Cli {
    /// Tool service entry point (e.g. weather.py, build/index.js)
    identifier: String,

    /// Config file (defaults to ./toolbridge.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();
    init_tracing();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::discover(cli.config.as_deref())?;
    debug!(?config.limits, "configuration loaded");

    let auth = config.auth()?;
    info!(auth = %auth, model = %config.backend.model, "using anthropic backend");
    let mut builder = AnthropicBackend::builder(auth, &config.backend.model)
        .max_tokens(config.backend.max_tokens)
        .timeout(config.run_options().respond_timeout);
    if let Some(system) = &config.backend.system {
        builder = builder.system(system);
    }
    let orchestrator = Orchestrator::with_options(builder.build()?, config.run_options());

    let session = Session::connect(
        &cli.identifier,
        &config.launchers(),
        &ProcessConnector,
        config.timeouts(),
    )
    .await?;

    let registry = session.registry().await;
    println!(
        "Connected to {} with tools: {}",
        session.name(),
        registry.names().collect::<Vec<_>>().join(", ")
    );

    let outcome = chat_loop(&orchestrator, &session).await;
    session.close().await;
    outcome
}

async fn chat_loop<T: Transport>(
    orchestrator: &Orchestrator<AnthropicBackend>,
    session: &Session<T>,
) -> Result<()> {
    println!("Type your queries, or 'quit' to exit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\nQuery: ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            // EOF or Ctrl+C at the prompt
            break;
        };

        let query = line.trim();
        if query.eq_ignore_ascii_case("quit") || query.eq_ignore_ascii_case("exit") {
            break;
        }

        let cancel = CancellationToken::new();
        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });
        let outcome = orchestrator.run_query(session, query, &cancel).await;
        watcher.abort();

        match outcome {
            Ok(answer) => println!("\n{answer}"),
            Err(OrchestrationError::Cancelled) => println!("\nCancelled."),
            Err(e) => eprintln!("\nError: {e}"),
        }
    }

    println!("\nSession ended.");
    Ok(())
}
