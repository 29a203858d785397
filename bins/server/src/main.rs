//! Server binary entrypoint.

use anyhow::{Context, anyhow};
use clap::Parser;
use knowledge_search_config::{
    LogFormat, LoggingConfig, ValidatedSearchConfig, load_config_std_env, to_pretty_json,
};
use knowledge_search_infra::{SearchRuntime, infra_crate_version};
use knowledge_search_ports::{LogFields, error_payload};
use knowledge_search_server::{AppState, router};
use knowledge_search_shared::{ErrorEnvelope, RequestContext};
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "knowledge-search",
    version,
    about = "Multi-collection semantic search service",
    long_about = None
)]
struct Cli {
    /// Config file path (JSON/TOML).
    #[arg(long, env = "KS_CONFIG")]
    config: Option<PathBuf>,
    /// Partial config JSON applied over the file.
    #[arg(long)]
    overrides: Option<String>,
    /// Bind host (overrides `server.host`).
    #[arg(long)]
    host: Option<String>,
    /// Bind port (overrides `server.port`).
    #[arg(long)]
    port: Option<u16>,
    /// Create collections before serving, regardless of config.
    #[arg(long)]
    bootstrap: bool,
    /// Print the effective config as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;

    if cli.print_config {
        let output = to_pretty_json(config.as_ref())?;
        let mut stdout = std::io::stdout();
        stdout.write_all(output.as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }

    init_tracing(&config.as_ref().logging)?;
    let bootstrap = cli.bootstrap || config.as_ref().collections.bootstrap_on_start;
    let addr = format!(
        "{}:{}",
        config.as_ref().server.host,
        config.as_ref().server.port
    );

    let runtime = SearchRuntime::from_config(config)?;
    if bootstrap {
        let ctx = RequestContext::new_request();
        if let Err(error) = runtime.bootstrap(&ctx).await {
            let mut fields = LogFields::new();
            fields.insert("error".into(), error_payload(&error));
            runtime
                .logger()
                .warn("server.bootstrap.failed", "Collection bootstrap failed", Some(fields));
        }
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let mut fields = LogFields::new();
    fields.insert("address".into(), Value::from(addr.as_str()));
    fields.insert("version".into(), Value::from(infra_crate_version()));
    runtime
        .logger()
        .info("server.started", "Listening for requests", Some(fields));

    let app = router(AppState::new(runtime.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    runtime
        .logger()
        .info("server.stopped", "Server shut down", None);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ValidatedSearchConfig, ErrorEnvelope> {
    let config = load_config_std_env(cli.config.as_deref(), cli.overrides.as_deref())?;
    if cli.host.is_none() && cli.port.is_none() {
        return Ok(config);
    }
    let mut raw = config.into_inner();
    if let Some(host) = &cli.host {
        raw.server.host = host.as_str().into();
    }
    if let Some(port) = cli.port {
        raw.server.port = port;
    }
    raw.validate_and_normalize().map_err(ErrorEnvelope::from)
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&*logging.level))
        .context("invalid log filter")?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = match logging.format {
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
