//! Bharat Guide CLI and HTTP API entry point.
//!
//! Binary name: `bharat`
//!
//! Loads `.env` and configuration, initializes tracing and the chat service,
//! then dispatches to a CLI command or starts the HTTP server.

mod cli;
mod http;
mod state;

use clap::Parser;

use bharat_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside development.
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    init_tracing(cli.otel, filter_for_verbosity(cli.verbose, cli.quiet))
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut loaded = bharat_infra::config::load(&cli.config).await?;

    if let Commands::Serve { port, host } = &cli.command {
        if let Some(port) = port {
            loaded.config.server.port = *port;
        }
        if let Some(host) = host {
            loaded.config.server.host = host.clone();
        }
    }

    let state = AppState::init(loaded)?;

    match cli.command {
        Commands::Serve { .. } => serve(state, cli.quiet).await?,

        Commands::Ask {
            message,
            role,
            session,
            model,
        } => {
            cli::ask::ask(&state, message, role, session, model, cli.json).await?;
        }

        Commands::ValidateKey => {
            cli::key::validate_key(&state, cli.json).await?;
        }
    }

    Ok(())
}

async fn serve(state: AppState, quiet: bool) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let sweeper = state.spawn_session_sweeper();

    if !quiet {
        println!(
            "  {} Bharat Guide API listening on {}",
            console::style("⚡").bold(),
            console::style(format!("http://{addr}")).cyan()
        );
        println!("  {}", console::style("Press Ctrl+C to stop").dim());
    }
    tracing::info!(%addr, model = %state.config.upstream.model, "Server started");

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    if !quiet {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
