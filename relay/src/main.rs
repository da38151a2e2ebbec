#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;
mod export;

use anyhow::Context;
use args::{Args, Command, ServeArgs, TokenCommand};
use clap::Parser;
use relay_auth::{TokenSource, TokenStore};
use relay_config::Config;
use relay_server::Server;
use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load_or_default(args.config.as_deref())?;

    match args.command {
        None => serve(config, ServeArgs::default()).await,
        Some(Command::Serve(serve_args)) => serve(config, serve_args).await,
        Some(Command::Token(TokenCommand::Read)) => read_token(&config).await,
        Some(Command::Token(TokenCommand::Refresh)) => refresh_token(&config).await,
        Some(Command::Export { shell }) => export_env(&config, shell).await,
    }
}

async fn serve(mut config: Config, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(listen) = args.listen {
        config.server.listen_address = Some(listen);
    }

    relay_telemetry::init(&config.telemetry, args.log_filter.as_deref())?;

    tracing::info!(
        listen_address = %config.server.listen_address(),
        backend = %config.backend.base_url,
        "starting relay"
    );

    let server = Server::new(&config)?;

    // Set up graceful shutdown
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    server.serve(shutdown).await?;

    tracing::info!("relay stopped");
    Ok(())
}

async fn read_token(config: &Config) -> anyhow::Result<()> {
    let store = TokenStore::new(&config.auth)?;
    let token = store.token().await.context("failed to read token")?;

    println!("Token information:");
    println!("Access Token: {}", token.access_token.expose_secret());
    println!("Refresh Token: {}", token.refresh_token.expose_secret());
    if let Some(expires_at) = &token.expires_at {
        println!("Expires At: {expires_at}");
    }

    Ok(())
}

async fn refresh_token(config: &Config) -> anyhow::Result<()> {
    let store = TokenStore::new(&config.auth)?;
    let token = store.refresh().await.context("failed to refresh token")?;

    println!("Token refreshed successfully!");
    println!("New Access Token: {}", token.access_token.expose_secret());

    Ok(())
}

async fn export_env(config: &Config, shell: Option<args::Shell>) -> anyhow::Result<()> {
    let store = TokenStore::new(&config.auth)?;
    let token = store
        .token()
        .await
        .context("failed to read token, log in with the desktop client first")?;

    let base_url = export::base_url(config.server.listen_address());
    print!(
        "{}",
        export::render_for(shell, &base_url, token.access_token.expose_secret())
    );

    Ok(())
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
