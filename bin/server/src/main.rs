use clinical_intake_ai::{ProviderRoster, QueryEngine};
use clinical_intake_extraction::{FormBuilder, IntentLabelMap};
use clinical_intake_server::{AppState, ServerConfig, StartupError, router};
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(report) => {
            tracing::error!("{report}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Report<StartupError>> {
    let config = ServerConfig::load().map_err(|e| StartupError::Config {
        reason: e.to_string(),
    })?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        request_timeout_secs = config.request_timeout_secs,
        "Loaded configuration"
    );

    let roster = ProviderRoster::from_configs(&config.roster(), config.request_timeout())
        .map_err(|report| report.context(StartupError::Roster))?;
    for (position, provider) in roster.configs().iter().enumerate() {
        tracing::info!(position, %provider, "Provider registered");
    }

    let labels = match &config.intent_labels {
        Some(labels) => IntentLabelMap::from_config(labels)
            .map_err(|report| report.context(StartupError::Labels))?,
        None => IntentLabelMap::default(),
    };

    let engine = QueryEngine::new(Arc::new(roster));
    let state = Arc::new(AppState::new(FormBuilder::new(engine, Arc::new(labels))));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| StartupError::Bind {
            addr: config.bind_addr.clone(),
            reason: e.to_string(),
        })?;

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StartupError::Serve {
            reason: e.to_string(),
        })?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
