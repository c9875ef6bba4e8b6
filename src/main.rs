use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use tslsuite::config::SuiteConfig;
use tslsuite::mock::{
    create_ocsp_responder_router, create_tsl_provider_router, start_server, OcspResponderState,
    ServerConfig, TslProviderState,
};
use tslsuite::state::SequenceTracker;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tslsuite=info".parse()?))
        .init();

    tracing::info!("tslsuite starting...");

    let config = SuiteConfig::from_env();
    let tracker = SequenceTracker::load(&config.seq_nr_file)?;
    tracing::info!(
        path = %tracker.path().display(),
        current_in_sut = tracker.current_in_sut(),
        next_to_offer = tracker.next_to_offer(),
        "Loaded TSL sequence state"
    );

    let ocsp_config = ServerConfig::from_env(
        "TSLSUITE_MOCK_OCSP",
        ServerConfig::ocsp_responder_default(),
    );
    let tsl_config = ServerConfig::from_env(
        "TSLSUITE_MOCK_TSL",
        ServerConfig::tsl_provider_default(),
    );

    let ocsp_router = create_ocsp_responder_router(Arc::new(OcspResponderState::new()));
    let tsl_router = create_tsl_provider_router(Arc::new(TslProviderState::new()));

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    let ocsp_shutdown = wait_for(shutdown_tx.subscribe());
    let tsl_shutdown = wait_for(shutdown_tx.subscribe());

    tracing::info!(
        ocsp_port = ocsp_config.port,
        tsl_port = tsl_config.port,
        "Serving mock OCSP responder and mock TSL provider"
    );

    let ocsp_server = tokio::spawn(start_server(ocsp_config, ocsp_router, ocsp_shutdown));
    let tsl_server = tokio::spawn(start_server(tsl_config, tsl_router, tsl_shutdown));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    let _ = shutdown_tx.send(());

    ocsp_server.await??;
    tsl_server.await??;

    Ok(())
}

async fn wait_for(mut rx: tokio::sync::broadcast::Receiver<()>) {
    let _ = rx.recv().await;
}
