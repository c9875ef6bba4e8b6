#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use tslsuite::client::{OcspResponderClient, ServiceConfig, TslProviderClient};
use tslsuite::mock::{
    create_ocsp_responder_router, create_tsl_provider_router, serve, OcspResponderState,
    TslProviderState,
};

/// A router served on an ephemeral localhost port.
pub struct ServedRouter {
    pub url: String,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ServedRouter {
    pub async fn start(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (shutdown, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            serve(listener, router, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            url,
            shutdown,
            handle,
        }
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

/// Both mock services served on ephemeral localhost ports.
pub struct MockHarness {
    pub ocsp_state: Arc<OcspResponderState>,
    pub tsl_state: Arc<TslProviderState>,
    pub ocsp: ServedRouter,
    pub tsl: ServedRouter,
}

impl MockHarness {
    pub async fn start() -> Self {
        let ocsp_state = Arc::new(OcspResponderState::new());
        let tsl_state = Arc::new(TslProviderState::new());

        let ocsp = ServedRouter::start(create_ocsp_responder_router(Arc::clone(&ocsp_state))).await;
        let tsl = ServedRouter::start(create_tsl_provider_router(Arc::clone(&tsl_state))).await;

        Self {
            ocsp_state,
            tsl_state,
            ocsp,
            tsl,
        }
    }

    pub fn ocsp_client(&self) -> OcspResponderClient {
        OcspResponderClient::new(ServiceConfig::new(&self.ocsp.url, 5)).unwrap()
    }

    pub fn tsl_client(&self) -> TslProviderClient {
        TslProviderClient::new(ServiceConfig::new(&self.tsl.url, 5)).unwrap()
    }

    pub async fn stop(self) {
        self.ocsp.stop().await;
        self.tsl.stop().await;
    }
}
