use std::net::SocketAddr;
use std::sync::Arc;

use sawari_api::{app, worker, AppState};
use sawari_core::location::MockLocationResolver;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sawari_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = sawari_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Sawari API on port {}", config.server.port);

    let store =
        sawari_store::StoreHandle::open(&config.storage.dir).expect("Failed to open store");

    tokio::spawn(worker::start_sweep_worker(
        store.clone(),
        config.business_rules.clone(),
    ));

    let app_state = AppState::new(
        store,
        config.business_rules.clone(),
        Arc::new(MockLocationResolver),
    );
    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
