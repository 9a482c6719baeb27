//! Local fake call / fake chat server

use gotta_go::api;
use gotta_go::config::AppConfig;
use gotta_go::context::AppContext;

use axum::http::{HeaderValue, Method};
use log::info;
use tokio::runtime::{Builder, Runtime};
use tower_http::cors::{Any, CorsLayer};

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        let config = AppConfig::from_env();
        let (context, scheduler_handle) = AppContext::build(config).await?;

        let app = api::router(context.clone()).layer(
            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                .allow_origin([
                    HeaderValue::from_static("http://localhost:3000"),
                    HeaderValue::from_static("http://localhost:5173"),
                ]),
        );

        let listener = tokio::net::TcpListener::bind(&context.config.bind_address).await?;
        info!("listening on {}", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Shutting down...");
        // Pending fake events stay stored and are re-armed on the next start.
        scheduler_handle.abort();
        Ok::<(), anyhow::Error>(())
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("cannot listen for ctrl-c: {e}");
    }
}
