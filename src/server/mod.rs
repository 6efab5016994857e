mod caller;
mod handlers;

use std::net::SocketAddr;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};

use crate::api::DynAPI;
use crate::error::Error;
use crate::server::handlers::{health, rides};

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/health", get(health::check))
        .route("/rides", post(rides::create).get(rides::list_available))
        .route("/rides/:id", get(rides::find))
        .route("/rides/:id/accept", post(rides::accept))
        .route("/rides/:id/complete", post(rides::complete))
        .layer(Extension(api))
}

pub async fn serve(api: DynAPI, addr: SocketAddr) -> Result<(), Error> {
    let app = router(api);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "server error");
            Error::unexpected_error()
        })
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("could not listen for ctrl-c, running until killed");
        std::future::pending::<()>().await;
    }

    tracing::info!("shutting down");
}
