// src/server.rs

//! HTTP surface: `/metrics` drives one full scheduler run per scrape.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State as AxumState;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tracing::{debug, error, info};

use crate::dag::Controller;
use crate::render::render;
use crate::tasks::{FetchContext, build_task_set};

pub async fn serve(listen_addr: &str, ctx: Arc<FetchContext>) -> Result<()> {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(ctx);

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("binding {listen_addr}"))?;

    info!(addr = %listen_addr, "fetchdag listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")
}

async fn metrics_handler(AxumState(ctx): AxumState<Arc<FetchContext>>) -> Response {
    let controller = Controller::new(build_task_set());

    let (state, outcomes) = match controller.run(ctx).await {
        Ok(run) => run,
        Err(err) => {
            error!(%err, "scrape run failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}")).into_response();
        }
    };

    debug!(
        entries = state.len(),
        queries = outcomes.len(),
        "rendering scrape"
    );

    match render(&state, &outcomes) {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(%err, "rendering metrics failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}")).into_response()
        }
    }
}

async fn healthz_handler() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(%e, "failed to listen for Ctrl+C");
    }
}
