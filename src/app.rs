use std::net::SocketAddr;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::StorageConfig;
use crate::images::services::ImageFolder;
use crate::state::AppState;
use crate::{admin, appointments, auth, feedback, properties};

const BANNER: &str = "Sarvavyapi real-estate API";

pub fn build_app(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(|| async { BANNER }))
        .route("/health", get(|| async { "ok" }))
        .nest("/api/auth", auth::router())
        .nest("/api/property", properties::router())
        .nest("/api/appointment", appointments::router())
        .nest("/api/feedback", feedback::router())
        .nest("/api/admin", admin::router());

    if let StorageConfig::Local { root, .. } = &state.config.storage {
        for folder in [ImageFolder::Property, ImageFolder::Profile] {
            app = app.nest_service(
                &format!("/{}", folder.as_str()),
                ServeDir::new(root.join(folder.as_str())),
            );
        }
    }

    let body_limit = state.config.max_upload_bytes;
    app.with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
