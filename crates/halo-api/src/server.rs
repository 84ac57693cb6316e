//! HTTP server setup

use std::net::SocketAddr;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::routes::create_router;
use crate::AppState;

/// Pool, swap, farm, bridge and error routes, open to any browser origin
///
/// Every route accepts cross-origin calls from the dApp front end. Requests
/// are traced at the `tower_http` target.
pub fn create_app(state: AppState) -> Router {
    let browser_origins = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(browser_origins)
}

/// Serve on localhost at the configured `api_port`
pub async fn start_server(state: AppState) -> Result<(), std::io::Error> {
    let addr = SocketAddr::from(([127, 0, 0, 1], state.config().api_port));
    let chain_id = state.config().chain.chain_id;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %chain_id, "Halo API listening");
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::routes::test_support::disconnected_state;

    #[tokio::test]
    async fn test_cross_origin_request_allowed() {
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://app.halodao.example")
            .body(Body::empty())
            .unwrap();
        let response = create_app(disconnected_state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
