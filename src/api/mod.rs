//! REST API server module
//!
//! Serves the picture collection endpoint plus a few system routes, with an
//! OpenAPI document generated by utoipa.

use crate::error::{Error, Result};
use axum::{Router, http::HeaderValue, routing::get};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// - `GET /pictures?from=YYYY-MM-DD&to=YYYY-MM-DD` - Picture URLs, one per day
/// - `GET /config` - Current config (API key redacted)
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
///
/// Every other path, and every other method on these paths, answers 404 with
/// the JSON error envelope.
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        .route(
            "/pictures",
            get(routes::get_pictures).fallback(routes::not_found),
        )
        .route("/config", get(routes::get_config).fallback(routes::not_found))
        .route("/health", get(routes::health_check).fallback(routes::not_found))
        .route(
            "/openapi.json",
            get(routes::openapi_spec).fallback(routes::not_found),
        );

    // Swagger UI gets its own copy of the document; /openapi.json is already taken
    let router = if config.server.swagger_ui {
        router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
    } else {
        router
    };

    let router = router
        .fallback(routes::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.server.cors_enabled {
        let cors = build_cors_layer(&config.server.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` anywhere in the list (or an empty list) allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Serve the API on an already bound listener until `state.shutdown` fires.
///
/// Cancelling the shutdown token also cancels every in-flight resolution, so
/// open requests answer 503 quickly. Connections still open after
/// `server.shutdown_timeout` are dropped.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let shutdown = state.shutdown.clone();
    let grace = state.config.server.shutdown_timeout;
    let app = create_router(state);

    let mut server = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
        }
    });

    tokio::select! {
        result = &mut server => return server_outcome(result),
        _ = shutdown.cancelled() => {}
    }

    tracing::info!(
        timeout_secs = grace.as_secs(),
        "Shutting down API server, waiting for open requests"
    );

    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => server_outcome(result),
        Err(_) => {
            tracing::warn!(
                timeout_secs = grace.as_secs(),
                "Graceful shutdown timed out, dropping remaining connections"
            );
            server.abort();
            Ok(())
        }
    }
}

fn server_outcome(
    result: std::result::Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<()> {
    match result {
        Ok(Ok(())) => {
            tracing::info!("API server stopped");
            Ok(())
        }
        Ok(Err(e)) => Err(Error::ApiServerError(e.to_string())),
        Err(e) => Err(Error::ApiServerError(format!("server task failed: {}", e))),
    }
}

/// Start the API server on the configured bind address.
///
/// Binds `config.server.bind_address` and serves until the state's shutdown
/// token is cancelled.
///
/// # Example
///
/// ```no_run
/// use url_collector::{Config, api::{AppState, start_api_server}, provider};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::from_env()?;
/// let provider = provider::build(&config.provider)?;
/// let state = AppState::new(provider, Arc::new(config));
///
/// // Serves until state.shutdown is cancelled
/// start_api_server(state).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(state: AppState) -> Result<()> {
    let bind_address = state.config.server.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let listener = TcpListener::bind(bind_address).await.map_err(Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().map_err(Error::Io)?,
        provider = state.provider.name(),
        "API server listening"
    );

    serve(listener, state).await
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
