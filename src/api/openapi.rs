//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the url-collector REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the url-collector REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "url-collector REST API",
        version = "0.1.0",
        description = "Collects one picture URL per day over a date range from NASA's Astronomy Picture of the Day",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        crate::api::routes::get_pictures,

        crate::api::routes::get_config,

        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::PicturesResponse,

        crate::config::Config,
        crate::config::ProviderConfig,
        crate::config::ProviderKind,
        crate::config::ApiConfig,

        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "pictures", description = "Picture URLs for a date range"),
        (name = "config", description = "Configuration - Inspect the running configuration"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec"),
    )
)]
pub struct ApiDoc;
