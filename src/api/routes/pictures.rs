//! Picture collection handler.

use crate::api::AppState;
use crate::error::{Error, Result};
use crate::types::{DATE_FORMAT, DateRange, PicturesResponse};
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// Query parameters for GET /pictures
///
/// Both bounds are optional at the extractor level so that a missing value is
/// reported with the same JSON error envelope as every other client error.
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PicturesQuery {
    /// First day of the range, `YYYY-MM-DD` (inclusive)
    pub from: Option<String>,
    /// Last day of the range, `YYYY-MM-DD` (inclusive)
    pub to: Option<String>,
}

/// GET /pictures - Picture URLs for every day in a date range
#[utoipa::path(
    get,
    path = "/pictures",
    tag = "pictures",
    params(PicturesQuery),
    responses(
        (status = 200, description = "One URL per day, in chronological order", body = PicturesResponse),
        (status = 400, description = "Missing, malformed or out-of-bounds dates", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
        (status = 502, description = "Picture provider failed", body = crate::error::ApiError),
        (status = 503, description = "Server is shutting down", body = crate::error::ApiError)
    )
)]
pub async fn get_pictures(
    State(state): State<AppState>,
    query: std::result::Result<Query<PicturesQuery>, QueryRejection>,
) -> Result<Json<PicturesResponse>> {
    let Query(query) =
        query.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;

    let from = parse_date_param("from", query.from.as_deref())?;
    let to = parse_date_param("to", query.to.as_deref())?;
    let range = DateRange::new(from, to)?;

    tracing::debug!(
        provider = state.provider.name(),
        from = %range.start(),
        to = %range.end(),
        days = range.len(),
        "Collecting pictures"
    );

    // Dropping this future on client disconnect abandons the resolution
    let cancel = state.shutdown.child_token();
    let urls = state.provider.get_pictures(range, &cancel).await?;

    Ok(Json(PicturesResponse { urls }))
}

/// Parse one date query parameter; absent and empty are the same thing
fn parse_date_param(name: &str, value: Option<&str>) -> Result<NaiveDate> {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => {
            return Err(Error::InvalidRequest(format!(
                "missing query parameter '{}'",
                name
            )));
        }
    };

    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| Error::InvalidRequest(format!("cannot parse parameter '{}'", name)))
}
