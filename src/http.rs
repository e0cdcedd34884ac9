//! HTTP surface over the currency service.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use crate::core::{CurrencyError, Snapshot};
use crate::engine::CurrencyService;

pub const DEFAULT_CURRENCY: &str = "usd";
const UPSTREAM_UNAVAILABLE_MESSAGE: &str = "upstream unavailable";

impl IntoResponse for CurrencyError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unsupported(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::PrerequisiteMissing(_) => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            // Upstream details stay in the log.
            Self::UpstreamUnavailable(e) => {
                error!(error = %format!("{e:#}"), "Upstream failure on request path");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    UPSTREAM_UNAVAILABLE_MESSAGE.to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct CurrencyQuery {
    currency: Option<String>,
}

pub fn router(service: Arc<CurrencyService>) -> Router {
    Router::new()
        .route("/api/v1/currency", get(currency))
        .route("/health", get(health))
        .with_state(service)
}

async fn currency(
    State(service): State<Arc<CurrencyService>>,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<Snapshot>, CurrencyError> {
    let code = query
        .currency
        .filter(|c| !c.trim().is_empty())
        .map_or_else(|| DEFAULT_CURRENCY.to_string(), |c| c.trim().to_lowercase());

    service.get_currency_data(&code).await.map(Json)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
