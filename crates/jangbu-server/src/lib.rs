//! Jangbu Web Server
//!
//! Axum-based REST API for the Jangbu household ledger:
//! - Statement uploads (bank CSV, card CSV) with idempotent dedup
//! - Transaction and card transaction CRUD
//! - Category mappings with retroactive classification
//! - Monthly / category / card / total-asset statistics

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use jangbu_core::db::Database;

mod handlers;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Shared application state
pub struct AppState {
    pub db: Database,
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(db: Database) -> Router {
    let state = Arc::new(AppState { db });

    Router::new()
        // Health
        .route("/health", get(handlers::health))
        // Bank transactions
        .route(
            "/transactions/upload",
            post(handlers::upload_bank_statement),
        )
        .route("/transactions/", get(handlers::list_transactions))
        .route(
            "/transactions/:id",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        .route(
            "/transactions/year-months/list",
            get(handlers::bank_year_months),
        )
        // Card transactions
        .route(
            "/card-transactions/upload",
            post(handlers::upload_card_statement),
        )
        .route(
            "/card-transactions/",
            get(handlers::list_card_transactions),
        )
        .route("/card-transactions/users", get(handlers::list_card_holders))
        .route(
            "/card-transactions/year-months",
            get(handlers::card_year_months),
        )
        .route(
            "/card-transactions/:id",
            get(handlers::get_card_transaction)
                .put(handlers::update_card_transaction)
                .delete(handlers::delete_card_transaction),
        )
        .route(
            "/card-transactions/statistics/by-user",
            get(handlers::card_statistics_by_user),
        )
        .route(
            "/card-transactions/statistics/monthly",
            get(handlers::card_statistics_monthly),
        )
        .route(
            "/card-transactions/statistics/by-category",
            get(handlers::card_statistics_by_category),
        )
        // Categories and keyword mappings
        .route("/categories/list", get(handlers::list_categories))
        .route(
            "/categories/",
            get(handlers::list_mappings).post(handlers::create_mapping),
        )
        .route(
            "/categories/:id",
            axum::routing::put(handlers::update_mapping).delete(handlers::delete_mapping),
        )
        // Statistics
        .route(
            "/statistics/monthly/:year_month",
            get(handlers::monthly_statistics),
        )
        .route(
            "/statistics/category/:year_month",
            get(handlers::category_statistics),
        )
        .route("/statistics/months", get(handlers::statistics_months))
        .route("/statistics/total-assets", get(handlers::total_assets))
        .route(
            "/statistics/total-assets/:year_month",
            get(handlers::total_assets_for_month),
        )
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(TraceLayer::new_for_http())
        // Single-user app on a home network; the frontend may be served
        // from a different port
        .layer(CorsLayer::permissive())
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(db);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
///
/// Serialized as `{"detail": "..."}`, which is what the frontend expects.
pub struct AppError {
    status: StatusCode,
    detail: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Generic message to the client, full error in the log
            detail: "An internal error occurred".to_string(),
            internal: Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "detail": self.detail
        }));

        (self.status, body).into_response()
    }
}

impl From<jangbu_core::Error> for AppError {
    fn from(err: jangbu_core::Error) -> Self {
        use jangbu_core::Error;
        match &err {
            Error::NotFound(msg) => Self::not_found(msg),
            Error::Validation(msg) | Error::MalformedRow(msg) => Self::bad_request(msg),
            _ => Self::internal(err.into()),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::bad_request(&format!("Invalid multipart request: {}", err))
    }
}

#[cfg(test)]
mod tests;
