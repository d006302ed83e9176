//! Card transaction handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use jangbu_core::models::CardTransaction;
use jangbu_core::CardTransactionFilter;

use super::double_option;
use crate::{AppError, AppState, SuccessResponse, MAX_PAGE_LIMIT};

#[derive(Deserialize, Default)]
pub struct ListParams {
    pub card_holder: Option<String>,
    pub year_month: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_card_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<CardTransaction>>, AppError> {
    let filter = CardTransactionFilter {
        card_holder: params.card_holder,
        year_month: params.year_month,
        category: params.category,
        limit: params.limit.map(|l| l.clamp(1, MAX_PAGE_LIMIT)),
        offset: params.offset,
    };
    Ok(Json(state.db.list_card_transactions(&filter)?))
}

/// `GET /card-transactions/users` — distinct card holders
pub async fn list_card_holders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.db.list_card_holders()?))
}

/// `GET /card-transactions/year-months` — months with card activity,
/// newest first
pub async fn card_year_months(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.db.list_card_year_months()?))
}

pub async fn get_card_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CardTransaction>, AppError> {
    Ok(Json(state.db.get_card_transaction(id)?))
}

#[derive(Deserialize, Default)]
pub struct UpdateCardTransactionRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub memo: Option<Option<String>>,
}

pub async fn update_card_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCardTransactionRequest>,
) -> Result<Json<CardTransaction>, AppError> {
    if let Some(category) = &req.category {
        state
            .db
            .update_card_transaction_category(id, category.as_deref())?;
    }
    if let Some(memo) = &req.memo {
        state.db.update_card_transaction_memo(id, memo.as_deref())?;
    }
    Ok(Json(state.db.get_card_transaction(id)?))
}

pub async fn delete_card_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_card_transaction(id)?;
    Ok(Json(SuccessResponse { success: true }))
}
