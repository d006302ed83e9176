//! Bank transaction handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use jangbu_core::models::Transaction;
use jangbu_core::TransactionFilter;

use crate::{AppError, AppState, SuccessResponse, MAX_PAGE_LIMIT};

#[derive(Deserialize, Default)]
pub struct ListParams {
    pub account_type: Option<String>,
    pub year_month: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListParams {
    pub(crate) fn clamped_limit(&self) -> Option<i64> {
        self.limit.map(|l| l.clamp(1, MAX_PAGE_LIMIT))
    }
}

pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let filter = TransactionFilter {
        account_type: params.account_type.clone(),
        year_month: params.year_month.clone(),
        category: params.category.clone(),
        limit: params.clamped_limit(),
        offset: params.offset,
    };
    Ok(Json(state.db.list_transactions(&filter)?))
}

pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Transaction>, AppError> {
    Ok(Json(state.db.get_transaction(id)?))
}

/// Query parameters a PUT may carry. Absent parameters are untouched;
/// an empty value clears the field.
#[derive(Deserialize, Default)]
pub struct UpdateTransactionParams {
    pub category: Option<String>,
    pub memo: Option<String>,
}

/// `PUT /transactions/:id?category=<name>` — manual categorization
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<UpdateTransactionParams>,
) -> Result<Json<Transaction>, AppError> {
    if let Some(category) = &params.category {
        let value = Some(category.as_str()).filter(|c| !c.is_empty());
        state.db.update_transaction_category(id, value)?;
    }
    if let Some(memo) = &params.memo {
        let value = Some(memo.as_str()).filter(|m| !m.is_empty());
        state.db.update_transaction_memo(id, value)?;
    }
    Ok(Json(state.db.get_transaction(id)?))
}

/// `GET /transactions/year-months/list` — months with bank activity,
/// newest first
pub async fn bank_year_months(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.db.list_year_months(None)?))
}

pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_transaction(id)?;
    Ok(Json(SuccessResponse { success: true }))
}
