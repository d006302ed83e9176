//! Statistics handlers
//!
//! Every endpoint computes on demand from the ledger tables.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use jangbu_core::models::{
    CardCategoryStatistics, CardHolderStatistics, CardMonthlyStatistics, CategoryStatistics,
    MonthlyStatistics, TotalAssets,
};

use crate::{AppError, AppState};

#[derive(Deserialize, Default)]
pub struct AccountParams {
    pub account_type: Option<String>,
}

/// `GET /statistics/monthly/:year_month?account_type=`
pub async fn monthly_statistics(
    State(state): State<Arc<AppState>>,
    Path(year_month): Path<String>,
    Query(params): Query<AccountParams>,
) -> Result<Json<MonthlyStatistics>, AppError> {
    validate_year_month(&year_month)?;
    Ok(Json(
        state
            .db
            .monthly_statistics(&year_month, params.account_type.as_deref())?,
    ))
}

/// `GET /statistics/category/:year_month?account_type=`
pub async fn category_statistics(
    State(state): State<Arc<AppState>>,
    Path(year_month): Path<String>,
    Query(params): Query<AccountParams>,
) -> Result<Json<Vec<CategoryStatistics>>, AppError> {
    validate_year_month(&year_month)?;
    Ok(Json(
        state
            .db
            .category_statistics(&year_month, params.account_type.as_deref())?,
    ))
}

/// `GET /statistics/months?account_type=` — months with bank activity,
/// newest first
pub async fn statistics_months(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AccountParams>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(
        state.db.list_year_months(params.account_type.as_deref())?,
    ))
}

/// `GET /statistics/total-assets?account_type=`
pub async fn total_assets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AccountParams>,
) -> Result<Json<TotalAssets>, AppError> {
    Ok(Json(
        state
            .db
            .total_assets(None, params.account_type.as_deref())?,
    ))
}

/// `GET /statistics/total-assets/:year_month?account_type=` — snapshot
/// as of that month's end
pub async fn total_assets_for_month(
    State(state): State<Arc<AppState>>,
    Path(year_month): Path<String>,
    Query(params): Query<AccountParams>,
) -> Result<Json<TotalAssets>, AppError> {
    validate_year_month(&year_month)?;
    Ok(Json(
        state
            .db
            .total_assets(Some(&year_month), params.account_type.as_deref())?,
    ))
}

#[derive(Deserialize, Default)]
pub struct MonthParams {
    pub year_month: Option<String>,
}

/// `GET /card-transactions/statistics/by-user?year_month=`
pub async fn card_statistics_by_user(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthParams>,
) -> Result<Json<Vec<CardHolderStatistics>>, AppError> {
    if let Some(year_month) = &params.year_month {
        validate_year_month(year_month)?;
    }
    Ok(Json(
        state
            .db
            .card_statistics_by_holder(params.year_month.as_deref())?,
    ))
}

#[derive(Deserialize, Default)]
pub struct HolderParams {
    pub card_holder: Option<String>,
}

/// `GET /card-transactions/statistics/monthly?card_holder=`
pub async fn card_statistics_monthly(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HolderParams>,
) -> Result<Json<Vec<CardMonthlyStatistics>>, AppError> {
    Ok(Json(
        state
            .db
            .card_statistics_monthly(params.card_holder.as_deref())?,
    ))
}

#[derive(Deserialize, Default)]
pub struct CardCategoryParams {
    pub year_month: Option<String>,
    pub card_holder: Option<String>,
}

/// `GET /card-transactions/statistics/by-category?year_month=&card_holder=`
pub async fn card_statistics_by_category(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CardCategoryParams>,
) -> Result<Json<Vec<CardCategoryStatistics>>, AppError> {
    if let Some(year_month) = &params.year_month {
        validate_year_month(year_month)?;
    }
    Ok(Json(state.db.card_statistics_by_category(
        params.year_month.as_deref(),
        params.card_holder.as_deref(),
    )?))
}

/// Reject anything that is not YYYY-MM before it reaches a query
fn validate_year_month(s: &str) -> Result<(), AppError> {
    let b = s.as_bytes();
    let valid = b.len() == 7
        && b[4] == b'-'
        && b[..4].iter().all(u8::is_ascii_digit)
        && matches!(s[5..].parse::<u8>(), Ok(1..=12));
    if valid {
        Ok(())
    } else {
        Err(AppError::bad_request(&format!(
            "Invalid year_month (expected YYYY-MM): {}",
            s
        )))
    }
}
