//! Category and keyword mapping handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use jangbu_core::models::CategoryMapping;
use jangbu_core::{KNOWN_CATEGORIES, UNCATEGORIZED};

use crate::{AppError, AppState, SuccessResponse};

#[derive(Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<&'static str>,
    pub uncategorized: &'static str,
}

/// The fixed category set the frontend can offer
pub async fn list_categories() -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: KNOWN_CATEGORIES.to_vec(),
        uncategorized: UNCATEGORIZED,
    })
}

pub async fn list_mappings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryMapping>>, AppError> {
    Ok(Json(state.db.list_mappings()?))
}

#[derive(Deserialize)]
pub struct CreateMappingRequest {
    pub keyword: String,
    pub category: String,
}

/// A mapping write reports how many existing rows it reclassified
#[derive(Serialize)]
pub struct MappingResponse {
    #[serde(flatten)]
    pub mapping: CategoryMapping,
    pub updated_transactions_count: i64,
}

pub async fn create_mapping(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMappingRequest>,
) -> Result<Json<MappingResponse>, AppError> {
    let (mapping, updated_transactions_count) =
        state.db.create_mapping(&req.keyword, &req.category)?;
    Ok(Json(MappingResponse {
        mapping,
        updated_transactions_count,
    }))
}

#[derive(Deserialize)]
pub struct UpdateMappingRequest {
    pub keyword: Option<String>,
    pub category: Option<String>,
}

pub async fn update_mapping(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMappingRequest>,
) -> Result<Json<MappingResponse>, AppError> {
    let (mapping, updated_transactions_count) =
        state
            .db
            .update_mapping(id, req.keyword.as_deref(), req.category.as_deref())?;
    Ok(Json(MappingResponse {
        mapping,
        updated_transactions_count,
    }))
}

pub async fn delete_mapping(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_mapping(id)?;
    Ok(Json(SuccessResponse { success: true }))
}
