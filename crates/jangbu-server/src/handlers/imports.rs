//! Statement upload handlers
//!
//! Uploads are idempotent: re-posting the same file inserts nothing new
//! and reports every row as a duplicate.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use jangbu_core::models::PaymentType;
use jangbu_core::{parse_bank_csv, parse_card_csv, Classifier, InsertOutcome, RowError};

use crate::{AppError, AppState};

/// Summary returned after an upload.
///
/// Malformed rows never fail the batch; they are counted and listed so
/// the user can fix the file.
#[derive(Serialize)]
pub struct UploadResponse {
    pub total_records: usize,
    pub new_records: usize,
    pub duplicate_records: usize,
    pub malformed_records: usize,
    pub errors: Vec<RowError>,
}

#[derive(Deserialize, Default)]
pub struct BankUploadParams {
    pub account_type: Option<String>,
}

/// Upload a bank statement CSV
///
/// `POST /transactions/upload?account_type=<name>` with a multipart
/// `file` field.
pub async fn upload_bank_statement(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BankUploadParams>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let account_type = params
        .account_type
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing 'account_type' query parameter"))?;

    let mut file: Option<Vec<u8>> = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            file = Some(field.bytes().await?.to_vec());
        }
    }
    let file = file.ok_or_else(|| AppError::bad_request("Missing 'file' field"))?;

    let parsed = parse_bank_csv(file.as_slice(), &account_type)?;

    // One mapping snapshot classifies the whole file
    let mappings = state.db.list_mappings()?;
    let classifier = Classifier::new(&mappings);

    let mut new_records = 0;
    let mut duplicate_records = 0;
    for mut tx in parsed.rows {
        tx.category = classifier.classify(&tx.description).map(|c| c.to_string());
        match state.db.insert_transaction(&tx)? {
            InsertOutcome::Inserted(_) => new_records += 1,
            InsertOutcome::Duplicate => duplicate_records += 1,
        }
    }

    info!(
        account_type,
        new_records,
        duplicate_records,
        malformed = parsed.errors.len(),
        "Bank statement uploaded"
    );

    Ok(Json(UploadResponse {
        total_records: new_records + duplicate_records + parsed.errors.len(),
        new_records,
        duplicate_records,
        malformed_records: parsed.errors.len(),
        errors: parsed.errors,
    }))
}

/// Upload a card statement CSV
///
/// `POST /card-transactions/upload` with multipart fields `file`,
/// `card_holder`, and optionally `payment_type` ("일시불" or "할부",
/// defaults to 일시불).
pub async fn upload_card_statement(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file: Option<Vec<u8>> = None;
    let mut card_holder: Option<String> = None;
    let mut payment_type = PaymentType::LumpSum;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => file = Some(field.bytes().await?.to_vec()),
            "card_holder" => card_holder = Some(field.text().await?),
            "payment_type" => {
                let text = field.text().await?;
                payment_type =
                    PaymentType::from_str(&text).map_err(|e| AppError::bad_request(&e))?;
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::bad_request("Missing 'file' field"))?;
    let card_holder = card_holder
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing 'card_holder' field"))?;

    let parsed = parse_card_csv(file.as_slice(), &card_holder, payment_type)?;

    let mappings = state.db.list_mappings()?;
    let classifier = Classifier::new(&mappings);

    let mut new_records = 0;
    let mut duplicate_records = 0;
    for mut tx in parsed.rows {
        tx.category = classifier.classify(&tx.description).map(|c| c.to_string());
        match state.db.insert_card_transaction(&tx)? {
            InsertOutcome::Inserted(_) => new_records += 1,
            InsertOutcome::Duplicate => duplicate_records += 1,
        }
    }

    info!(
        card_holder,
        payment_type = %payment_type,
        new_records,
        duplicate_records,
        malformed = parsed.errors.len(),
        "Card statement uploaded"
    );

    Ok(Json(UploadResponse {
        total_records: new_records + duplicate_records + parsed.errors.len(),
        new_records,
        duplicate_records,
        malformed_records: parsed.errors.len(),
        errors: parsed.errors,
    }))
}
