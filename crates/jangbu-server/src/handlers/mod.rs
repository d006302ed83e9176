//! HTTP request handlers, organized by domain

use axum::Json;

mod card_transactions;
mod categories;
mod imports;
mod statistics;
mod transactions;

pub use card_transactions::{
    card_year_months, delete_card_transaction, get_card_transaction, list_card_holders,
    list_card_transactions, update_card_transaction,
};
pub use categories::{
    create_mapping, delete_mapping, list_categories, list_mappings, update_mapping,
};
pub use imports::{upload_bank_statement, upload_card_statement};
pub use statistics::{
    card_statistics_by_category, card_statistics_by_user, card_statistics_monthly,
    category_statistics, monthly_statistics, statistics_months, total_assets,
    total_assets_for_month,
};
pub use transactions::{
    bank_year_months, delete_transaction, get_transaction, list_transactions, update_transaction,
};

/// Health check
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Deserialize a field that distinguishes "absent" from "explicit null".
///
/// Outer None = field not in the request body, Some(None) = sent as null
/// (clear the value), Some(Some(v)) = set to v.
pub(crate) fn double_option<'de, T, D>(
    deserializer: D,
) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
