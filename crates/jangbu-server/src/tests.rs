//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use jangbu_core::db::Database;
use tower::ServiceExt;

const BANK_CSV: &str = "\
거래 일시,적요,거래 유형,거래 기관,계좌번호,거래 금액,거래 후 잔액,메모
2024.01.05 09:00:00,급여,입금,신한은행,110-123-456789,\"3,000,000\",3100000,
2024.01.15 13:45:02,스타벅스 강남점,출금,신한은행,110-123-456789,-5500,3094500,
2024.01.20 18:00:00,김밥천국,출금,신한은행,110-123-456789,-4000,3090500,
";

const CARD_CSV: &str = "\
이용일자,가맹점,금액
2024.01.10,GS25 성수점,4500
2024.01.12,올리브영,23000
";

fn setup_test_app() -> (Router, Database) {
    let db = Database::in_memory().unwrap();
    (create_router(db.clone()), db)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Build a multipart/form-data body by hand (no client crate in tests)
fn multipart_body(boundary: &str, fields: &[(&str, &str, Option<&str>)]) -> Body {
    let mut body = String::new();
    for (name, value, filename) in fields {
        body.push_str(&format!("--{}\r\n", boundary));
        match filename {
            Some(filename) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: text/csv\r\n\r\n",
                name, filename
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                name
            )),
        }
        body.push_str(value);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", boundary));
    Body::from(body)
}

/// Percent-encode a query value (request URIs must be ASCII)
fn encode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

async fn upload_bank(app: &Router, csv: &str, account_type: &str) -> axum::response::Response {
    let boundary = "testboundary";
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!(
                    "/transactions/upload?account_type={}",
                    encode(account_type)
                ))
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(multipart_body(
                    boundary,
                    &[("file", csv, Some("statement.csv"))],
                ))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn upload_card(app: &Router, csv: &str, card_holder: &str) -> axum::response::Response {
    let boundary = "testboundary";
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/card-transactions/upload")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(multipart_body(
                    boundary,
                    &[
                        ("file", csv, Some("card.csv")),
                        ("card_holder", card_holder, None),
                    ],
                ))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn send(app: &Router, method: &str, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: serde_json::Value,
) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _db) = setup_test_app();

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_upload_bank_statement() {
    let (app, _db) = setup_test_app();

    let response = upload_bank(&app, BANK_CSV, "생활비").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_records"], 3);
    assert_eq!(json["new_records"], 3);
    assert_eq!(json["duplicate_records"], 0);
    assert_eq!(json["malformed_records"], 0);
    assert!(json["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_is_idempotent() {
    let (app, _db) = setup_test_app();

    upload_bank(&app, BANK_CSV, "생활비").await;
    let response = upload_bank(&app, BANK_CSV, "생활비").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["new_records"], 0);
    assert_eq!(json["duplicate_records"], 3);

    // Still exactly three rows
    let response = get(&app, "/transactions/").await;
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_upload_reports_malformed_rows() {
    let (app, _db) = setup_test_app();

    let csv = "\
거래 일시,적요,거래 유형,거래 기관,계좌번호,거래 금액,거래 후 잔액,메모
2024.01.15,스타벅스,출금,,,-5500,994500,
언제더라,커피,출금,,,-1000,993500,
";
    let response = upload_bank(&app, csv, "생활비").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_records"], 2);
    assert_eq!(json["new_records"], 1);
    assert_eq!(json["malformed_records"], 1);
    assert_eq!(json["errors"][0]["line"], 3);
}

#[tokio::test]
async fn test_upload_rejects_missing_account_type() {
    let (app, _db) = setup_test_app();

    let boundary = "testboundary";
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transactions/upload")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(multipart_body(
                    boundary,
                    &[("file", BANK_CSV, Some("statement.csv"))],
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["detail"].as_str().unwrap().contains("account_type"));
}

#[tokio::test]
async fn test_upload_classifies_with_existing_mappings() {
    let (app, _db) = setup_test_app();

    // Mapping exists before the upload, so rows classify at import time
    let response = send_json(
        &app,
        "POST",
        "/categories/",
        serde_json::json!({ "keyword": "스타벅스", "category": "식비" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    upload_bank(&app, BANK_CSV, "생활비").await;

    let response = get(&app, &format!("/transactions/?category={}", encode("식비"))).await;
    let json = get_body_json(response).await;
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["description"], "스타벅스 강남점");
    assert_eq!(rows[0]["category_source"], "auto");
}

#[tokio::test]
async fn test_mapping_creation_sweeps_retroactively() {
    let (app, _db) = setup_test_app();

    upload_bank(&app, BANK_CSV, "생활비").await;
    upload_card(&app, CARD_CSV, "철수").await;

    let response = send_json(
        &app,
        "POST",
        "/categories/",
        serde_json::json!({ "keyword": "GS25", "category": "식비" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["keyword"], "GS25");
    assert_eq!(json["updated_transactions_count"], 1);
}

#[tokio::test]
async fn test_mapping_rejects_reserved_category() {
    let (app, _db) = setup_test_app();

    let response = send_json(
        &app,
        "POST",
        "/categories/",
        serde_json::json!({ "keyword": "스타벅스", "category": "미분류" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert!(json["detail"].as_str().is_some());
}

#[tokio::test]
async fn test_transaction_update_and_manual_precedence() {
    let (app, _db) = setup_test_app();

    upload_bank(&app, BANK_CSV, "생활비").await;

    let response = get(&app, "/transactions/?year_month=2024-01").await;
    let json = get_body_json(response).await;
    let id = json.as_array().unwrap()[0]["id"].as_i64().unwrap();

    // Manual categorization goes through query parameters
    let response = send(
        &app,
        "PUT",
        &format!(
            "/transactions/{}?category={}&memo={}",
            id,
            encode("사회생활비"),
            encode("동료 커피")
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "사회생활비");
    assert_eq!(json["category_source"], "manual");
    assert_eq!(json["memo"], "동료 커피");

    // A later mapping must not override the manual assignment
    send_json(
        &app,
        "POST",
        "/categories/",
        serde_json::json!({ "keyword": "김밥천국", "category": "식비" }),
    )
    .await;
    let response = get(&app, &format!("/transactions/{}", id)).await;
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "사회생활비");
}

#[tokio::test]
async fn test_transaction_not_found() {
    let (app, _db) = setup_test_app();

    let response = get(&app, "/transactions/9999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = get_body_json(response).await;
    assert!(json["detail"].as_str().unwrap().contains("9999"));
}

#[tokio::test]
async fn test_delete_transaction() {
    let (app, _db) = setup_test_app();

    upload_bank(&app, BANK_CSV, "생활비").await;
    let response = get(&app, "/transactions/").await;
    let json = get_body_json(response).await;
    let id = json.as_array().unwrap()[0]["id"].as_i64().unwrap();

    let response = send(&app, "DELETE", &format!("/transactions/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, &format!("/transactions/{}", id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_monthly_statistics_endpoint() {
    let (app, _db) = setup_test_app();

    upload_bank(&app, BANK_CSV, "생활비").await;

    let response = get(
        &app,
        &format!("/statistics/monthly/2024-01?account_type={}", encode("생활비")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["year_month"], "2024-01");
    assert_eq!(json["total_income"], 3_000_000.0);
    assert_eq!(json["total_expense"], 9500.0);
    assert_eq!(json["net_change"], 2_990_500.0);
    assert_eq!(json["end_balance"], 3_090_500.0);
    assert_eq!(json["transaction_count"], 3);
}

#[tokio::test]
async fn test_category_statistics_endpoint() {
    let (app, _db) = setup_test_app();

    upload_bank(&app, BANK_CSV, "생활비").await;
    send_json(
        &app,
        "POST",
        "/categories/",
        serde_json::json!({ "keyword": "스타벅스", "category": "식비" }),
    )
    .await;

    let response = get(&app, "/statistics/category/2024-01").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let buckets = json.as_array().unwrap();
    assert_eq!(buckets.len(), 2);
    // Percentages cover the whole expense side
    let total: f64 = buckets
        .iter()
        .map(|b| b["percentage"].as_f64().unwrap())
        .sum();
    assert!((total - 100.0).abs() < 0.2);

    // The month segment is validated
    let response = get(&app, "/statistics/category/2024-13").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_total_assets_endpoint() {
    let (app, _db) = setup_test_app();

    upload_bank(&app, BANK_CSV, "생활비").await;

    let response = get(&app, "/statistics/total-assets").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["account_count"], 1);
    assert_eq!(json["total_assets"], 3_090_500.0);
    assert_eq!(json["accounts"][0]["account_type"], "생활비");

    // Same snapshot when the cutoff month covers all rows
    let response = get(&app, "/statistics/total-assets/2024-01").await;
    let json = get_body_json(response).await;
    assert_eq!(json["year_month"], "2024-01");
    assert_eq!(json["total_assets"], 3_090_500.0);
}

#[tokio::test]
async fn test_card_upload_and_statistics() {
    let (app, _db) = setup_test_app();

    let response = upload_card(&app, CARD_CSV, "철수").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["new_records"], 2);

    // Amounts are stored expense-signed
    let response = get(
        &app,
        &format!("/card-transactions/?card_holder={}", encode("철수")),
    )
    .await;
    let json = get_body_json(response).await;
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["amount"].as_f64().unwrap() < 0.0));

    let response = get(&app, "/card-transactions/statistics/by-user").await;
    let json = get_body_json(response).await;
    assert_eq!(json[0]["card_holder"], "철수");
    assert_eq!(json[0]["total_amount"], 27_500.0);
    assert_eq!(json[0]["percentage"], 100.0);

    let response = get(
        &app,
        &format!(
            "/card-transactions/statistics/monthly?card_holder={}",
            encode("철수")
        ),
    )
    .await;
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["year_month"], "2024-01");

    let response = get(&app, "/card-transactions/users").await;
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);

    let response = get(&app, "/card-transactions/year-months").await;
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap(), &vec![serde_json::json!("2024-01")]);
}

#[tokio::test]
async fn test_card_transaction_update_with_json_body() {
    let (app, _db) = setup_test_app();

    upload_card(&app, CARD_CSV, "철수").await;
    let response = get(&app, "/card-transactions/").await;
    let json = get_body_json(response).await;
    let id = json.as_array().unwrap()[0]["id"].as_i64().unwrap();

    let response = send_json(
        &app,
        "PUT",
        &format!("/card-transactions/{}", id),
        serde_json::json!({ "category": "미용비", "memo": "선물" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "미용비");
    assert_eq!(json["category_source"], "manual");
    assert_eq!(json["memo"], "선물");

    // Explicit null clears the category
    let response = send_json(
        &app,
        "PUT",
        &format!("/card-transactions/{}", id),
        serde_json::json!({ "category": null }),
    )
    .await;
    let json = get_body_json(response).await;
    assert!(json["category"].is_null());
    // Memo untouched when absent from the body
    assert_eq!(json["memo"], "선물");
}

#[tokio::test]
async fn test_categories_endpoint() {
    let (app, _db) = setup_test_app();

    let response = get(&app, "/categories/list").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let categories = json["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 8);
    assert_eq!(json["uncategorized"], "미분류");
}

#[tokio::test]
async fn test_statistics_months_endpoint() {
    let (app, _db) = setup_test_app();

    upload_bank(&app, BANK_CSV, "생활비").await;

    let response = get(&app, "/statistics/months").await;
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap(), &vec![serde_json::json!("2024-01")]);

    let response = get(&app, "/transactions/year-months/list").await;
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap(), &vec![serde_json::json!("2024-01")]);
}
