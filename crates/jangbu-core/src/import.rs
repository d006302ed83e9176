//! CSV import parsers for bank and card statements
//!
//! Both parsers are row-tolerant: a malformed row is reported with its
//! line number and skipped, while the rest of the file imports. Only a
//! missing required header fails the whole file.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::str::FromStr;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{NewCardTransaction, NewTransaction, PaymentType};

// Bank statement headers
const COL_DATE: &str = "거래 일시";
const COL_DESCRIPTION: &str = "적요";
const COL_TYPE: &str = "거래 유형";
const COL_INSTITUTION: &str = "거래 기관";
const COL_ACCOUNT_NUMBER: &str = "계좌번호";
const COL_AMOUNT: &str = "거래 금액";
const COL_BALANCE: &str = "거래 후 잔액";
const COL_MEMO: &str = "메모";

// Card statement headers
const COL_CARD_DATE: &str = "이용일자";
const COL_CARD_MERCHANT: &str = "가맹점";
const COL_CARD_AMOUNT: &str = "이용금액";
const COL_CARD_AMOUNT_SHORT: &str = "금액";
const COL_CARD_PAYMENT: &str = "구분";

/// A row that could not be parsed, with enough context to fix the file
#[derive(Debug, Clone, serde::Serialize)]
pub struct RowError {
    /// 1-based line number in the uploaded file (header is line 1)
    pub line: usize,
    pub reason: String,
}

/// Result of parsing one statement file
pub struct ParsedImport<T> {
    pub rows: Vec<T>,
    pub errors: Vec<RowError>,
}

/// Column positions resolved from a header row by name.
///
/// Statement exports reorder columns between app versions, so positions
/// are never hardcoded.
struct HeaderIndex {
    positions: Vec<(String, usize)>,
}

impl HeaderIndex {
    fn new(headers: &StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Self { positions }
    }

    fn get(&self, name: &str) -> Option<usize> {
        self.positions
            .iter()
            .find(|(h, _)| h == name)
            .map(|(_, i)| *i)
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.get(name)
            .ok_or_else(|| Error::MalformedRow(format!("Missing required column: {}", name)))
    }
}

fn field<'r>(record: &'r StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or("").trim()
}

fn optional_field(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.map(|i| field(record, i))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Generate the deduplication hash for a bank row.
///
/// Balance participates so that two same-day, same-amount transfers at
/// the same counterparty still count as distinct rows.
pub fn bank_dedup_hash(
    account_type: &str,
    date: &NaiveDate,
    description: &str,
    amount: f64,
    balance: f64,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(account_type.as_bytes());
    hasher.update(date.to_string().as_bytes());
    hasher.update(description.as_bytes());
    hasher.update(amount.to_be_bytes());
    hasher.update(balance.to_be_bytes());
    hex::encode(hasher.finalize())
}

/// Generate the deduplication hash for a card row.
///
/// Card statements carry no running balance, so the key is holder +
/// date + merchant + amount.
pub fn card_dedup_hash(
    card_holder: &str,
    date: &NaiveDate,
    description: &str,
    amount: f64,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(card_holder.as_bytes());
    hasher.update(date.to_string().as_bytes());
    hasher.update(description.as_bytes());
    hasher.update(amount.to_be_bytes());
    hex::encode(hasher.finalize())
}

/// YYYY-MM bucket for a date
pub fn year_month(date: &NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Parse a bank statement CSV into new transactions for one account.
///
/// Categories are left as None; the caller classifies after parsing so
/// one mapping snapshot covers the whole file.
pub fn parse_bank_csv<R: Read>(reader: R, account_type: &str) -> Result<ParsedImport<NewTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let index = HeaderIndex::new(rdr.headers()?);
    let date_col = index.require(COL_DATE)?;
    let description_col = index.require(COL_DESCRIPTION)?;
    let amount_col = index.require(COL_AMOUNT)?;
    let balance_col = index.require(COL_BALANCE)?;
    let type_col = index.get(COL_TYPE);
    let institution_col = index.get(COL_INSTITUTION);
    let account_number_col = index.get(COL_ACCOUNT_NUMBER);
    let memo_col = index.get(COL_MEMO);

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let line = i + 2; // header occupies line 1
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                errors.push(RowError {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match parse_bank_record(
            &record,
            account_type,
            date_col,
            description_col,
            amount_col,
            balance_col,
            type_col,
            institution_col,
            account_number_col,
            memo_col,
        ) {
            Ok(tx) => rows.push(tx),
            Err(e) => errors.push(RowError {
                line,
                reason: e.to_string(),
            }),
        }
    }

    debug!(
        account_type,
        parsed = rows.len(),
        skipped = errors.len(),
        "Parsed bank statement"
    );
    Ok(ParsedImport { rows, errors })
}

#[allow(clippy::too_many_arguments)]
fn parse_bank_record(
    record: &StringRecord,
    account_type: &str,
    date_col: usize,
    description_col: usize,
    amount_col: usize,
    balance_col: usize,
    type_col: Option<usize>,
    institution_col: Option<usize>,
    account_number_col: Option<usize>,
    memo_col: Option<usize>,
) -> Result<NewTransaction> {
    let date = parse_date(field(record, date_col))?;

    let description = field(record, description_col).to_string();
    if description.is_empty() {
        return Err(Error::MalformedRow("Empty description".into()));
    }

    let amount = parse_amount(field(record, amount_col))?;
    let balance = parse_amount(field(record, balance_col))?;

    let transaction_type = optional_field(record, type_col).unwrap_or_default();
    let dedup_hash = bank_dedup_hash(account_type, &date, &description, amount, balance);

    Ok(NewTransaction {
        account_type: account_type.to_string(),
        transaction_date: date,
        description,
        transaction_type,
        institution: optional_field(record, institution_col),
        account_number: optional_field(record, account_number_col),
        amount,
        balance,
        category: None,
        memo: optional_field(record, memo_col),
        year_month: year_month(&date),
        dedup_hash,
    })
}

/// Parse a card statement CSV for one card holder.
///
/// Card rows are purchases, so amounts are stored negated: a statement
/// value of 15000 becomes -15000.0 in the ledger.
pub fn parse_card_csv<R: Read>(
    reader: R,
    card_holder: &str,
    payment_type: PaymentType,
) -> Result<ParsedImport<NewCardTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let index = HeaderIndex::new(rdr.headers()?);
    let date_col = index.require(COL_CARD_DATE)?;
    let merchant_col = index.require(COL_CARD_MERCHANT)?;
    // Card apps export the amount under either name
    let amount_col = index
        .get(COL_CARD_AMOUNT)
        .or_else(|| index.get(COL_CARD_AMOUNT_SHORT))
        .ok_or_else(|| {
            Error::MalformedRow(format!("Missing required column: {}", COL_CARD_AMOUNT))
        })?;
    let payment_col = index.get(COL_CARD_PAYMENT);

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                errors.push(RowError {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let parsed = (|| -> Result<NewCardTransaction> {
            let date = parse_date(field(&record, date_col))?;

            let description = field(&record, merchant_col).to_string();
            if description.is_empty() {
                return Err(Error::MalformedRow("Empty merchant".into()));
            }

            // Statement lists charges as positive won; the ledger is
            // expense-signed.
            let amount = -parse_amount(field(&record, amount_col))?;
            let dedup_hash = card_dedup_hash(card_holder, &date, &description, amount);

            // A 구분 column overrides the upload-level payment type
            let row_payment = optional_field(&record, payment_col)
                .and_then(|s| PaymentType::from_str(&s).ok())
                .unwrap_or(payment_type);

            Ok(NewCardTransaction {
                card_holder: card_holder.to_string(),
                payment_type: row_payment,
                transaction_date: date,
                description,
                amount,
                category: None,
                memo: None,
                year_month: year_month(&date),
                dedup_hash,
            })
        })();

        match parsed {
            Ok(tx) => rows.push(tx),
            Err(e) => errors.push(RowError {
                line,
                reason: e.to_string(),
            }),
        }
    }

    debug!(
        card_holder,
        payment_type = %payment_type,
        parsed = rows.len(),
        skipped = errors.len(),
        "Parsed card statement"
    );
    Ok(ParsedImport { rows, errors })
}

/// Parse a date string in the formats Korean statement exports use
fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    // Datetime forms first: the time-of-day is dropped, only the date
    // identifies the row.
    let datetime_formats = [
        "%Y.%m.%d %H:%M:%S", // 2024.01.15 13:45:02
        "%Y-%m-%d %H:%M:%S", // 2024-01-15 13:45:02
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    let formats = [
        "%Y.%m.%d", // 2024.01.15
        "%Y-%m-%d", // 2024-01-15
        "%Y/%m/%d", // 2024/01/15
        "%Y%m%d",   // 20240115
    ];
    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::MalformedRow(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling thousands separators and the won sign
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s.trim().replace([',', '₩', ' '], "");

    if cleaned.is_empty() {
        return Err(Error::MalformedRow("Empty amount".into()));
    }

    cleaned
        .parse::<f64>()
        .map_err(|_| Error::MalformedRow(format!("Unable to parse amount: {}", s)))
}
