//! CSV upload to bulk insert.
//!
//! The header row names the fields. Every following line becomes one
//! [`Transaction`]; cells are coerced best-effort and a malformed line is
//! logged and skipped without aborting the upload. The decoded rows are
//! buffered per call and written with a single `insert_many`.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use tracing::{info, warn};

use crate::db::TransactionStore;
use crate::error::StoreResult;
use crate::models::operation::Operation;
use crate::models::transaction::{Field, Transaction, AMOUNT, MARKET, OPERATION, PRICE, USER_ID, UTC_TIME};

#[derive(Debug, Clone)]
pub struct Ingested {
    pub inserted_count: usize,
    pub records: Vec<Transaction>,
}

/// Header position of each known field. Unknown columns are ignored.
#[derive(Debug, Default)]
struct Columns {
    user_id: Option<usize>,
    utc_time: Option<usize>,
    operation: Option<usize>,
    market: Option<usize>,
    amount: Option<usize>,
    price: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut columns = Columns::default();
        for (index, name) in headers.iter().enumerate() {
            // 先頭のBOMを除去
            let slot = match name.trim_start_matches('\u{feff}').trim() {
                USER_ID => &mut columns.user_id,
                UTC_TIME => &mut columns.utc_time,
                OPERATION => &mut columns.operation,
                MARKET => &mut columns.market,
                AMOUNT => &mut columns.amount,
                PRICE => &mut columns.price,
                _ => continue,
            };
            slot.get_or_insert(index);
        }
        columns
    }

    fn to_transaction(&self, row: &StringRecord) -> Transaction {
        let cell = |column: Option<usize>| {
            column
                .and_then(|i| row.get(i))
                .filter(|raw| !raw.trim().is_empty())
        };

        Transaction {
            id: None,
            user_id: cell(self.user_id).map(coerce::<i64>),
            utc_time: cell(self.utc_time).map(str::to_string),
            operation: cell(self.operation).map(|raw| Operation::from(raw.to_string())),
            market: cell(self.market).map(str::to_string),
            amount: cell(self.amount).map(coerce_f64),
            price: cell(self.price).map(coerce_f64),
        }
    }
}

fn coerce<T: std::str::FromStr>(raw: &str) -> Field<T> {
    match raw.trim().parse::<T>() {
        Ok(value) => Field::Value(value),
        Err(_) => Field::Raw(raw.to_string()),
    }
}

/// `NaN`/`inf` parse as f64 but are not quantities; keep them as raw text.
fn coerce_f64(raw: &str) -> Field<f64> {
    match coerce::<f64>(raw) {
        Field::Value(value) if !value.is_finite() => Field::Raw(raw.to_string()),
        field => field,
    }
}

/// Decodes comma-delimited text with a header row into candidate records.
pub fn decode<R: Read>(input: R) -> Vec<Transaction> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .from_reader(input);

    let columns = match reader.headers() {
        Ok(headers) => Columns::from_headers(headers),
        Err(e) => {
            warn!("Error parsing CSV header: {}", e);
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for row in reader.records() {
        match row {
            Ok(row) => records.push(columns.to_transaction(&row)),
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                warn!("Error parsing CSV at line {}: {}", line, e);
            }
        }
    }
    records
}

/// Decodes `input` and writes every row with one bulk insert.
pub async fn ingest<S, R>(store: &S, input: R) -> StoreResult<Ingested>
where
    S: TransactionStore + ?Sized,
    R: Read,
{
    let rows = decode(input);
    info!("Decoded {} transactions", rows.len());

    if rows.is_empty() {
        return Ok(Ingested { inserted_count: 0, records: rows });
    }

    let records = store.insert_many(rows).await?;
    Ok(Ingested {
        inserted_count: records.len(),
        records,
    })
}
