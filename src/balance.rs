//! Per-market net position up to a cutoff time.
//!
//! The MongoDB store runs [`pipeline`] server side; the in-memory store
//! runs [`net_balances`]. Both select on `UTC_Time <= cutoff` as a plain
//! string comparison and net `Buy` against `Sell` per `Market`.

use mongodb::bson::{doc, Bson, Document};
use crate::error::{StoreError, StoreResult};
use crate::models::transaction::{Transaction, AMOUNT, MARKET, OPERATION, UTC_TIME};
use crate::models::Balances;

/// Five-stage aggregation producing at most one document shaped
/// `{ <market>: <net amount>, ... }`.
pub fn pipeline(cutoff: &str) -> Vec<Document> {
    let amount = format!("${}", AMOUNT);
    let operation = format!("${}", OPERATION);

    // 数値以外の数量は0として扱う
    let numeric_amount = doc! {
        "$cond": [{ "$isNumber": amount.as_str() }, amount.as_str(), 0]
    };

    vec![
        doc! { "$match": { UTC_TIME: { "$lte": cutoff } } },
        doc! {
            "$project": {
                "_id": 0,
                "market": { "$ifNull": [format!("${}", MARKET), ""] },
                "signed": {
                    "$switch": {
                        "branches": [
                            { "case": { "$eq": [operation.as_str(), "Buy"] }, "then": numeric_amount.clone() },
                            { "case": { "$eq": [operation.as_str(), "Sell"] }, "then": { "$multiply": [-1, numeric_amount] } },
                        ],
                        "default": 0
                    }
                }
            }
        },
        doc! { "$group": { "_id": "$market", "balance": { "$sum": "$signed" } } },
        doc! { "$group": { "_id": null, "balances": { "$push": { "k": "$_id", "v": "$balance" } } } },
        doc! { "$replaceRoot": { "newRoot": { "$arrayToObject": "$balances" } } },
    ]
}

/// Reads the single pipeline output document into a map.
pub fn balances_from_document(doc: Document) -> StoreResult<Balances> {
    let mut balances = Balances::new();
    for (market, value) in doc {
        let net = match value {
            Bson::Double(v) => v,
            Bson::Int32(v) => v as f64,
            Bson::Int64(v) => v as f64,
            other => {
                return Err(StoreError::MalformedResult(format!(
                    "market {} has non-numeric balance {}",
                    market, other
                )));
            }
        };
        balances.insert(market, net);
    }
    Ok(balances)
}

/// In-process equivalent of [`pipeline`].
pub fn net_balances<'a, I>(records: I, cutoff: &str) -> Balances
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut balances = Balances::new();
    for record in records.into_iter().filter(|r| r.is_at_or_before(cutoff)) {
        let market = record.market.clone().unwrap_or_default();
        *balances.entry(market).or_insert(0.0) += record.signed_amount();
    }
    balances
}
