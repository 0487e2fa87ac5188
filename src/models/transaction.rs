use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use super::operation::Operation;

// CSVヘッダー名 = ドキュメントのフィールド名
pub const USER_ID: &str = "User_ID";
pub const UTC_TIME: &str = "UTC_Time";
pub const OPERATION: &str = "Operation";
pub const MARKET: &str = "Market";
pub const AMOUNT: &str = "Buy/Sell Amount";
pub const PRICE: &str = "Price";

/// A typed cell. Cells that fail numeric coercion are kept as their raw
/// text instead of dropping the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field<T> {
    Value(T),
    Raw(String),
}

impl<T: Copy> Field<T> {
    pub fn value(&self) -> Option<T> {
        match self {
            Field::Value(v) => Some(*v),
            Field::Raw(_) => None,
        }
    }
}

/// One row of trading activity as stored in the `transactions` collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "User_ID", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Field<i64>>,
    #[serde(rename = "UTC_Time", default, skip_serializing_if = "Option::is_none")]
    pub utc_time: Option<String>,
    #[serde(rename = "Operation", default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    #[serde(rename = "Market", default, skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(rename = "Buy/Sell Amount", default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Field<f64>>,
    #[serde(rename = "Price", default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Field<f64>>,
}

impl Transaction {
    /// Contribution of this record to its market's net position.
    /// Missing or non-numeric amounts and non Buy/Sell operations count as zero.
    pub fn signed_amount(&self) -> f64 {
        let amount = self.amount.as_ref().and_then(Field::value).unwrap_or(0.0);
        let direction = self.operation.as_ref().map_or(0.0, Operation::direction);
        amount * direction
    }

    /// Whether the record falls at or before `cutoff`, compared as strings.
    pub fn is_at_or_before(&self, cutoff: &str) -> bool {
        self.utc_time.as_deref().is_some_and(|t| t <= cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    fn trade(op: &str, amount: Option<Field<f64>>) -> Transaction {
        Transaction {
            utc_time: Some("2022-01-01 10:00:00".to_string()),
            operation: Some(Operation::from(op.to_string())),
            market: Some("BTC/USDT".to_string()),
            amount,
            ..Default::default()
        }
    }

    #[test]
    fn signed_amount_follows_operation() {
        assert_eq!(trade("Buy", Some(Field::Value(2.5))).signed_amount(), 2.5);
        assert_eq!(trade("Sell", Some(Field::Value(2.5))).signed_amount(), -2.5);
        assert_eq!(trade("Transfer", Some(Field::Value(2.5))).signed_amount(), 0.0);
    }

    #[test]
    fn missing_or_raw_amount_is_zero() {
        assert_eq!(trade("Buy", None).signed_amount(), 0.0);
        assert_eq!(trade("Buy", Some(Field::Raw("n/a".to_string()))).signed_amount(), 0.0);
        let no_op = Transaction { operation: None, ..trade("Buy", Some(Field::Value(1.0))) };
        assert_eq!(no_op.signed_amount(), 0.0);
    }

    #[test]
    fn cutoff_is_inclusive_string_comparison() {
        let t = trade("Buy", None);
        assert!(t.is_at_or_before("2022-01-01 10:00:00"));
        assert!(t.is_at_or_before("2022-01-02"));
        assert!(!t.is_at_or_before("2022-01-01 09:59:59"));
        assert!(!Transaction::default().is_at_or_before("9999"));
    }

    #[test]
    fn document_uses_csv_field_names() {
        let doc = bson::to_document(&trade("Sell", Some(Field::Value(4.0)))).unwrap();
        assert_eq!(doc.get_str(OPERATION).unwrap(), "Sell");
        assert_eq!(doc.get_f64(AMOUNT).unwrap(), 4.0);
        assert_eq!(doc.get_str(MARKET).unwrap(), "BTC/USDT");
        assert!(!doc.contains_key("_id"));
        assert!(!doc.contains_key(PRICE));
    }

    #[test]
    fn raw_cell_survives_document_round_trip() {
        let mut t = trade("Buy", Some(Field::Raw("12,5".to_string())));
        t.user_id = Some(Field::Value(7));
        let doc = bson::to_document(&t).unwrap();
        assert_eq!(doc.get_str(AMOUNT).unwrap(), "12,5");
        let back: Transaction = bson::from_document(doc).unwrap();
        assert_eq!(back, t);
    }
}
