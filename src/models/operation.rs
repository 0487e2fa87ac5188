use serde::{Deserialize, Serialize};

/// Trade direction. Stored as its plain string form; anything other than
/// `Buy`/`Sell` is kept verbatim so it survives a round trip through storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum Operation {
    Buy,
    Sell,
    Other(String),
}

impl Operation {
    pub fn as_str(&self) -> &str {
        match self {
            Operation::Buy => "Buy",
            Operation::Sell => "Sell",
            Operation::Other(raw) => raw,
        }
    }

    /// Sign applied to the amount when netting a market's position.
    pub fn direction(&self) -> f64 {
        match self {
            Operation::Buy => 1.0,
            Operation::Sell => -1.0,
            Operation::Other(_) => 0.0,
        }
    }
}

impl From<String> for Operation {
    fn from(raw: String) -> Self {
        // 大文字小文字は区別する (集計パイプラインと同じ比較)
        match raw.as_str() {
            "Buy" => Operation::Buy,
            "Sell" => Operation::Sell,
            _ => Operation::Other(raw),
        }
    }
}

impl From<Operation> for String {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_directions() {
        assert_eq!(Operation::from("Buy".to_string()), Operation::Buy);
        assert_eq!(Operation::from("Sell".to_string()), Operation::Sell);
        assert_eq!(Operation::Buy.direction(), 1.0);
        assert_eq!(Operation::Sell.direction(), -1.0);
    }

    #[test]
    fn unknown_operation_is_preserved() {
        let op = Operation::from("Transfer".to_string());
        assert_eq!(op, Operation::Other("Transfer".to_string()));
        assert_eq!(op.direction(), 0.0);
        assert_eq!(String::from(op), "Transfer");
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(Operation::from("buy".to_string()).direction(), 0.0);
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Operation::Sell).unwrap();
        assert_eq!(json, "\"Sell\"");
        let back: Operation = serde_json::from_str("\"Deposit\"").unwrap();
        assert_eq!(back, Operation::Other("Deposit".to_string()));
    }
}
