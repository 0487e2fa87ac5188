pub mod operation;
pub mod transaction;

use std::collections::BTreeMap;

/// Net position per market, keyed by market name.
pub type Balances = BTreeMap<String, f64>;
