//! Accounts and transactions
//!
//! Accounts are free-text labels with no cryptographic identity; a
//! transaction's validity is only decided in the context of a ledger state.

use crate::error::Result;
use crate::utils::current_timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque string identifier for a balance holder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(String);

impl Account {
    pub fn new(value: impl Into<String>) -> Account {
        Account(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Account {
    fn from(value: &str) -> Self {
        Account(value.to_string())
    }
}

/// A single balance transfer. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: Account,
    pub to: Account,
    pub value: u64,
    #[serde(default)]
    pub data: String,
    pub time: u64,
}

impl Transaction {
    pub fn new(from: Account, to: Account, value: u64, data: String) -> Result<Transaction> {
        Ok(Transaction {
            from,
            to,
            value,
            data,
            time: current_timestamp()?,
        })
    }

    /// Construct with an explicit timestamp, for replaying known data.
    pub fn with_time(
        from: Account,
        to: Account,
        value: u64,
        data: String,
        time: u64,
    ) -> Transaction {
        Transaction {
            from,
            to,
            value,
            data,
            time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_json_shape() {
        let tx = Transaction::with_time(
            Account::from("andrej"),
            Account::from("babayaga"),
            1,
            String::new(),
            1579451695,
        );

        let json = serde_json::to_string(&tx).unwrap();
        assert_eq!(
            json,
            r#"{"from":"andrej","to":"babayaga","value":1,"data":"","time":1579451695}"#
        );
    }

    #[test]
    fn test_missing_data_field_defaults_to_empty() {
        let tx: Transaction =
            serde_json::from_str(r#"{"from":"a","to":"b","value":5,"time":7}"#).unwrap();
        assert_eq!(tx.data, "");
        assert_eq!(tx.value, 5);
    }

    #[test]
    fn test_account_is_transparent_in_json() {
        let account = Account::from("alice");
        assert_eq!(serde_json::to_string(&account).unwrap(), "\"alice\"");
    }
}
