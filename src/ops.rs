//! Operation records for the CSV replay harness.

use crate::money::Money;
use serde::Deserialize;
use std::str::FromStr;

/// Raw operation row as read from CSV.
///
/// Uses string-based parsing for flexibility; the trailing columns are
/// optional and only meaningful for some operations.
#[derive(Debug, Deserialize)]
pub struct OpRecord {
    /// Operation: add-client, update-client, delete-client, payment
    pub op: String,

    /// Caller-chosen client label, mapped to the generated id at
    /// add-client time
    pub client: String,

    /// Client name (add-client / update-client)
    pub name: Option<String>,

    /// Client phone (add-client / update-client)
    pub phone: Option<String>,

    /// Debt amount (add-client / update-client) or payment amount (payment)
    pub amount: Option<String>,

    /// Free-text payment note (payment)
    pub notes: Option<String>,

    /// Due date, epoch milliseconds (add-client / update-client)
    pub due: Option<String>,
}

impl OpRecord {
    /// Parses the raw CSV row into a typed operation.
    ///
    /// Returns `None` if the row is invalid (unknown op, missing or
    /// malformed amount, malformed due date).
    pub fn parse(&self) -> Option<ParsedOp> {
        let op = self.op.trim().to_lowercase();

        match op.as_str() {
            "add-client" => {
                let due = self.parse_due()?;
                Some(ParsedOp::AddClient {
                    label: self.client.clone(),
                    name: self.name.clone()?,
                    phone: self.phone.clone()?,
                    total_debt: self.parse_amount()?,
                    due,
                })
            }
            "update-client" => {
                let due = self.parse_due()?;
                Some(ParsedOp::UpdateClient {
                    label: self.client.clone(),
                    name: self.name.clone()?,
                    phone: self.phone.clone()?,
                    total_debt: self.parse_amount()?,
                    due,
                })
            }
            "delete-client" => Some(ParsedOp::DeleteClient {
                label: self.client.clone(),
            }),
            "payment" => Some(ParsedOp::Payment {
                label: self.client.clone(),
                amount: self.parse_amount()?,
                notes: self.notes.clone(),
            }),
            _ => None,
        }
    }

    /// Parses the amount field into `Money`.
    fn parse_amount(&self) -> Option<Money> {
        let amount_str = self.amount.as_ref()?;
        let trimmed = amount_str.trim();
        if trimmed.is_empty() {
            return None;
        }
        Money::from_str(trimmed).ok()
    }

    /// Parses the optional due date. Outer `None` means the value was
    /// present but malformed.
    fn parse_due(&self) -> Option<Option<i64>> {
        match self.due.as_deref().map(str::trim) {
            None | Some("") => Some(None),
            Some(s) => s.parse::<i64>().ok().map(Some),
        }
    }
}

/// A parsed and validated operation ready to apply to the ledger.
#[derive(Debug, Clone)]
pub enum ParsedOp {
    /// Register a new client under a label.
    AddClient {
        label: String,
        name: String,
        phone: String,
        total_debt: Money,
        due: Option<i64>,
    },

    /// Overwrite a labeled client's editable fields.
    UpdateClient {
        label: String,
        name: String,
        phone: String,
        total_debt: Money,
        due: Option<i64>,
    },

    /// Remove a labeled client and its history.
    DeleteClient { label: String },

    /// Record a payment against a labeled client.
    Payment {
        label: String,
        amount: Money,
        notes: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        op: &str,
        client: &str,
        name: Option<&str>,
        phone: Option<&str>,
        amount: Option<&str>,
        notes: Option<&str>,
        due: Option<&str>,
    ) -> OpRecord {
        OpRecord {
            op: op.to_string(),
            client: client.to_string(),
            name: name.map(str::to_string),
            phone: phone.map(str::to_string),
            amount: amount.map(str::to_string),
            notes: notes.map(str::to_string),
            due: due.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_add_client() {
        let rec = record(
            "add-client",
            "ali",
            Some("Ali"),
            Some("0600000000"),
            Some("1000"),
            None,
            Some("1700000000000"),
        );

        match rec.parse().unwrap() {
            ParsedOp::AddClient {
                label,
                name,
                total_debt,
                due,
                ..
            } => {
                assert_eq!(label, "ali");
                assert_eq!(name, "Ali");
                assert_eq!(total_debt.to_string(), "1000.00");
                assert_eq!(due, Some(1_700_000_000_000));
            }
            other => panic!("Expected AddClient, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_payment() {
        let rec = record(
            "payment",
            "ali",
            None,
            None,
            Some("400.5"),
            Some("first installment"),
            None,
        );

        match rec.parse().unwrap() {
            ParsedOp::Payment { amount, notes, .. } => {
                assert_eq!(amount.to_string(), "400.50");
                assert_eq!(notes.as_deref(), Some("first installment"));
            }
            other => panic!("Expected Payment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_handles_case_and_whitespace() {
        let rec = record("  ADD-CLIENT  ", "ali", Some("Ali"), Some("06"), Some("10"), None, None);
        assert!(matches!(rec.parse(), Some(ParsedOp::AddClient { .. })));
    }

    #[test]
    fn test_parse_rejects_unknown_op() {
        let rec = record("refund", "ali", None, None, Some("10"), None, None);
        assert!(rec.parse().is_none());
    }

    #[test]
    fn test_parse_rejects_missing_amount() {
        let rec = record("payment", "ali", None, None, None, None, None);
        assert!(rec.parse().is_none());

        let rec = record("add-client", "ali", Some("Ali"), Some("06"), None, None, None);
        assert!(rec.parse().is_none());
    }

    #[test]
    fn test_parse_rejects_malformed_due() {
        let rec = record(
            "add-client",
            "ali",
            Some("Ali"),
            Some("06"),
            Some("10"),
            None,
            Some("tomorrow"),
        );
        assert!(rec.parse().is_none());
    }

    #[test]
    fn test_parse_empty_due_means_absent() {
        let rec = record("add-client", "ali", Some("Ali"), Some("06"), Some("10"), None, Some("  "));
        match rec.parse().unwrap() {
            ParsedOp::AddClient { due, .. } => assert_eq!(due, None),
            other => panic!("Expected AddClient, got {:?}", other),
        }
    }
}
