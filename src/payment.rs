//! Payment records and pagination types for payment history.

use crate::money::Money;
use serde::{Deserialize, Serialize};

/// One recorded partial repayment against a client's debt.
///
/// Payments are immutable after creation and owned exclusively by one
/// client; they are removed only when the owning client is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Unique within the owning client's payment set.
    pub id: String,

    /// Timestamp of the payment, epoch milliseconds.
    pub date: i64,

    /// Per-client insertion sequence. Strictly increasing, so `(date, seq)`
    /// is unique even when two payments share a timestamp.
    pub seq: u64,

    /// Positive amount paid.
    pub amount: Money,

    /// Optional free-text note.
    #[serde(default)]
    pub notes: Option<String>,
}

impl Payment {
    /// The pagination position of this payment.
    pub fn cursor(&self) -> PageCursor {
        PageCursor {
            date: self.date,
            seq: self.seq,
        }
    }

    /// Sort key for newest-first ordering.
    pub(crate) fn sort_key(&self) -> (i64, u64) {
        (self.date, self.seq)
    }
}

/// Pagination marker for payment history.
///
/// A composite of the last returned payment's timestamp and insertion
/// sequence. The sequence component disambiguates payments sharing a
/// timestamp, so pages never skip or repeat a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    /// Timestamp of the last record of the previous page.
    pub date: i64,

    /// Insertion sequence of the last record of the previous page.
    pub seq: u64,
}

impl PageCursor {
    pub(crate) fn sort_key(&self) -> (i64, u64) {
        (self.date, self.seq)
    }
}

/// One page of payment history, newest first.
#[derive(Debug, Clone, Default)]
pub struct PaymentPage {
    /// At most `page_size` payments, ordered by `(date, seq)` descending.
    pub payments: Vec<Payment>,

    /// Cursor for the next page, or `None` when no further pages exist.
    pub next_cursor: Option<PageCursor>,
}

impl PaymentPage {
    /// An empty final page.
    pub fn empty() -> Self {
        PaymentPage::default()
    }
}
