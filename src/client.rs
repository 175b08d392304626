//! Client debt record and balance operations.
//!
//! Maintains the invariant: `remaining_balance == total_debt - amount_paid`
//! after every mutation.

use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A debtor record tracked for store credit.
///
/// # Invariants
///
/// - `remaining_balance == total_debt - amount_paid` is maintained after
///   every operation
/// - `amount_paid` equals the sum of all recorded payments and is never
///   touched by edits
///
/// # Negative Remaining Balance
///
/// The `remaining_balance` field may become negative when an edit lowers
/// `total_debt` below the amount already paid. This represents an
/// overpayment credit owed back to the client and is accepted, not an
/// error. The invariant above is still maintained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Opaque unique identifier, immutable after creation.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Contact phone number.
    pub phone: String,

    /// Original amount owed. Never decremented by payments.
    pub total_debt: Money,

    /// Cumulative sum of all payments ever applied.
    pub amount_paid: Money,

    /// Derived `total_debt - amount_paid`, stored redundantly for fast
    /// listing and sorting. May be negative after an overpaying edit.
    pub remaining_balance: Money,

    /// Optional payment due date, epoch milliseconds. Absent means no due
    /// date is tracked.
    #[serde(default)]
    pub payment_due_date: Option<i64>,

    /// Count of payments ever recorded against this client. Incremented in
    /// the same transaction that inserts a payment; source of the unique
    /// payment sequence number.
    #[serde(default)]
    pub payments_recorded: u64,
}

impl Client {
    /// Creates a new client owing `total_debt` with nothing paid yet.
    pub fn new(
        id: String,
        name: String,
        phone: String,
        total_debt: Money,
        payment_due_date: Option<i64>,
    ) -> Self {
        Client {
            id,
            name,
            phone,
            total_debt,
            amount_paid: Money::ZERO,
            remaining_balance: total_debt,
            payment_due_date,
            payments_recorded: 0,
        }
    }

    /// Applies a payment to the balance fields.
    ///
    /// Increases `amount_paid`, recomputes `remaining_balance`, and returns
    /// the sequence number assigned to the payment.
    pub fn apply_payment(&mut self, amount: Money) -> u64 {
        self.amount_paid += amount;
        self.remaining_balance = self.total_debt - self.amount_paid;
        self.payments_recorded += 1;
        self.payments_recorded
    }

    /// Overwrites the editable fields, preserving payment history state.
    ///
    /// `amount_paid` and `payments_recorded` are untouched;
    /// `remaining_balance` is recomputed against the new `total_debt`.
    pub fn update_details(
        &mut self,
        name: String,
        phone: String,
        total_debt: Money,
        payment_due_date: Option<i64>,
    ) {
        self.name = name;
        self.phone = phone;
        self.total_debt = total_debt;
        self.payment_due_date = payment_due_date;
        self.remaining_balance = total_debt - self.amount_paid;
    }

    /// Returns `true` if the client still owes money.
    pub fn has_outstanding_balance(&self) -> bool {
        self.remaining_balance > Money::ZERO
    }

    /// Verifies the invariant: `remaining_balance == total_debt - amount_paid`.
    #[cfg(debug_assertions)]
    pub fn check_invariant(&self) -> bool {
        self.remaining_balance == self.total_debt - self.amount_paid
    }
}
