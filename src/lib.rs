//! # Credit Ledger
//!
//! A client store-credit ledger for small-business bookkeeping: per-client
//! debt balances, an append-only payment history with cursor-based
//! pagination, and an atomic balance-update path over a pluggable
//! document store.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: 2 decimal places via `rust_decimal`
//! - **Transactional writes**: balance fields and payment records commit
//!   together; concurrent terminals cannot lose an update
//! - **Strict invariants**: `remaining_balance == total_debt - amount_paid`
//!   always maintained
//! - **Tolerant reads**: read paths degrade to empty results instead of
//!   failing, so a rendering caller always has something to show
//!
//! ## Example
//!
//! ```
//! use credit_ledger::{CreditLedger, MemoryStore, Money, DEFAULT_PAGE_SIZE};
//! use std::str::FromStr;
//!
//! let ledger = CreditLedger::new(MemoryStore::new());
//! let client = ledger
//!     .add_client("Ali", "0600000000", Money::from_str("1000").unwrap(), None)
//!     .unwrap();
//!
//! ledger.add_payment(&client.id, Money::from_str("400").unwrap(), None).unwrap();
//!
//! let after = ledger.client(&client.id).unwrap();
//! assert_eq!(after.remaining_balance.to_string(), "600.00");
//!
//! let history = ledger.payment_history(&client.id, None, DEFAULT_PAGE_SIZE);
//! assert_eq!(history.payments.len(), 1);
//! ```

pub mod client;
pub mod error;
pub mod ledger;
pub mod money;
pub mod ops;
pub mod payment;
pub mod replay;
pub mod store;

pub use client::Client;
pub use error::{LedgerError, Result};
pub use ledger::{CreditLedger, DEFAULT_PAGE_SIZE, DUE_SOON_WINDOW_MS};
pub use money::Money;
pub use ops::{OpRecord, ParsedOp};
pub use payment::{PageCursor, Payment, PaymentPage};
pub use replay::CsvReplay;
pub use store::{DocumentStore, MemoryStore, RangeFilter, StoreError, StoreTransaction};
