//! Core credit ledger operations.
//!
//! Owns the per-client balance arithmetic and the payment history
//! append/read path. Every read-modify-write goes through the store's
//! transaction primitive so two terminals sharing one store cannot lose
//! an update; read paths degrade to empty results instead of failing, so
//! a rendering caller always has something to show.

use crate::client::Client;
use crate::error::{LedgerError, Result};
use crate::money::Money;
use crate::payment::{PageCursor, Payment, PaymentPage};
use crate::store::{DocumentStore, RangeFilter, StoreError};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Collection holding client documents.
const CLIENTS: &str = "clients";

/// Default page size for payment history.
pub const DEFAULT_PAGE_SIZE: usize = 15;

/// How far ahead `due_soon` looks: seven days, in milliseconds.
pub const DUE_SOON_WINDOW_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// The client credit ledger.
///
/// Maintains per-client debt balances and an append-only payment history
/// against any [`DocumentStore`]. Balance fields and payment records are
/// written in the same transaction, so a reader never observes one
/// without the other.
pub struct CreditLedger<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> CreditLedger<S> {
    /// Creates a ledger over the given store.
    pub fn new(store: S) -> Self {
        CreditLedger { store }
    }

    /// Registers a new client owing `total_debt`.
    ///
    /// `name` and `phone` are trimmed and must be non-empty; `total_debt`
    /// must not be negative. The created client starts with nothing paid.
    pub fn add_client(
        &self,
        name: &str,
        phone: &str,
        total_debt: Money,
        payment_due_date: Option<i64>,
    ) -> Result<Client> {
        let (name, phone) = validate_client_fields(name, phone, total_debt)?;

        let client = Client::new(
            Uuid::new_v4().to_string(),
            name,
            phone,
            total_debt,
            payment_due_date,
        );
        self.store.set_document(CLIENTS, &client.id, encode(&client)?)?;

        debug!("Added client {} owing {}", client.id, client.total_debt);
        Ok(client)
    }

    /// Overwrites a client's editable fields.
    ///
    /// Recomputes the remaining balance against the new debt while
    /// preserving the amount already paid. Lowering `total_debt` below
    /// `amount_paid` leaves a negative remaining balance; this is an
    /// accepted overpayment credit, not an error.
    pub fn update_client(
        &self,
        id: &str,
        name: &str,
        phone: &str,
        total_debt: Money,
        payment_due_date: Option<i64>,
    ) -> Result<Client> {
        let (name, phone) = validate_client_fields(name, phone, total_debt)?;

        let mut updated: Option<Client> = None;
        self.store.run_transaction::<LedgerError>(&mut |tx| {
            let doc = tx
                .get(CLIENTS, id)?
                .ok_or_else(|| LedgerError::not_found(id))?;
            let mut client: Client = decode(doc)?;

            client.update_details(name.clone(), phone.clone(), total_debt, payment_due_date);
            tx.set(CLIENTS, id, encode(&client)?)?;
            updated = Some(client);
            Ok(())
        })?;

        debug!("Updated client {}", id);
        // Safety: the transaction committed, so the body ran and stored the client
        Ok(updated.expect("committed transaction produced a client"))
    }

    /// Removes a client and its entire payment history.
    ///
    /// Client and payments disappear together; there is no observable
    /// state where one remains without the other. Deleting an unknown id
    /// is a no-op success, which keeps the operation idempotent and
    /// safely retryable.
    pub fn delete_client(&self, id: &str) -> Result<()> {
        self.store.run_transaction::<LedgerError>(&mut |tx| {
            if tx.get(CLIENTS, id)?.is_none() {
                return Ok(());
            }

            let path = payments_path(id);
            for payment_id in tx.document_ids(&path)? {
                tx.delete(&path, &payment_id)?;
            }
            tx.delete(CLIENTS, id)?;
            Ok(())
        })?;

        debug!("Deleted client {} and its payment history", id);
        Ok(())
    }

    /// Records a payment against a client's debt.
    ///
    /// Runs as one store transaction: the balance fields on the client and
    /// the new payment record become visible together. Fails with a
    /// validation error unless `amount > 0`, and with not-found if the
    /// client does not exist.
    ///
    /// Not idempotent: a blind retry after an ambiguous failure risks
    /// recording the payment twice. Callers that retry must deduplicate
    /// externally.
    pub fn add_payment(
        &self,
        client_id: &str,
        amount: Money,
        notes: Option<&str>,
    ) -> Result<Payment> {
        if amount <= Money::ZERO {
            return Err(LedgerError::validation("payment amount must be positive"));
        }
        let notes = normalize_notes(notes);

        let mut created: Option<Payment> = None;
        self.store.run_transaction::<LedgerError>(&mut |tx| {
            let doc = tx
                .get(CLIENTS, client_id)?
                .ok_or_else(|| LedgerError::not_found(client_id))?;
            let mut client: Client = decode(doc)?;

            let seq = client.apply_payment(amount);
            let payment = Payment {
                id: Uuid::new_v4().to_string(),
                date: now_millis(),
                seq,
                amount,
                notes: notes.clone(),
            };

            tx.set(CLIENTS, client_id, encode(&client)?)?;
            tx.set(&payments_path(client_id), &payment.id, encode(&payment)?)?;
            created = Some(payment);
            Ok(())
        })?;

        debug!("Recorded payment of {} for client {}", amount, client_id);
        // Safety: the transaction committed, so the body ran and stored the payment
        Ok(created.expect("committed transaction produced a payment"))
    }

    /// Returns one page of a client's payment history, newest first.
    ///
    /// `cursor` is the position of the last record of the previous page
    /// (`None` for the first page); `next_cursor` in the result is `None`
    /// once fewer than `page_size` records remained. Safe to re-read: the
    /// same cursor over unchanged history yields the same page.
    ///
    /// A store failure or unknown client yields an empty page rather than
    /// an error.
    pub fn payment_history(
        &self,
        client_id: &str,
        cursor: Option<PageCursor>,
        page_size: usize,
    ) -> PaymentPage {
        let filter = match cursor {
            // records at the cursor timestamp may still belong to this
            // page when their sequence is lower, so fetch date <= cursor
            Some(c) => RangeFilter::LessThan(c.date + 1),
            None => RangeFilter::Unbounded,
        };

        let raw = match self.store.query_range(&payments_path(client_id), "date", filter) {
            Ok(docs) => docs,
            Err(e) => {
                warn!(
                    "Payment history read for client {} failed, returning empty page: {}",
                    client_id, e
                );
                return PaymentPage::empty();
            }
        };

        let mut payments: Vec<Payment> = Vec::with_capacity(raw.len());
        for doc in raw {
            match serde_json::from_value(doc) {
                Ok(payment) => payments.push(payment),
                Err(e) => warn!("Skipping undecodable payment for client {}: {}", client_id, e),
            }
        }

        payments.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        if let Some(c) = cursor {
            payments.retain(|p| p.sort_key() < c.sort_key());
        }

        if payments.len() < page_size {
            return PaymentPage {
                payments,
                next_cursor: None,
            };
        }

        payments.truncate(page_size);
        let next_cursor = payments.last().map(Payment::cursor);
        PaymentPage {
            payments,
            next_cursor,
        }
    }

    /// Returns all clients, highest remaining balance first.
    ///
    /// Degrades to an empty list on store failure.
    pub fn clients(&self) -> Vec<Client> {
        let raw = match self.store.list_documents(CLIENTS) {
            Ok(docs) => docs,
            Err(e) => {
                warn!("Client list read failed, returning empty list: {}", e);
                return Vec::new();
            }
        };

        let mut clients: Vec<Client> = Vec::with_capacity(raw.len());
        for doc in raw {
            match serde_json::from_value(doc) {
                Ok(client) => clients.push(client),
                Err(e) => warn!("Skipping undecodable client document: {}", e),
            }
        }

        clients.sort_by(|a, b| b.remaining_balance.cmp(&a.remaining_balance));
        clients
    }

    /// Fetches a single client by id.
    pub fn client(&self, id: &str) -> Result<Client> {
        let doc = self
            .store
            .get_document(CLIENTS, id)?
            .ok_or_else(|| LedgerError::not_found(id))?;
        decode(doc)
    }

    /// Sum of remaining balances over all clients.
    ///
    /// Raw sum: a client holding an overpayment credit subtracts from the
    /// total.
    pub fn total_outstanding(&self) -> Money {
        self.clients()
            .iter()
            .fold(Money::ZERO, |sum, client| sum + client.remaining_balance)
    }

    /// Clients still owing money whose due date falls at or before
    /// `now + 7 days`, overdue included, ordered soonest first.
    ///
    /// Clients without a due date are never reported. Degrades to an
    /// empty list on store failure.
    pub fn due_soon(&self, now: i64) -> Vec<Client> {
        let deadline = now + DUE_SOON_WINDOW_MS;
        let raw = match self
            .store
            .query_range(CLIENTS, "paymentDueDate", RangeFilter::LessThan(deadline + 1))
        {
            Ok(docs) => docs,
            Err(e) => {
                warn!("Due date scan failed, returning no alerts: {}", e);
                return Vec::new();
            }
        };

        let mut alerts: Vec<Client> = Vec::new();
        for doc in raw {
            match serde_json::from_value::<Client>(doc) {
                Ok(client) if client.has_outstanding_balance() => alerts.push(client),
                Ok(_) => {}
                Err(e) => warn!("Skipping undecodable client document: {}", e),
            }
        }

        alerts.sort_by_key(|c| c.payment_due_date);
        alerts
    }
}

impl<S: DocumentStore + Default> Default for CreditLedger<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

/// Sub-collection holding a client's payments.
fn payments_path(client_id: &str) -> String {
    format!("{CLIENTS}/{client_id}/payments")
}

fn validate_client_fields(name: &str, phone: &str, total_debt: Money) -> Result<(String, String)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::validation("client name must not be empty"));
    }

    let phone = phone.trim();
    if phone.is_empty() {
        return Err(LedgerError::validation("client phone must not be empty"));
    }

    if total_debt.is_negative() {
        return Err(LedgerError::validation("total debt must not be negative"));
    }

    Ok((name.to_string(), phone.to_string()))
}

fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

fn encode<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| LedgerError::Store(StoreError::Codec(e)))
}

fn decode<T: DeserializeOwned>(doc: Value) -> Result<T> {
    serde_json::from_value(doc).map_err(|e| LedgerError::Store(StoreError::Codec(e)))
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
