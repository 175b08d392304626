//! Streaming CSV replay of ledger operations.
//!
//! Reads operation rows one at a time, applies them to a ledger, and
//! writes the final balance table. Invalid rows are logged at warn level
//! and skipped so one bad row never aborts a replay.

use crate::error::Result;
use crate::ledger::CreditLedger;
use crate::ops::{OpRecord, ParsedOp};
use crate::store::DocumentStore;
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use std::collections::HashMap;
use std::io::{Read, Write};

/// Replays CSV operation streams against a ledger.
///
/// Rows reference clients by caller-chosen labels; the replay maps each
/// label to the id generated when its `add-client` row was applied.
pub struct CsvReplay<S: DocumentStore> {
    ledger: CreditLedger<S>,
    labels: HashMap<String, String>,
}

impl<S: DocumentStore> CsvReplay<S> {
    /// Creates a replay over the given ledger.
    pub fn new(ledger: CreditLedger<S>) -> Self {
        CsvReplay {
            ledger,
            labels: HashMap::new(),
        }
    }

    /// Processes operations from a CSV reader in streaming fashion.
    ///
    /// Records are read one at a time. Rows that fail to parse or that
    /// the ledger rejects are logged at warn level and skipped.
    pub fn process_csv<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        for (row_idx, result) in csv_reader.deserialize::<OpRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            match result {
                Ok(record) => {
                    if let Some(op) = record.parse() {
                        if let Err(e) = self.apply(op, row_num) {
                            warn!("Row {}: {}", row_num, e);
                        }
                    } else {
                        warn!("Row {}: Failed to parse operation record", row_num);
                    }
                }
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                }
            }
        }

        Ok(())
    }

    /// Applies a single parsed operation.
    fn apply(&mut self, op: ParsedOp, row: usize) -> Result<()> {
        match op {
            ParsedOp::AddClient {
                label,
                name,
                phone,
                total_debt,
                due,
            } => {
                let client = self.ledger.add_client(&name, &phone, total_debt, due)?;
                debug!("Row {}: Added client {} under label {}", row, client.id, label);
                self.labels.insert(label, client.id);
            }
            ParsedOp::UpdateClient {
                label,
                name,
                phone,
                total_debt,
                due,
            } => {
                let Some(id) = self.resolve(&label, row) else {
                    return Ok(());
                };
                self.ledger.update_client(&id, &name, &phone, total_debt, due)?;
                debug!("Row {}: Updated client {}", row, id);
            }
            ParsedOp::DeleteClient { label } => {
                let Some(id) = self.resolve(&label, row) else {
                    return Ok(());
                };
                self.ledger.delete_client(&id)?;
                self.labels.remove(&label);
                debug!("Row {}: Deleted client {}", row, id);
            }
            ParsedOp::Payment {
                label,
                amount,
                notes,
            } => {
                let Some(id) = self.resolve(&label, row) else {
                    return Ok(());
                };
                self.ledger.add_payment(&id, amount, notes.as_deref())?;
                debug!("Row {}: Recorded payment of {} for client {}", row, amount, id);
            }
        }

        Ok(())
    }

    /// Looks up the id behind a label, warning on unknown labels.
    fn resolve(&self, label: &str, row: usize) -> Option<String> {
        let id = self.labels.get(label).cloned();
        if id.is_none() {
            warn!("Row {}: Unknown client label {}, ignoring", row, label);
        }
        id
    }

    /// Writes the final balance table as CSV.
    ///
    /// Output is sorted by client name (then id) for deterministic
    /// results. All monetary values carry exactly 2 decimal places.
    pub fn write_balances<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "client",
            "phone",
            "total_debt",
            "amount_paid",
            "remaining_balance",
        ])?;

        let mut clients = self.ledger.clients();
        clients.sort_by(|a, b| (&a.name, &a.id).cmp(&(&b.name, &b.id)));

        for client in clients {
            csv_writer.write_record([
                client.name.clone(),
                client.phone.clone(),
                client.total_debt.to_string(),
                client.amount_paid.to_string(),
                client.remaining_balance.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}
