//! Monitored transactions
//!
//! Wraps `pool.begin()` so connection wait and hold times show up in the
//! logs. Long-held write transactions are what make concurrent toggles
//! queue up behind each other.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::time::Instant;

use colorhunt_common::Result;

/// Transaction wrapper that logs acquisition and release timing
pub struct MonitoredTransaction<'c> {
    tx: Option<Transaction<'c, Sqlite>>,
    caller: &'static str,
    acquired_at: Instant,
}

impl<'c> MonitoredTransaction<'c> {
    fn new(tx: Transaction<'c, Sqlite>, caller: &'static str) -> Self {
        Self {
            tx: Some(tx),
            caller,
            acquired_at: Instant::now(),
        }
    }

    /// Connection to run queries on inside the transaction
    pub fn conn(&mut self) -> &mut SqliteConnection {
        // commit/rollback take self, so the transaction is always present here
        let tx = self.tx.as_mut().expect("transaction already consumed");
        &mut **tx
    }

    /// Commit and log how long the transaction was held
    pub async fn commit(mut self) -> Result<()> {
        let held_ms = self.acquired_at.elapsed().as_millis();
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }

        if held_ms > 2000 {
            tracing::warn!(
                caller = self.caller,
                held_ms = held_ms,
                "Long transaction: write lock held for an extended period"
            );
        } else if held_ms > 500 {
            tracing::info!(
                caller = self.caller,
                held_ms = held_ms,
                "Transaction held longer than expected"
            );
        } else {
            tracing::debug!(caller = self.caller, held_ms = held_ms, "Transaction committed");
        }

        Ok(())
    }

    /// Roll back explicitly
    pub async fn rollback(mut self) -> Result<()> {
        let held_ms = self.acquired_at.elapsed().as_millis();
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        tracing::debug!(caller = self.caller, held_ms = held_ms, "Transaction rolled back");
        Ok(())
    }
}

impl Drop for MonitoredTransaction<'_> {
    fn drop(&mut self) {
        // The inner transaction rolls itself back when dropped
        if self.tx.is_some() {
            tracing::debug!(
                caller = self.caller,
                held_ms = self.acquired_at.elapsed().as_millis(),
                "Transaction dropped without commit"
            );
        }
    }
}

/// Begin a deferred transaction with pool timing logs
pub async fn begin_monitored<'c>(
    pool: &'c SqlitePool,
    caller: &'static str,
) -> Result<MonitoredTransaction<'c>> {
    let start = Instant::now();

    let tx = pool.begin().await?;

    let wait_ms = start.elapsed().as_millis();
    if wait_ms > 1000 {
        tracing::warn!(
            caller = caller,
            wait_ms = wait_ms,
            "Slow connection acquisition, pool may be saturated"
        );
    } else {
        tracing::trace!(caller = caller, wait_ms = wait_ms, "Connection acquired");
    }

    Ok(MonitoredTransaction::new(tx, caller))
}
