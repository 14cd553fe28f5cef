//! In-memory ledger implementation
//!
//! Uses DashMap for concurrent access. Per-user serialization comes from
//! exclusive entry access during `hold`: the balance check and the
//! decrement happen under one entry guard, which closes the
//! check-then-write race between concurrent reservations.

use async_trait::async_trait;
use chrono::Duration;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{debug, warn};
use uuid::Uuid;

use symreg_common::{now_millis, Account, AccountError, Settlement, Transaction};

use super::{LedgerError, LedgerStore};

/// In-memory ledger backend
pub struct InMemoryLedger {
    /// Accounts by user id
    accounts: DashMap<Uuid, Account>,

    /// All transactions by id
    transactions: DashMap<Uuid, Transaction>,

    /// Transaction ids per user, insertion order
    by_user: DashMap<Uuid, Vec<Uuid>>,
}

impl InMemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            transactions: DashMap::new(),
            by_user: DashMap::new(),
        }
    }

    /// Register an account with an initial balance; used by admin flows
    /// and tests. Returns the user id for convenience.
    pub fn open_account(&self, user_id: Uuid, initial_balance: Decimal) -> Uuid {
        self.accounts
            .entry(user_id)
            .or_insert_with(|| Account::with_balance(user_id, initial_balance));
        user_id
    }

    /// Total number of recorded transactions
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    fn record(&self, tx: Transaction) -> Uuid {
        let id = tx.id;
        self.by_user.entry(tx.user_id).or_default().push(id);
        self.transactions.insert(id, tx);
        id
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn balance(&self, user_id: Uuid) -> Result<Decimal, LedgerError> {
        let account = self
            .accounts
            .get(&user_id)
            .ok_or(LedgerError::UnknownUser(user_id))?;
        Ok(account.available)
    }

    async fn credit(
        &self,
        user_id: Uuid,
        amount: Decimal,
        description: &str,
    ) -> Result<Decimal, LedgerError> {
        let new_balance = {
            let mut account = self
                .accounts
                .entry(user_id)
                .or_insert_with(|| Account::new(user_id));
            account.credit(amount)?;
            account.available
        };

        self.record(Transaction::top_up(user_id, amount, description.to_string()));
        debug!(%user_id, %amount, "credited account");
        Ok(new_balance)
    }

    async fn reserve(
        &self,
        user_id: Uuid,
        amount: Decimal,
        job_id: Uuid,
        description: &str,
    ) -> Result<Uuid, LedgerError> {
        {
            // Exclusive entry access: check and hold are one atomic step.
            let mut account = self
                .accounts
                .get_mut(&user_id)
                .ok_or(LedgerError::UnknownUser(user_id))?;
            account.hold(amount).map_err(|err| match err {
                AccountError::InsufficientFunds {
                    required,
                    available,
                } => LedgerError::InsufficientFunds {
                    required,
                    available,
                },
                other => LedgerError::Account(other),
            })?;
        }

        let tx_id = self.record(Transaction::charge(
            user_id,
            amount,
            job_id,
            description.to_string(),
        ));
        debug!(%user_id, %amount, %job_id, %tx_id, "reserved funds");
        Ok(tx_id)
    }

    async fn commit(&self, tx_id: Uuid, settlement: Settlement) -> Result<(), LedgerError> {
        let mut tx = self
            .transactions
            .get_mut(&tx_id)
            .ok_or(LedgerError::UnknownTransaction(tx_id))?;

        if tx.status.is_terminal() {
            if tx.status == settlement.terminal_status() {
                // Repeated identical settlement is a no-op.
                return Ok(());
            }
            return Err(LedgerError::SettlementConflict {
                id: tx_id,
                status: tx.status,
            });
        }

        {
            let mut account = self
                .accounts
                .get_mut(&tx.user_id)
                .ok_or(LedgerError::UnknownUser(tx.user_id))?;
            let amount = tx.held_amount();
            match settlement {
                Settlement::Charge => account.settle_charge(amount)?,
                Settlement::Release => account.settle_release(amount)?,
            }
        }

        tx.status = settlement.terminal_status();
        tx.settled_at = Some(now_millis());
        debug!(%tx_id, ?settlement, "settled transaction");
        Ok(())
    }

    async fn transaction(&self, tx_id: Uuid) -> Result<Transaction, LedgerError> {
        self.transactions
            .get(&tx_id)
            .map(|tx| tx.clone())
            .ok_or(LedgerError::UnknownTransaction(tx_id))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Transaction>, LedgerError> {
        let ids = match self.by_user.get(&user_id) {
            Some(ids) => ids.clone(),
            None => return Ok(Vec::new()),
        };
        Ok(ids
            .iter()
            .filter_map(|id| self.transactions.get(id).map(|tx| tx.clone()))
            .collect())
    }

    async fn sweep_stale(&self, grace: Duration) -> Result<usize, LedgerError> {
        let cutoff = now_millis() - grace.num_milliseconds();

        // Collect first; settling while iterating would hold shard locks.
        let stale: Vec<Uuid> = self
            .transactions
            .iter()
            .filter(|entry| entry.is_pending() && entry.created_at <= cutoff)
            .map(|entry| entry.id)
            .collect();

        let mut reversed = 0;
        for tx_id in stale {
            match self.commit(tx_id, Settlement::Release).await {
                Ok(()) => reversed += 1,
                // A concurrent settlement won the race; nothing to recover.
                Err(LedgerError::SettlementConflict { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        if reversed > 0 {
            warn!(reversed, "swept orphaned pending reservations");
        }
        Ok(reversed)
    }
}
