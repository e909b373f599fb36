//! Ledger repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Own per-(community, account) balance upserts and the audit log.
//! - Keep the balance/audit write inside one SQLite transaction.
//!
//! # Invariants
//! - Accounts are created lazily at balance 0 on first mutation.
//! - After every commit, the sum of audit deltas for an account equals
//!   that account's stored balance.
//! - `rank_top` ordering is deterministic: balance descending, account id
//!   ascending on ties.

use crate::model::ids::{AccountId, CommunityId};
use crate::model::records::LedgerEntry;
use crate::repo::{ensure_schema_ready, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

/// Repository interface for balance and audit operations.
pub trait LedgerRepository {
    /// Upserts the account row and applies the signed delta atomically.
    fn adjust_balance(
        &self,
        community: CommunityId,
        account: AccountId,
        delta: i64,
    ) -> RepoResult<i64>;

    /// Applies the delta and appends the audit entry in one transaction.
    ///
    /// Returns the post-mutation balance.
    fn adjust_with_audit(
        &self,
        community: CommunityId,
        actor: AccountId,
        target: AccountId,
        delta: i64,
        reason: Option<&str>,
        ts: i64,
    ) -> RepoResult<i64>;

    /// Returns the current balance, 0 for accounts never mutated.
    fn balance_of(&self, community: CommunityId, account: AccountId) -> RepoResult<i64>;

    /// Returns up to `limit` accounts ordered by balance.
    fn rank_top(
        &self,
        community: CommunityId,
        limit: u32,
    ) -> RepoResult<Vec<(AccountId, i64)>>;

    /// Returns the newest audit entries for one target, newest first.
    fn entries_for(
        &self,
        community: CommunityId,
        target: AccountId,
        limit: u32,
    ) -> RepoResult<Vec<LedgerEntry>>;
}

/// SQLite-backed ledger repository.
pub struct SqliteLedgerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLedgerRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &["accounts", "ledger_entries"])?;
        Ok(Self { conn })
    }
}

impl LedgerRepository for SqliteLedgerRepository<'_> {
    fn adjust_balance(
        &self,
        community: CommunityId,
        account: AccountId,
        delta: i64,
    ) -> RepoResult<i64> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let balance = apply_delta(&tx, community, account, delta)?;
        tx.commit()?;
        Ok(balance)
    }

    fn adjust_with_audit(
        &self,
        community: CommunityId,
        actor: AccountId,
        target: AccountId,
        delta: i64,
        reason: Option<&str>,
        ts: i64,
    ) -> RepoResult<i64> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let balance = apply_delta(&tx, community, target, delta)?;
        tx.execute(
            "INSERT INTO ledger_entries (community_id, actor_id, target_id, delta, reason, ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![community, actor, target, delta, reason, ts],
        )?;
        tx.commit()?;
        Ok(balance)
    }

    fn balance_of(&self, community: CommunityId, account: AccountId) -> RepoResult<i64> {
        let mut stmt = self.conn.prepare(
            "SELECT balance FROM accounts WHERE community_id = ?1 AND account_id = ?2;",
        )?;
        let mut rows = stmt.query(params![community, account])?;
        if let Some(row) = rows.next()? {
            return Ok(row.get(0)?);
        }
        Ok(0)
    }

    fn rank_top(
        &self,
        community: CommunityId,
        limit: u32,
    ) -> RepoResult<Vec<(AccountId, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT account_id, balance
             FROM accounts
             WHERE community_id = ?1
             ORDER BY balance DESC, account_id ASC
             LIMIT ?2;",
        )?;
        let mut rows = stmt.query(params![community, limit])?;
        let mut ranked = Vec::new();
        while let Some(row) = rows.next()? {
            ranked.push((row.get(0)?, row.get(1)?));
        }
        Ok(ranked)
    }

    fn entries_for(
        &self,
        community: CommunityId,
        target: AccountId,
        limit: u32,
    ) -> RepoResult<Vec<LedgerEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, community_id, actor_id, target_id, delta, reason, ts
             FROM ledger_entries
             WHERE community_id = ?1 AND target_id = ?2
             ORDER BY seq DESC
             LIMIT ?3;",
        )?;
        let mut rows = stmt.query(params![community, target, limit])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }
}

fn apply_delta(
    tx: &Transaction<'_>,
    community: CommunityId,
    account: AccountId,
    delta: i64,
) -> RepoResult<i64> {
    tx.execute(
        "INSERT INTO accounts (community_id, account_id, balance)
         VALUES (?1, ?2, 0)
         ON CONFLICT (community_id, account_id) DO NOTHING;",
        params![community, account],
    )?;
    tx.execute(
        "UPDATE accounts
         SET balance = balance + ?3
         WHERE community_id = ?1 AND account_id = ?2;",
        params![community, account, delta],
    )?;
    let balance = tx.query_row(
        "SELECT balance FROM accounts WHERE community_id = ?1 AND account_id = ?2;",
        params![community, account],
        |row| row.get(0),
    )?;
    Ok(balance)
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<LedgerEntry> {
    Ok(LedgerEntry {
        seq: row.get("seq")?,
        community: row.get("community_id")?,
        actor: row.get("actor_id")?,
        target: row.get("target_id")?,
        delta: row.get("delta")?,
        reason: row.get("reason")?,
        ts: row.get("ts")?,
    })
}
