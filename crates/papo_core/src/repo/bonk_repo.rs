//! Bonk event repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Append trigger events and answer windowed count queries.
//! - Own the bounded most-recent-first removal path.
//!
//! # Invariants
//! - Counts against a target include every actor's events.
//! - Leaderboard ordering is deterministic: count descending, actor id
//!   ascending on ties.
//! - Removal deletes newest rows first (`ts DESC, id DESC`) and never
//!   errors on under-supply.

use crate::model::ids::{AccountId, CommunityId};
use crate::model::records::BonkEvent;
use crate::repo::{ensure_schema_ready, RepoResult};
use rusqlite::{params, Connection};

/// Lower time bound for count/leaderboard/removal queries.
///
/// `None` means all time; `Some(ms)` keeps rows with `ts >= ms`.
pub type WindowStart = Option<i64>;

/// Repository interface for bonk event persistence and aggregates.
pub trait BonkRepository {
    /// Appends one event and returns its storage id.
    fn append(&self, event: &BonkEvent) -> RepoResult<i64>;

    /// Counts events against a target from any actor within the window.
    fn count_for_target(
        &self,
        community: CommunityId,
        target: AccountId,
        since: WindowStart,
    ) -> RepoResult<u64>;

    /// Counts events for one (actor, target) pair within the window.
    fn count_for_pair(
        &self,
        community: CommunityId,
        actor: AccountId,
        target: AccountId,
        since: WindowStart,
    ) -> RepoResult<u64>;

    /// Returns up to `limit` actors ranked by events against the target.
    fn leaderboard(
        &self,
        community: CommunityId,
        target: AccountId,
        since: WindowStart,
        limit: u32,
    ) -> RepoResult<Vec<(AccountId, u64)>>;

    /// Deletes up to `count` newest matching events, returning how many
    /// actually went away.
    fn remove_recent(
        &self,
        community: CommunityId,
        actor: AccountId,
        target: AccountId,
        since: WindowStart,
        count: u32,
    ) -> RepoResult<u64>;
}

/// SQLite-backed bonk repository.
pub struct SqliteBonkRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBonkRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &["bonk_events"])?;
        Ok(Self { conn })
    }
}

impl BonkRepository for SqliteBonkRepository<'_> {
    fn append(&self, event: &BonkEvent) -> RepoResult<i64> {
        self.conn.execute(
            "INSERT INTO bonk_events
                 (community_id, actor_id, target_id, channel_id, message_id, ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                event.community,
                event.actor,
                event.target,
                event.channel,
                event.message,
                event.ts,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn count_for_target(
        &self,
        community: CommunityId,
        target: AccountId,
        since: WindowStart,
    ) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM bonk_events
             WHERE community_id = ?1 AND target_id = ?2
               AND (?3 IS NULL OR ts >= ?3);",
            params![community, target, since],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_for_pair(
        &self,
        community: CommunityId,
        actor: AccountId,
        target: AccountId,
        since: WindowStart,
    ) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM bonk_events
             WHERE community_id = ?1 AND actor_id = ?2 AND target_id = ?3
               AND (?4 IS NULL OR ts >= ?4);",
            params![community, actor, target, since],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn leaderboard(
        &self,
        community: CommunityId,
        target: AccountId,
        since: WindowStart,
        limit: u32,
    ) -> RepoResult<Vec<(AccountId, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT actor_id, COUNT(*) AS bonks
             FROM bonk_events
             WHERE community_id = ?1 AND target_id = ?2
               AND (?3 IS NULL OR ts >= ?3)
             GROUP BY actor_id
             ORDER BY bonks DESC, actor_id ASC
             LIMIT ?4;",
        )?;
        let mut rows = stmt.query(params![community, target, since, limit])?;
        let mut ranked = Vec::new();
        while let Some(row) = rows.next()? {
            let count: i64 = row.get("bonks")?;
            ranked.push((row.get("actor_id")?, count as u64));
        }
        Ok(ranked)
    }

    fn remove_recent(
        &self,
        community: CommunityId,
        actor: AccountId,
        target: AccountId,
        since: WindowStart,
        count: u32,
    ) -> RepoResult<u64> {
        let changed = self.conn.execute(
            "DELETE FROM bonk_events
             WHERE id IN (
                 SELECT id
                 FROM bonk_events
                 WHERE community_id = ?1 AND actor_id = ?2 AND target_id = ?3
                   AND (?4 IS NULL OR ts >= ?4)
                 ORDER BY ts DESC, id DESC
                 LIMIT ?5
             );",
            params![community, actor, target, since, count],
        )?;
        Ok(changed as u64)
    }
}
