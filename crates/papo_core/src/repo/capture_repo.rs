//! Capture repository: link artifacts and reminder notes.
//!
//! # Responsibility
//! - Persist extracted links with at-most-once semantics per origin.
//! - Own reminder note CRUD with author-scoped deletion.
//!
//! # Invariants
//! - Link dedup is enforced by the storage-layer unique index, not by
//!   application locking; concurrent duplicate inserts lose silently.
//! - Reminder notes have no dedup; free text may legitimately repeat.

use crate::model::ids::{AccountId, CommunityId};
use crate::model::records::{LinkCapture, ReminderNote};
use crate::repo::{ensure_schema_ready, RepoResult};
use rusqlite::{params, Connection, Row};

/// Repository interface for link and reminder persistence.
pub trait CaptureRepository {
    /// Inserts the capture unless its origin key already exists.
    ///
    /// Returns true when a new row landed, false for an absorbed duplicate.
    fn insert_link(&self, capture: &LinkCapture) -> RepoResult<bool>;

    /// Returns the newest captures for a community.
    fn recent_links(&self, community: CommunityId, limit: u32) -> RepoResult<Vec<LinkCapture>>;

    /// Returns the newest captures owned by one account.
    fn links_for_owner(
        &self,
        community: CommunityId,
        owner: AccountId,
        limit: u32,
    ) -> RepoResult<Vec<LinkCapture>>;

    /// Persists one reminder note and returns its storage id.
    fn add_reminder(&self, note: &ReminderNote) -> RepoResult<i64>;

    /// Returns the newest reminder notes for a community.
    fn list_reminders(&self, community: CommunityId, limit: u32)
        -> RepoResult<Vec<ReminderNote>>;

    /// Deletes one reminder; with `author` set, only that author's row.
    ///
    /// Returns true when a row was removed.
    fn delete_reminder(
        &self,
        community: CommunityId,
        id: i64,
        author: Option<AccountId>,
    ) -> RepoResult<bool>;

    /// Deletes every reminder in the community, returning the count.
    fn purge_reminders(&self, community: CommunityId) -> RepoResult<u64>;
}

/// SQLite-backed capture repository.
pub struct SqliteCaptureRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCaptureRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &["link_captures", "reminder_notes"])?;
        Ok(Self { conn })
    }
}

impl CaptureRepository for SqliteCaptureRepository<'_> {
    fn insert_link(&self, capture: &LinkCapture) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO link_captures
                 (community_id, owner_id, channel_id, message_id, url, ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                capture.community,
                capture.owner,
                capture.channel,
                capture.message,
                capture.url,
                capture.ts,
            ],
        )?;
        Ok(changed == 1)
    }

    fn recent_links(&self, community: CommunityId, limit: u32) -> RepoResult<Vec<LinkCapture>> {
        let mut stmt = self.conn.prepare(
            "SELECT community_id, owner_id, channel_id, message_id, url, ts
             FROM link_captures
             WHERE community_id = ?1
             ORDER BY ts DESC, id DESC
             LIMIT ?2;",
        )?;
        let mut rows = stmt.query(params![community, limit])?;
        collect_links(&mut rows)
    }

    fn links_for_owner(
        &self,
        community: CommunityId,
        owner: AccountId,
        limit: u32,
    ) -> RepoResult<Vec<LinkCapture>> {
        let mut stmt = self.conn.prepare(
            "SELECT community_id, owner_id, channel_id, message_id, url, ts
             FROM link_captures
             WHERE community_id = ?1 AND owner_id = ?2
             ORDER BY ts DESC, id DESC
             LIMIT ?3;",
        )?;
        let mut rows = stmt.query(params![community, owner, limit])?;
        collect_links(&mut rows)
    }

    fn add_reminder(&self, note: &ReminderNote) -> RepoResult<i64> {
        self.conn.execute(
            "INSERT INTO reminder_notes
                 (community_id, author_id, channel_id, message_id, mentions, note, ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                note.community,
                note.author,
                note.channel,
                note.message,
                note.mentions,
                note.note,
                note.ts,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_reminders(
        &self,
        community: CommunityId,
        limit: u32,
    ) -> RepoResult<Vec<ReminderNote>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, community_id, author_id, channel_id, message_id, mentions, note, ts
             FROM reminder_notes
             WHERE community_id = ?1
             ORDER BY ts DESC, id DESC
             LIMIT ?2;",
        )?;
        let mut rows = stmt.query(params![community, limit])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_reminder_row(row)?);
        }
        Ok(notes)
    }

    fn delete_reminder(
        &self,
        community: CommunityId,
        id: i64,
        author: Option<AccountId>,
    ) -> RepoResult<bool> {
        let changed = match author {
            Some(author) => self.conn.execute(
                "DELETE FROM reminder_notes
                 WHERE community_id = ?1 AND id = ?2 AND author_id = ?3;",
                params![community, id, author],
            )?,
            None => self.conn.execute(
                "DELETE FROM reminder_notes WHERE community_id = ?1 AND id = ?2;",
                params![community, id],
            )?,
        };
        Ok(changed == 1)
    }

    fn purge_reminders(&self, community: CommunityId) -> RepoResult<u64> {
        let changed = self.conn.execute(
            "DELETE FROM reminder_notes WHERE community_id = ?1;",
            params![community],
        )?;
        Ok(changed as u64)
    }
}

fn collect_links(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<LinkCapture>> {
    let mut links = Vec::new();
    while let Some(row) = rows.next()? {
        links.push(parse_link_row(row)?);
    }
    Ok(links)
}

fn parse_link_row(row: &Row<'_>) -> RepoResult<LinkCapture> {
    Ok(LinkCapture {
        community: row.get("community_id")?,
        owner: row.get("owner_id")?,
        channel: row.get("channel_id")?,
        message: row.get("message_id")?,
        url: row.get("url")?,
        ts: row.get("ts")?,
    })
}

fn parse_reminder_row(row: &Row<'_>) -> RepoResult<ReminderNote> {
    Ok(ReminderNote {
        id: row.get("id")?,
        community: row.get("community_id")?,
        author: row.get("author_id")?,
        channel: row.get("channel_id")?,
        message: row.get("message_id")?,
        mentions: row.get("mentions")?,
        note: row.get("note")?,
        ts: row.get("ts")?,
    })
}
