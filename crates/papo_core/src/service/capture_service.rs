//! Capture service: live link ingestion, backfill scans, reminder bank.
//!
//! # Responsibility
//! - Run the extraction + dedup-insert pipeline for live and historical
//!   messages.
//! - Own reminder note use-cases with author/admin scoping.
//!
//! # Invariants
//! - Duplicate payloads are absorbed silently and counted as zero.
//! - A scan retains partial progress: rows ingested before a fetch
//!   failure or cancellation stay persisted and are reported.
//! - Per-message failures inside a scan are logged, never fatal.

use crate::config::PapoConfig;
use crate::extract::{extract_links, LinkPattern};
use crate::model::gateway::{HistoryScanRequest, RawMessageEvent, ScanReport};
use crate::model::ids::{AccountId, ChannelId, CommunityId, MessageId};
use crate::model::records::{LinkCapture, ReminderNote};
use crate::repo::capture_repo::CaptureRepository;
use crate::repo::RepoError;
use chrono::Utc;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Gateway port for paged channel history reads, newest first.
///
/// Implementations live in the gateway collaborator; tests provide
/// scripted fakes.
pub trait ChannelHistory {
    /// Fetches up to `limit` messages older than `before` (newest first).
    ///
    /// `None` starts from the newest message in the channel.
    fn fetch_before(
        &mut self,
        channel: ChannelId,
        before: Option<MessageId>,
        limit: u32,
    ) -> Result<Vec<RawMessageEvent>, HistoryFetchError>;
}

/// Transient failure reading channel history from the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryFetchError {
    Unavailable(String),
}

impl Display for HistoryFetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "history unavailable: {message}"),
        }
    }
}

impl Error for HistoryFetchError {}

/// Capture-layer error for authorization and storage failures.
#[derive(Debug)]
pub enum CaptureError {
    /// Requesting actor lacks the admin capability.
    NotAuthorized,
    /// Storage failed outside a best-effort scan path.
    Storage(RepoError),
}

impl Display for CaptureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthorized => write!(f, "actor is not authorized for this action"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CaptureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::NotAuthorized => None,
        }
    }
}

impl From<RepoError> for CaptureError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Capture service facade over a repository implementation.
pub struct CaptureService<C: CaptureRepository> {
    repo: C,
    pattern: LinkPattern,
    config: Arc<PapoConfig>,
}

impl<C: CaptureRepository> CaptureService<C> {
    /// Creates a service; the link pattern is compiled from configuration.
    pub fn new(repo: C, config: Arc<PapoConfig>) -> Self {
        let pattern = LinkPattern::new(config.capture.link_hosts.iter().cloned());
        Self {
            repo,
            pattern,
            config,
        }
    }

    /// Captures links from one live message.
    ///
    /// Returns the number of newly persisted links; messages from
    /// non-tracked authors contribute zero.
    pub fn observe_message(&self, event: &RawMessageEvent) -> Result<u32, CaptureError> {
        if let Some(owner) = self.config.capture.tracked_owner {
            if event.author != owner {
                return Ok(0);
            }
        }

        let links = extract_links(&event.text, &event.embeds, &self.pattern);
        if links.is_empty() {
            return Ok(0);
        }
        self.ingest(
            event.community,
            event.author,
            event.channel,
            event.message,
            &links,
        )
    }

    /// Inserts each payload if absent, keyed by (community, owner,
    /// message, payload). Duplicates are absorbed and not counted.
    pub fn ingest(
        &self,
        community: CommunityId,
        owner: AccountId,
        channel: ChannelId,
        message: MessageId,
        payloads: &[String],
    ) -> Result<u32, CaptureError> {
        let ts = Utc::now().timestamp_millis();
        let mut inserted = 0;
        for payload in payloads {
            let capture = LinkCapture {
                community,
                owner,
                channel,
                message,
                url: payload.clone(),
                ts,
            };
            if self.repo.insert_link(&capture)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Backfill-captures links from channel history, newest first.
    ///
    /// Admin-only. The report is partial (`complete = false`) when the
    /// scan stops on cancellation or a fetch failure; everything ingested
    /// up to that point stays persisted.
    pub fn scan_channel_history(
        &self,
        source: &mut dyn ChannelHistory,
        request: &HistoryScanRequest,
        cancel: &AtomicBool,
    ) -> Result<ScanReport, CaptureError> {
        if !self.config.ledger.is_admin(request.requesting_actor) {
            return Err(CaptureError::NotAuthorized);
        }

        let mut report = ScanReport::default();
        let mut cursor: Option<MessageId> = None;
        let page_size = self.config.capture.scan_page_size.max(1);

        'pages: while report.scanned < u64::from(request.max_messages) {
            let remaining = u64::from(request.max_messages) - report.scanned;
            let limit = page_size.min(remaining.min(u64::from(u32::MAX)) as u32);

            let page = match source.fetch_before(request.channel, cursor, limit) {
                Ok(page) => page,
                Err(err) => {
                    warn!(
                        "event=history_scan module=service status=error channel={} scanned={} error={err}",
                        request.channel, report.scanned
                    );
                    return Ok(report);
                }
            };
            if page.is_empty() {
                report.complete = true;
                break;
            }
            let exhausted = (page.len() as u32) < limit;

            for message in &page {
                if report.scanned >= u64::from(request.max_messages) {
                    break 'pages;
                }
                if cancel.load(Ordering::Relaxed) {
                    info!(
                        "event=history_scan module=service status=cancelled channel={} scanned={}",
                        request.channel, report.scanned
                    );
                    break 'pages;
                }

                report.scanned += 1;
                cursor = Some(message.message);

                if message.author != request.author {
                    continue;
                }
                let links = extract_links(&message.text, &message.embeds, &self.pattern);
                report.matched += links.len() as u64;
                match self.ingest(
                    message.community,
                    message.author,
                    message.channel,
                    message.message,
                    &links,
                ) {
                    Ok(inserted) => report.inserted += u64::from(inserted),
                    // Best-effort backfill: the remaining iteration must
                    // not abort on one message's storage failure.
                    Err(err) => warn!(
                        "event=history_ingest module=service status=error message={} error={err}",
                        message.message
                    ),
                }
            }

            if exhausted {
                report.complete = true;
                break;
            }
        }

        if report.scanned >= u64::from(request.max_messages) {
            report.complete = true;
        }

        info!(
            "event=history_scan module=service status=ok channel={} scanned={} matched={} inserted={} complete={}",
            request.channel, report.scanned, report.matched, report.inserted, report.complete
        );
        Ok(report)
    }

    /// Returns the newest captured links for the community.
    pub fn recent_links(
        &self,
        community: CommunityId,
        limit: u32,
    ) -> Result<Vec<LinkCapture>, CaptureError> {
        Ok(self.repo.recent_links(community, limit)?)
    }

    /// Returns the newest captured links owned by one account.
    pub fn links_for_owner(
        &self,
        community: CommunityId,
        owner: AccountId,
        limit: u32,
    ) -> Result<Vec<LinkCapture>, CaptureError> {
        Ok(self.repo.links_for_owner(community, owner, limit)?)
    }

    /// Stores a reminder note, truncating over-length text on a char
    /// boundary.
    pub fn add_reminder(
        &self,
        community: CommunityId,
        author: AccountId,
        channel: ChannelId,
        message: MessageId,
        mentions: impl Into<String>,
        note: impl Into<String>,
    ) -> Result<i64, CaptureError> {
        let mut note = note.into();
        let cap = self.config.capture.reminder_max_chars;
        if note.chars().count() > cap {
            note = note.chars().take(cap).collect();
        }

        let id = self.repo.add_reminder(&ReminderNote {
            id: 0,
            community,
            author,
            channel,
            message,
            mentions: mentions.into(),
            note,
            ts: Utc::now().timestamp_millis(),
        })?;
        Ok(id)
    }

    /// Returns the newest reminder notes.
    pub fn list_reminders(
        &self,
        community: CommunityId,
        limit: u32,
    ) -> Result<Vec<ReminderNote>, CaptureError> {
        Ok(self.repo.list_reminders(community, limit)?)
    }

    /// Deletes one reminder: authors remove their own, admins remove any.
    ///
    /// Returns false when nothing matched.
    pub fn delete_reminder(
        &self,
        community: CommunityId,
        id: i64,
        requesting_actor: AccountId,
    ) -> Result<bool, CaptureError> {
        let author = if self.config.ledger.is_admin(requesting_actor) {
            None
        } else {
            Some(requesting_actor)
        };
        Ok(self.repo.delete_reminder(community, id, author)?)
    }

    /// Deletes every reminder in the community. Admin-only.
    pub fn purge_reminders(
        &self,
        community: CommunityId,
        requesting_actor: AccountId,
    ) -> Result<u64, CaptureError> {
        if !self.config.ledger.is_admin(requesting_actor) {
            return Err(CaptureError::NotAuthorized);
        }
        Ok(self.repo.purge_reminders(community)?)
    }
}
