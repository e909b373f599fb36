//! Pure link extraction from message text and embed metadata.
//!
//! # Responsibility
//! - Find platform links in free text and structured embed fields.
//! - Return an ordered, de-duplicated match sequence suitable for direct
//!   unit testing without a live event.
//!
//! # Invariants
//! - Match order follows order of appearance: message text first, then
//!   each embed's url/title/description in that fixed order.
//! - Host filtering accepts configured hosts and their subdomains.

use crate::model::gateway::MessageEmbed;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://[^\s<>()\[\]]+").expect("valid url regex"));

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"'];

/// Host allow-list compiled from configuration.
#[derive(Debug, Clone)]
pub struct LinkPattern {
    hosts: Vec<String>,
}

impl LinkPattern {
    /// Builds a pattern from host names; matching is case-insensitive and
    /// includes subdomains.
    pub fn new(hosts: impl IntoIterator<Item = String>) -> Self {
        let hosts = hosts
            .into_iter()
            .map(|host| host.trim().trim_start_matches("www.").to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect();
        Self { hosts }
    }

    /// Returns whether the URL's host is on the allow-list.
    pub fn matches(&self, url: &str) -> bool {
        let Some(host) = host_of(url) else {
            return false;
        };
        self.hosts
            .iter()
            .any(|allowed| host == *allowed || host.ends_with(&format!(".{allowed}")))
    }
}

/// Extracts platform links from text and embeds, ordered and de-duplicated.
pub fn extract_links(
    text: &str,
    embeds: &[MessageEmbed],
    pattern: &LinkPattern,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let mut scan = |segment: &str| {
        for found in URL_RE.find_iter(segment) {
            let url = found.as_str().trim_end_matches(TRAILING_PUNCTUATION);
            if pattern.matches(url) && seen.insert(url.to_string()) {
                links.push(url.to_string());
            }
        }
    };

    scan(text);
    for embed in embeds {
        for field in [&embed.url, &embed.title, &embed.description] {
            if let Some(value) = field {
                scan(value);
            }
        }
    }

    links
}

fn host_of(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .or_else(|| {
            // Scheme matching above is exact-case; the regex is not.
            let lower = url.to_ascii_lowercase();
            if lower.starts_with("https://") {
                Some(&url[8..])
            } else if lower.starts_with("http://") {
                Some(&url[7..])
            } else {
                None
            }
        })?;

    let authority = rest.split(['/', '?', '#']).next()?;
    // Drop userinfo and port, keep the bare host.
    let host = authority.rsplit('@').next()?.split(':').next()?;
    if host.is_empty() {
        return None;
    }
    Some(
        host.trim_start_matches("www.")
            .trim_end_matches('.')
            .to_ascii_lowercase(),
    )
}
