use chrono::{DateTime, Utc};

/// Connection parameters for one poll. The password is the already-decrypted
/// app password; the caller (the Fetcher) is the only place that touches the
/// cipher, per the credential-ciphertext invariant.
pub struct ImapAccount<'a> {
    pub host: &'a str,
    pub port: u16,
    pub username: &'a str,
    pub password: &'a str,
    /// Select INBOX read-write when any rule for this account might mark a
    /// message read; otherwise examine it read-only.
    pub read_write: bool,
}

/// One message as decoded off the wire, ready for `Store::insert_message_if_new`.
pub struct FetchedMessage {
    pub uid: u32,
    pub message_id: String,
    pub subject: String,
    pub sender: String,
    pub body_text: String,
    pub body_html: Option<String>,
    pub content_summary: String,
    pub received_at: DateTime<Utc>,
}

/// Length `content_summary` is truncated to.
pub const SUMMARY_MAX_CHARS: usize = 280;

#[must_use]
pub fn summarize(body_text: &str) -> String {
    truncate_chars(body_text.trim(), SUMMARY_MAX_CHARS)
}

#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push('\u{2026}');
    out
}
