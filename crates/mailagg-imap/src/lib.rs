//! IMAP client: stateless per-call session handling,
//! MIME decoding, and the exactly-one-TLS-connection-per-poll lifecycle.
//! See `session.rs` and `client.rs`.

pub mod client;
pub mod error;
pub mod session;
pub mod transport;
pub mod types;

pub use {
    client::{fetch_new, mark_read},
    error::{ImapError, Result},
    transport::{ImapTransport, RealImapTransport},
    types::{FetchedMessage, ImapAccount},
};

#[cfg(test)]
mod tests {
    use crate::types::{summarize, truncate_chars};

    #[test]
    fn summarize_passes_short_body_through() {
        assert_eq!(summarize("hello"), "hello");
    }

    #[test]
    fn truncate_chars_adds_ellipsis_when_over_limit() {
        let long = "a".repeat(10);
        let truncated = truncate_chars(&long, 5);
        assert_eq!(truncated.chars().count(), 6);
        assert!(truncated.ends_with('\u{2026}'));
    }

    #[test]
    fn truncate_chars_is_noop_at_exact_limit() {
        let exact = "abcde";
        assert_eq!(truncate_chars(exact, 5), "abcde");
    }
}
