//! IMAP client error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImapError {
    #[error("tcp connection failed: {0}")]
    Connection(String),

    #[error("tls handshake failed: {0}")]
    Tls(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("imap protocol error: {0}")]
    Protocol(#[from] async_imap::error::Error),

    #[error("message parsing failed for uid {uid}")]
    Mime { uid: u32 },

    #[error("operation timed out")]
    Timeout,
}

impl ImapError {
    /// `Auth` is fatal to the current poll but not to the account record
    /// itself (the account stays configured; the next poll retries).
    /// Everything transport-shaped is transient and backoff-worthy.
    #[must_use]
    pub fn kind(&self) -> mailagg_common::ErrorKind {
        match self {
            Self::Auth(_) => mailagg_common::ErrorKind::AuthFailure,
            Self::Connection(_) | Self::Tls(_) | Self::Protocol(_) | Self::Timeout => {
                mailagg_common::ErrorKind::Transient
            },
            Self::Mime { .. } => mailagg_common::ErrorKind::Invalid,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImapError>;
