//! Scheduler/Fetcher error type (components C4, C5).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Store(#[from] mailagg_store::StoreError),

    #[error(transparent)]
    Imap(#[from] mailagg_imap::ImapError),

    #[error(transparent)]
    Vault(#[from] mailagg_vault::VaultError),

    #[error("account {0} not found")]
    UnknownAccount(i64),
}

impl SchedulerError {
    #[must_use]
    pub fn kind(&self) -> mailagg_common::ErrorKind {
        match self {
            Self::Store(e) => e.kind(),
            Self::Imap(e) => e.kind(),
            Self::Vault(e) => e.kind(),
            Self::UnknownAccount(_) => mailagg_common::ErrorKind::NotFound,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
