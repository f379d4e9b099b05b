use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{operation} failed with status {status}")]
    Terminal {
        operation: &'static str,
        status: u16,
    },

    #[error("{operation} rate-limited/unavailable past retry budget (last status {status})")]
    RetriesExhausted {
        operation: &'static str,
        status: u16,
    },
}

impl DeliveryError {
    #[must_use]
    pub fn kind(&self) -> mailagg_common::ErrorKind {
        match self {
            Self::Transport(_) | Self::RetriesExhausted { .. } => {
                mailagg_common::ErrorKind::Transient
            },
            Self::Terminal { .. } => mailagg_common::ErrorKind::Invalid,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeliveryError>;
