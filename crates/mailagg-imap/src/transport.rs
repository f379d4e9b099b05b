//! Trait seam over the IMAP operations the Fetcher needs, so
//! `mailagg-scheduler` can drive the pipeline against a fake transport in
//! tests without opening a real TCP connection.

use crate::{
    client,
    error::Result,
    types::{FetchedMessage, ImapAccount},
};

/// Everything the Fetcher needs from an IMAP server for one account.
#[async_trait::async_trait]
pub trait ImapTransport: Send + Sync {
    async fn fetch_new(
        &self,
        account: &ImapAccount<'_>,
        watermark: Option<&str>,
    ) -> Result<(Vec<FetchedMessage>, Option<String>)>;

    async fn mark_read(&self, account: &ImapAccount<'_>, uid: u32) -> Result<()>;
}

/// The real implementation: opens a TLS connection, logs in, and runs the
/// requested operation per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealImapTransport;

#[async_trait::async_trait]
impl ImapTransport for RealImapTransport {
    async fn fetch_new(
        &self,
        account: &ImapAccount<'_>,
        watermark: Option<&str>,
    ) -> Result<(Vec<FetchedMessage>, Option<String>)> {
        client::fetch_new(account, watermark).await
    }

    async fn mark_read(&self, account: &ImapAccount<'_>, uid: u32) -> Result<()> {
        client::mark_read(account, uid).await
    }
}
