use std::time::Duration;

use tokio::net::TcpStream;
use tokio_native_tls::{TlsConnector, native_tls};
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

use crate::{
    error::{ImapError, Result},
    types::ImapAccount,
};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

pub type ImapStream = Compat<tokio_native_tls::TlsStream<TcpStream>>;
pub type ImapSession = async_imap::Session<ImapStream>;

/// Open a TLS connection to `account.host:account.port` and authenticate.
/// Wrapped in an explicit connect timeout since `async-imap` itself has none.
pub async fn connect_authenticated(account: &ImapAccount<'_>) -> Result<ImapSession> {
    let addr = (account.host, account.port);
    let tcp = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
        .await
        .map_err(|_| ImapError::Timeout)?
        .map_err(|e| ImapError::Connection(e.to_string()))?;

    let tls = native_tls::TlsConnector::new().map_err(|e| ImapError::Tls(e.to_string()))?;
    let connector = TlsConnector::from(tls);
    let tls_stream = tokio::time::timeout(CONNECT_TIMEOUT, connector.connect(account.host, tcp))
        .await
        .map_err(|_| ImapError::Timeout)?
        .map_err(|e| ImapError::Tls(e.to_string()))?;

    let client = async_imap::Client::new(tls_stream.compat());
    let session = tokio::time::timeout(
        COMMAND_TIMEOUT,
        client.login(account.username, account.password),
    )
    .await
    .map_err(|_| ImapError::Timeout)?
    .map_err(|(err, _client)| ImapError::Auth(err.to_string()))?;

    Ok(session)
}
