use chrono::Utc;
use futures::TryStreamExt;
use mail_parser::MessageParser;

use crate::{
    error::{ImapError, Result},
    session::{COMMAND_TIMEOUT, ImapSession, connect_authenticated},
    types::{FetchedMessage, ImapAccount, summarize},
};

const DEFAULT_LOOKBACK_DAYS: i64 = 7;

/// Open a session, select INBOX, issue a bounded UID SEARCH, and fetch +
/// parse every matching message. Returns the decoded messages in ascending
/// UID order and the new watermark (the highest UID observed, or the
/// incoming watermark unchanged if nothing new arrived).
pub async fn fetch_new(
    account: &ImapAccount<'_>,
    watermark: Option<&str>,
) -> Result<(Vec<FetchedMessage>, Option<String>)> {
    let mut session = connect_authenticated(account).await?;
    select_inbox(&mut session, account.read_write).await?;

    let last_uid: Option<u32> = watermark.and_then(|w| w.parse().ok());
    let criteria = match last_uid {
        Some(uid) => format!("UID {}:*", uid.saturating_add(1)),
        None => format!("SINCE {}", imap_date(Utc::now() - chrono::Duration::days(DEFAULT_LOOKBACK_DAYS))),
    };

    let mut uids: Vec<u32> = with_timeout(session.uid_search(&criteria))
        .await?
        .into_iter()
        .filter(|uid| last_uid.is_none_or(|last| *uid > last))
        .collect();
    uids.sort_unstable();

    if uids.is_empty() {
        let _ = session.logout().await;
        return Ok((Vec::new(), watermark.map(str::to_string)));
    }

    let sequence = uids
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let mut stream = with_timeout(session.uid_fetch(&sequence, "(UID BODY.PEEK[] INTERNALDATE)")).await?;

    let mut messages = Vec::with_capacity(uids.len());
    let mut max_uid = last_uid.unwrap_or(0);
    while let Some(fetch) = stream.try_next().await.map_err(ImapError::Protocol)? {
        let Some(uid) = fetch.uid else {
            continue;
        };
        let message = parse_fetched(&fetch, uid, account.host)?;
        max_uid = max_uid.max(uid);
        messages.push(message);
    }
    drop(stream);

    let _ = session.logout().await;
    messages.sort_by_key(|m| m.uid);
    Ok((messages, Some(max_uid.to_string())))
}

/// `UID STORE +FLAGS (\Seen)` for one message. Requires a read-write
/// session; callers that only ever peek should not invoke this.
pub async fn mark_read(account: &ImapAccount<'_>, uid: u32) -> Result<()> {
    let mut session = connect_authenticated(account).await?;
    select_inbox(&mut session, true).await?;

    let sequence = uid.to_string();
    let mut stream = with_timeout(session.uid_store(&sequence, "+FLAGS (\\Seen)")).await?;
    while stream.try_next().await.map_err(ImapError::Protocol)?.is_some() {}
    drop(stream);

    let _ = session.logout().await;
    Ok(())
}

async fn select_inbox(session: &mut ImapSession, read_write: bool) -> Result<()> {
    if read_write {
        with_timeout(session.select("INBOX")).await?;
    } else {
        with_timeout(session.examine("INBOX")).await?;
    }
    Ok(())
}

async fn with_timeout<F, T>(fut: F) -> Result<T>
where
    F: std::future::Future<Output = std::result::Result<T, async_imap::error::Error>>,
{
    tokio::time::timeout(COMMAND_TIMEOUT, fut)
        .await
        .map_err(|_| ImapError::Timeout)?
        .map_err(ImapError::Protocol)
}

fn parse_fetched(
    fetch: &async_imap::types::Fetch,
    uid: u32,
    host: &str,
) -> Result<FetchedMessage> {
    let body = fetch.body().ok_or(ImapError::Mime { uid })?;
    let parsed = MessageParser::default()
        .parse(body)
        .ok_or(ImapError::Mime { uid })?;

    let subject = parsed.subject().unwrap_or("(no subject)").to_string();
    let sender = parsed
        .from()
        .and_then(|addrs| addrs.first())
        .map(|addr| addr.address().unwrap_or_default().to_string())
        .unwrap_or_default();
    let body_text = parsed
        .body_text(0)
        .map(|c| c.into_owned())
        .unwrap_or_default();
    let body_html = parsed.body_html(0).map(|c| c.into_owned());
    let message_id = parsed
        .message_id()
        .map(|id| format!("<{id}>"))
        .unwrap_or_else(|| format!("<{uid}@{host}>"));
    let received_at = fetch
        .internal_date()
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    let content_summary = summarize(&body_text);

    Ok(FetchedMessage {
        uid,
        message_id,
        subject,
        sender,
        body_text,
        body_html,
        content_summary,
        received_at,
    })
}

fn imap_date(dt: chrono::DateTime<Utc>) -> String {
    dt.format("%d-%b-%Y").to_string()
}
