//! `/emails/*` — the read-side browsing API plus two operator actions:
//! marking a message read and reclassifying messages against the current
//! rule set without waiting for new mail.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use mailagg_store::{Message, MessageFilter, Page};

use crate::{
    dto::{ApplyRulesRequest, ApplyRulesResponse, EmailListQuery, EmailListResponse},
    error::Result,
    state::AppState,
};

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<EmailListQuery>,
) -> Result<Json<EmailListResponse>> {
    let page = query.page;
    let page_size = query.page_size;
    let (items, total) = state
        .store
        .query_messages(
            MessageFilter {
                account_id: query.account_id,
                keyword: query.keyword,
                is_read: query.is_read,
                label: query.label,
                date_from: query.date_from,
                date_to: query.date_to,
            },
            Page { page, page_size },
        )
        .await?;

    Ok(Json(EmailListResponse {
        items,
        total,
        page,
        page_size,
    }))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Message>> {
    let message = state.store.get_message(id).await?;
    Ok(Json(message))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Message>> {
    let message = state.store.mark_read(id, true).await?;
    Ok(Json(message))
}

/// Clear and recompute labels for every message in scope, one page at a
/// time, reusing the same `mailagg_rules::evaluate` the live fetch path
/// calls. Does not redeliver notifications: this only reclassifies mail
/// already on disk.
pub async fn apply_rules(
    State(state): State<AppState>,
    Json(body): Json<ApplyRulesRequest>,
) -> Result<Json<ApplyRulesResponse>> {
    state.store.clear_labels(body.account_id).await?;

    let mut updated = 0i64;
    let mut total = 0i64;
    let mut page = 1i64;
    const PAGE_SIZE: i64 = 200;

    loop {
        let (items, page_total) = state
            .store
            .query_messages(
                MessageFilter {
                    account_id: body.account_id,
                    ..Default::default()
                },
                Page {
                    page,
                    page_size: PAGE_SIZE,
                },
            )
            .await?;
        total = page_total;
        if items.is_empty() {
            break;
        }

        for message in &items {
            let rules = state.store.list_rules(message.account_id).await?;
            let account = state.store.get_account(message.account_id).await?;
            let decision =
                mailagg_rules::evaluate(message, &rules, account.telegram_push_enabled);
            if !decision.add_labels.is_empty() || decision.mark_read {
                state
                    .store
                    .apply_rule_decision(message.id, &decision.add_labels, decision.mark_read)
                    .await?;
                updated += 1;
            }
        }

        if (page * PAGE_SIZE) >= total {
            break;
        }
        page += 1;
    }

    Ok(Json(ApplyRulesResponse { updated, total }))
}

pub async fn fetch_once(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let outcome = state.scheduler.fetch_now(account_id).await?;
    Ok(Json(serde_json::json!({ "outcome": format!("{outcome:?}") })))
}
