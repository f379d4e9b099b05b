//! `/accounts/*` — CRUD over IMAP accounts plus the status roll-up, wired to
//! `scheduler.activate`/`deactivate` so that a toggled `is_active` flag takes
//! effect without a restart.

use axum::{
    Json,
    extract::{Path, State},
};

use mailagg_store::{AccountPatch, NewAccount};

use crate::{
    dto::{AccountCreateRequest, AccountPatchRequest, AccountStatusEntry},
    error::Result,
    state::AppState,
};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<mailagg_store::Account>>> {
    let accounts = state.store.list_accounts(false).await?;
    Ok(Json(accounts))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<AccountCreateRequest>,
) -> Result<Json<mailagg_store::Account>> {
    let ciphertext = state.vault.encrypt(&body.password)?;

    let account = state
        .store
        .upsert_account(NewAccount {
            email: body.email,
            provider_tag: body.provider_tag,
            host: body.host,
            port: body.port,
            credential_ciphertext: ciphertext,
            sort_order: body.sort_order,
            poll_interval_seconds: body.poll_interval_seconds,
            telegram_push_enabled: body.telegram_push_enabled,
            push_template: body.push_template,
        })
        .await?;

    state.scheduler.activate(account.id).await;
    Ok(Json(account))
}

pub async fn patch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<AccountPatchRequest>,
) -> Result<Json<mailagg_store::Account>> {
    let credential_ciphertext = match body.password {
        Some(password) => Some(state.vault.encrypt(&password)?),
        None => None,
    };

    let account = state
        .store
        .update_account(
            id,
            AccountPatch {
                provider_tag: body.provider_tag,
                host: body.host,
                port: body.port,
                credential_ciphertext,
                is_active: body.is_active,
                sort_order: body.sort_order,
                poll_interval_seconds: body.poll_interval_seconds,
                telegram_push_enabled: body.telegram_push_enabled,
                push_template: body.push_template,
            },
        )
        .await?;

    if let Some(is_active) = body.is_active {
        if is_active {
            state.scheduler.activate(account.id).await;
        } else {
            state.scheduler.deactivate(account.id).await;
        }
    }

    Ok(Json(account))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    state.scheduler.deactivate(id).await;
    state.store.delete_account(id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// The status roll-up joins active/inactive bookkeeping from the account
/// row with the live poll state the scheduler has been recording.
pub async fn status(State(state): State<AppState>) -> Result<Json<Vec<AccountStatusEntry>>> {
    let accounts = state.store.list_accounts(false).await?;
    let statuses = state.store.list_poll_status().await?;

    let entries = accounts
        .into_iter()
        .map(|account| {
            let poll_status = statuses
                .iter()
                .find(|s| s.account_id == account.id)
                .cloned()
                .unwrap_or(mailagg_store::PollStatus {
                    account_id: account.id,
                    ..Default::default()
                });
            AccountStatusEntry {
                account_id: account.id,
                email: account.email,
                is_active: account.is_active,
                last_started_at: poll_status.last_started_at,
                last_finished_at: poll_status.last_finished_at,
                last_success_at: poll_status.last_success_at,
                last_error: poll_status.last_error,
            }
        })
        .collect();

    Ok(Json(entries))
}
