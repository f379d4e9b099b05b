//! `/rules/*` — CRUD for the classification rule set evaluated by the rule
//! engine on every new message.

use axum::{
    Json,
    extract::{Path, State},
};

use mailagg_store::{NewRule, Rule, RulePatch};

use crate::{
    dto::{RuleCreateRequest, RulePatchRequest},
    error::Result,
    state::AppState,
};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Rule>>> {
    let rules = state.store.list_all_rules().await?;
    Ok(Json(rules))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<RuleCreateRequest>,
) -> Result<Json<Rule>> {
    let rule = state
        .store
        .create_rule(NewRule {
            name: body.name,
            rule_order: body.rule_order,
            account_id: body.account_id,
            sender_pattern: body.sender_pattern,
            subject_pattern: body.subject_pattern,
            body_pattern: body.body_pattern,
            add_labels: body.add_labels,
            push_telegram: body.push_telegram,
            mark_read: body.mark_read,
        })
        .await?;
    Ok(Json(rule))
}

pub async fn patch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<RulePatchRequest>,
) -> Result<Json<Rule>> {
    let rule = state
        .store
        .update_rule(
            id,
            RulePatch {
                name: body.name,
                rule_order: body.rule_order,
                account_id: body.account_id,
                sender_pattern: body.sender_pattern,
                subject_pattern: body.subject_pattern,
                body_pattern: body.body_pattern,
                add_labels: body.add_labels,
                push_telegram: body.push_telegram,
                mark_read: body.mark_read,
            },
        )
        .await?;
    Ok(Json(rule))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    state.store.delete_rule(id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
