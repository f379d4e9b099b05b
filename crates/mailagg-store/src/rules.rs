use crate::{
    Store,
    error::{Result, StoreError},
    types::{NewRule, Rule, RulePatch},
};

#[derive(sqlx::FromRow)]
struct RuleRow {
    id: i64,
    name: String,
    rule_order: i64,
    account_id: Option<i64>,
    sender_pattern: String,
    subject_pattern: String,
    body_pattern: String,
    add_labels: String,
    push_telegram: bool,
    mark_read: bool,
}

impl TryFrom<RuleRow> for Rule {
    type Error = StoreError;

    fn try_from(r: RuleRow) -> Result<Self> {
        Ok(Self {
            id: r.id,
            name: r.name,
            rule_order: r.rule_order,
            account_id: r.account_id,
            sender_pattern: r.sender_pattern,
            subject_pattern: r.subject_pattern,
            body_pattern: r.body_pattern,
            add_labels: serde_json::from_str(&r.add_labels)?,
            push_telegram: r.push_telegram,
            mark_read: r.mark_read,
        })
    }
}

const RULE_COLUMNS: &str = "id, name, rule_order, account_id, sender_pattern, subject_pattern, \
    body_pattern, add_labels, push_telegram, mark_read";

impl Store {
    pub async fn create_rule(&self, spec: NewRule) -> Result<Rule> {
        let labels_json = serde_json::to_string(&spec.add_labels)?;
        let row = sqlx::query_as::<_, RuleRow>(&format!(
            "INSERT INTO rules (name, rule_order, account_id, sender_pattern, subject_pattern, \
             body_pattern, add_labels, push_telegram, mark_read) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {RULE_COLUMNS}"
        ))
        .bind(&spec.name)
        .bind(spec.rule_order)
        .bind(spec.account_id)
        .bind(&spec.sender_pattern)
        .bind(&spec.subject_pattern)
        .bind(&spec.body_pattern)
        .bind(&labels_json)
        .bind(spec.push_telegram)
        .bind(spec.mark_read)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    pub async fn get_rule(&self, id: i64) -> Result<Rule> {
        let row = sqlx::query_as::<_, RuleRow>(&format!(
            "SELECT {RULE_COLUMNS} FROM rules WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("rule {id}")))?;
        row.try_into()
    }

    /// Both account-scoped and global rules, sorted `(rule_order ASC, id ASC)`
    /// as the rule engine's evaluation order requires.
    pub async fn list_rules(&self, account_id: i64) -> Result<Vec<Rule>> {
        let rows = sqlx::query_as::<_, RuleRow>(&format!(
            "SELECT {RULE_COLUMNS} FROM rules WHERE account_id = ? OR account_id IS NULL \
             ORDER BY rule_order ASC, id ASC"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Every rule, for the API's rule-management list.
    pub async fn list_all_rules(&self) -> Result<Vec<Rule>> {
        let rows = sqlx::query_as::<_, RuleRow>(&format!(
            "SELECT {RULE_COLUMNS} FROM rules ORDER BY rule_order ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn update_rule(&self, id: i64, patch: RulePatch) -> Result<Rule> {
        let current = self.get_rule(id).await?;

        let name = patch.name.unwrap_or(current.name);
        let rule_order = patch.rule_order.unwrap_or(current.rule_order);
        let account_id = patch.account_id.unwrap_or(current.account_id);
        let sender_pattern = patch.sender_pattern.unwrap_or(current.sender_pattern);
        let subject_pattern = patch.subject_pattern.unwrap_or(current.subject_pattern);
        let body_pattern = patch.body_pattern.unwrap_or(current.body_pattern);
        let add_labels = patch.add_labels.unwrap_or(current.add_labels);
        let push_telegram = patch.push_telegram.unwrap_or(current.push_telegram);
        let mark_read = patch.mark_read.unwrap_or(current.mark_read);
        let labels_json = serde_json::to_string(&add_labels)?;

        let row = sqlx::query_as::<_, RuleRow>(&format!(
            "UPDATE rules SET name = ?, rule_order = ?, account_id = ?, sender_pattern = ?, \
             subject_pattern = ?, body_pattern = ?, add_labels = ?, push_telegram = ?, \
             mark_read = ? WHERE id = ? RETURNING {RULE_COLUMNS}"
        ))
        .bind(&name)
        .bind(rule_order)
        .bind(account_id)
        .bind(&sender_pattern)
        .bind(&subject_pattern)
        .bind(&body_pattern)
        .bind(&labels_json)
        .bind(push_telegram)
        .bind(mark_read)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    pub async fn delete_rule(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM rules WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("rule {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global_rule(order: i64) -> NewRule {
        NewRule {
            name: format!("rule-{order}"),
            rule_order: order,
            account_id: None,
            sender_pattern: String::new(),
            subject_pattern: String::new(),
            body_pattern: String::new(),
            add_labels: vec![],
            push_telegram: false,
            mark_read: false,
        }
    }

    #[tokio::test]
    async fn list_rules_orders_by_rule_order_then_id() {
        let store = Store::in_memory().await.unwrap();
        store.create_rule(global_rule(1)).await.unwrap();
        store.create_rule(global_rule(0)).await.unwrap();
        store.create_rule(global_rule(0)).await.unwrap();

        let rules = store.list_rules(1).await.unwrap();
        assert_eq!(rules[0].rule_order, 0);
        assert_eq!(rules[1].rule_order, 0);
        assert!(rules[0].id < rules[1].id);
        assert_eq!(rules[2].rule_order, 1);
    }

    #[tokio::test]
    async fn account_scoped_rule_excluded_for_other_accounts() {
        let store = Store::in_memory().await.unwrap();
        let mut scoped = global_rule(0);
        scoped.account_id = Some(42);
        store.create_rule(scoped).await.unwrap();

        let rules_for_42 = store.list_rules(42).await.unwrap();
        assert_eq!(rules_for_42.len(), 1);

        let rules_for_other = store.list_rules(7).await.unwrap();
        assert!(rules_for_other.is_empty());
    }
}
