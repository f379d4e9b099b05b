//! Pure rule engine: no I/O, no clock reads, no randomness.
//!
//! Given the same ordered rule list and the same message, `evaluate` always
//! returns the same [`Decision`] — this is what makes the "reapply rules to
//! existing messages" maintenance operation safe: it must reproduce exactly
//! what live processing would have produced.

use mailagg_store::{Message, Rule};

/// Output of evaluating a message against a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub add_labels: Vec<String>,
    pub push_telegram: bool,
    pub mark_read: bool,
}

/// Evaluate `rules` (assumed already sorted `(rule_order ASC, id ASC)`,
/// the order [`mailagg_store::Store::list_rules`] guarantees) against
/// `message`. `telegram_push_enabled` seeds the initial `push_telegram`
/// value but is not itself a veto here — the Delivery layer re-checks the
/// account flag independently before sending.
#[must_use]
pub fn evaluate(message: &Message, rules: &[Rule], telegram_push_enabled: bool) -> Decision {
    let mut add_labels: Vec<String> = Vec::new();
    let mut push_telegram = telegram_push_enabled;
    let mut mark_read = false;

    for rule in rules {
        if !rule_applies_to_account(rule, message.account_id) {
            continue;
        }
        if !rule_matches(rule, message) {
            continue;
        }

        for label in &rule.add_labels {
            if !add_labels.contains(label) {
                add_labels.push(label.clone());
            }
        }
        push_telegram = rule.push_telegram;
        mark_read = mark_read || rule.mark_read;
    }

    Decision {
        add_labels,
        push_telegram,
        mark_read,
    }
}

fn rule_applies_to_account(rule: &Rule, account_id: i64) -> bool {
    rule.account_id.is_none_or(|id| id == account_id)
}

fn rule_matches(rule: &Rule, message: &Message) -> bool {
    substring_matches(&rule.sender_pattern, &message.sender)
        && substring_matches(&rule.subject_pattern, &message.subject)
        && substring_matches(&rule.body_pattern, &message.body_text)
}

/// Empty pattern always matches; otherwise a case-insensitive substring test.
fn substring_matches(pattern: &str, haystack: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&pattern.to_lowercase())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mailagg_store::Rule;

    use super::*;

    fn message(account_id: i64, sender: &str, subject: &str, body: &str) -> Message {
        Message {
            id: 1,
            account_id,
            message_id: "<1@x>".into(),
            subject: subject.into(),
            sender: sender.into(),
            body_text: body.into(),
            body_html: None,
            content_summary: body.into(),
            received_at: Utc::now(),
            is_read: false,
            labels: vec![],
        }
    }

    fn rule(order: i64, id: i64, account_id: Option<i64>) -> Rule {
        Rule {
            id,
            name: format!("rule-{order}-{id}"),
            rule_order: order,
            account_id,
            sender_pattern: String::new(),
            subject_pattern: String::new(),
            body_pattern: String::new(),
            add_labels: vec![],
            push_telegram: false,
            mark_read: false,
        }
    }

    #[test]
    fn empty_patterns_match_everything() {
        let msg = message(1, "a@x.com", "hello", "body");
        let rules = vec![rule(0, 1, None)];
        let decision = evaluate(&msg, &rules, true);
        assert!(decision.add_labels.is_empty());
        assert!(!decision.mark_read);
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let msg = message(1, "Boss@Example.com", "URGENT: deploy", "body");
        let mut r = rule(0, 1, None);
        r.sender_pattern = "boss@example.com".into();
        r.subject_pattern = "urgent".into();
        r.add_labels = vec!["priority".into()];
        let decision = evaluate(&msg, &[r], true);
        assert_eq!(decision.add_labels, vec!["priority".to_string()]);
    }

    #[test]
    fn account_scoped_rule_ignored_for_other_accounts() {
        let msg = message(7, "a@x.com", "hi", "body");
        let mut r = rule(0, 1, Some(42));
        r.add_labels = vec!["scoped".into()];
        let decision = evaluate(&msg, &[r], true);
        assert!(decision.add_labels.is_empty());
    }

    #[test]
    fn all_matching_rules_contribute_labels_in_order() {
        let msg = message(1, "a@x.com", "invoice due", "please pay");
        let mut r1 = rule(0, 1, None);
        r1.subject_pattern = "invoice".into();
        r1.add_labels = vec!["billing".into()];
        let mut r2 = rule(1, 2, None);
        r2.body_pattern = "pay".into();
        r2.add_labels = vec!["billing".into(), "action-needed".into()];

        let decision = evaluate(&msg, &[r1, r2], true);
        assert_eq!(
            decision.add_labels,
            vec!["billing".to_string(), "action-needed".to_string()]
        );
    }

    #[test]
    fn push_telegram_follows_last_writer_wins() {
        let msg = message(1, "a@x.com", "hello", "body");
        let mut r1 = rule(0, 1, None);
        r1.push_telegram = true;
        let mut r2 = rule(1, 2, None);
        r2.push_telegram = false;

        let decision = evaluate(&msg, &[r1, r2], true);
        assert!(!decision.push_telegram);

        let decision_reversed_priority = evaluate(&msg, &[r2.clone(), r1.clone()], true);
        // same input order as stored (rule_order ascending) must still be
        // respected by the caller; passing them out of order changes the
        // outcome, which is exactly the determinism the engine promises.
        assert!(decision_reversed_priority.push_telegram);
    }

    #[test]
    fn mark_read_is_sticky_once_any_matching_rule_sets_it() {
        let msg = message(1, "a@x.com", "hello", "body");
        let mut r1 = rule(0, 1, None);
        r1.mark_read = true;
        let r2 = rule(1, 2, None);

        let decision = evaluate(&msg, &[r1, r2], true);
        assert!(decision.mark_read);
    }

    #[test]
    fn no_matching_rules_preserves_account_push_flag() {
        let msg = message(1, "a@x.com", "hello", "body");
        let mut r = rule(0, 1, None);
        r.subject_pattern = "never matches this".into();
        assert!(!evaluate(&msg, &[r.clone()], false).push_telegram);
        assert!(evaluate(&msg, &[r], true).push_telegram);
    }

    #[test]
    fn reordering_equal_rule_order_by_id_is_the_only_tiebreak() {
        let msg = message(1, "a@x.com", "hello", "body");
        let mut a = rule(0, 1, None);
        a.push_telegram = true;
        let mut b = rule(0, 2, None);
        b.push_telegram = false;

        // Caller must supply rules already sorted (rule_order, id); given
        // that order the result is fixed regardless of which id came first
        // logically, since both share rule_order 0 and id breaks the tie.
        let decision = evaluate(&msg, &[a, b], true);
        assert!(!decision.push_telegram);
    }
}
