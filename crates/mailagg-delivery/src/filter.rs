use mailagg_store::{Message, PushFilter, PushFilterField, PushFilterMode};

/// Allow-then-deny evaluation over a message for one account's push filters,
/// already sorted `rule_order ASC, id ASC`. If any `allow` filter exists for
/// the account, the message must match at least one to proceed; a matching
/// `deny` filter then drops it regardless.
#[must_use]
pub fn passes(filters: &[PushFilter], message: &Message) -> bool {
    let allow_filters: Vec<&PushFilter> = filters
        .iter()
        .filter(|f| f.mode == PushFilterMode::Allow)
        .collect();
    if !allow_filters.is_empty() && !allow_filters.iter().any(|f| field_matches(f, message)) {
        return false;
    }

    let deny_matches = filters
        .iter()
        .filter(|f| f.mode == PushFilterMode::Deny)
        .any(|f| field_matches(f, message));

    !deny_matches
}

fn field_matches(filter: &PushFilter, message: &Message) -> bool {
    let haystack = match filter.field {
        PushFilterField::Sender => message.sender.clone(),
        PushFilterField::Domain => domain_of(&message.sender),
        PushFilterField::Subject => message.subject.clone(),
        PushFilterField::Body => message.body_text.clone(),
    };
    haystack
        .to_lowercase()
        .contains(&filter.value.to_lowercase())
}

#[must_use]
pub fn domain_of(sender: &str) -> String {
    sender
        .rsplit_once('@')
        .map_or_else(String::new, |(_, domain)| domain.to_string())
}
