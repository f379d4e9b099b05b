use mailagg_store::{Message, PushTemplate};

/// Bound on `full_email`'s body so a single push fits one Telegram message.
const FULL_EMAIL_BODY_MAX_CHARS: usize = 3500;
const SHORT_SUMMARY_MAX_CHARS: usize = 120;

#[must_use]
pub fn render(template: PushTemplate, account_email: &str, message: &Message) -> String {
    match template {
        PushTemplate::TitleOnly => title_only(message),
        PushTemplate::Short => short(message),
        PushTemplate::Full => full(account_email, message),
        PushTemplate::FullEmail => full_email(account_email, message),
    }
}

fn subject_or_placeholder(message: &Message) -> &str {
    if message.subject.is_empty() {
        "(no subject)"
    } else {
        &message.subject
    }
}

fn title_only(message: &Message) -> String {
    subject_or_placeholder(message).to_string()
}

fn short(message: &Message) -> String {
    format!(
        "From: {}\nSubject: {}\n\n{}",
        message.sender,
        subject_or_placeholder(message),
        truncate(&message.content_summary, SHORT_SUMMARY_MAX_CHARS),
    )
}

fn full(account_email: &str, message: &Message) -> String {
    format!(
        "Account: {}\nFrom: {}\nSubject: {}\nReceived: {}\n\n{}",
        account_email,
        message.sender,
        subject_or_placeholder(message),
        message.received_at.to_rfc3339(),
        message.content_summary,
    )
}

fn full_email(account_email: &str, message: &Message) -> String {
    format!(
        "Account: {}\nFrom: {}\nSubject: {}\nReceived: {}\n\n{}",
        account_email,
        message.sender,
        subject_or_placeholder(message),
        message.received_at.to_rfc3339(),
        truncate(&message.body_text, FULL_EMAIL_BODY_MAX_CHARS),
    )
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push('\u{2026}');
    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn message() -> Message {
        Message {
            id: 1,
            account_id: 1,
            message_id: "<1@x>".into(),
            subject: String::new(),
            sender: "a@x.com".into(),
            body_text: "x".repeat(4000),
            body_html: None,
            content_summary: "summary text".into(),
            received_at: Utc::now(),
            is_read: false,
            labels: vec![],
        }
    }

    #[test]
    fn title_only_uses_placeholder_for_empty_subject() {
        assert_eq!(render(PushTemplate::TitleOnly, "a@x.com", &message()), "(no subject)");
    }

    #[test]
    fn full_email_truncates_body() {
        let rendered = render(PushTemplate::FullEmail, "a@x.com", &message());
        assert!(rendered.ends_with('\u{2026}'));
    }

    #[test]
    fn short_includes_sender_and_summary() {
        let rendered = render(PushTemplate::Short, "a@x.com", &message());
        assert!(rendered.contains("a@x.com"));
        assert!(rendered.contains("summary text"));
    }
}
