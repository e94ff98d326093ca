//! Outgoing mail jobs
//!
//! Mail is rendered by the service that triggers it and handed to the mail
//! worker through the job queue. The worker only delivers what it is given.

use serde::{Deserialize, Serialize};

/// Why a mail is being sent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MailKind {
    /// Account activation link sent after registration
    Activation,
    /// Password reset link
    PasswordReset,
}

/// A rendered mail waiting for delivery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutgoingMail {
    pub kind: MailKind,
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

/// Characters a mail header may be broken on, bare `\r` included
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

impl OutgoingMail {
    /// Build a mail, forcing the subject onto a single line so it cannot
    /// inject extra headers.
    pub fn new(
        kind: MailKind,
        to: impl Into<String>,
        from: impl Into<String>,
        subject: &str,
        body: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            to: to.into(),
            from: from.into(),
            subject: subject
                .split(is_line_break)
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_is_single_line() {
        let mail = OutgoingMail::new(
            MailKind::Activation,
            "alice@example.com",
            "noreply@localhost",
            "Activate\r\nBcc: victim@example.com",
            "body",
        );
        assert_eq!(mail.subject, "Activate Bcc: victim@example.com");
        assert!(!mail.subject.contains('\n'));
    }

    #[test]
    fn test_bare_carriage_return_is_a_line_break() {
        let mail = OutgoingMail::new(
            MailKind::PasswordReset,
            "alice@example.com",
            "noreply@localhost",
            "Reset\rBcc: victim@example.com\u{2028}X-Extra: 1",
            "body",
        );
        assert_eq!(mail.subject, "Reset Bcc: victim@example.com X-Extra: 1");
        assert!(!mail.subject.contains('\r'));
    }

    #[test]
    fn test_kind_serializes_as_snake_case() {
        let mail = OutgoingMail::new(MailKind::PasswordReset, "a@b.io", "c@d.io", "s", "b");
        let json = serde_json::to_value(&mail).unwrap();
        assert_eq!(json["kind"], "password_reset");
    }
}
