//! Inbound message classification.
//!
//! Splits chat text into bot commands and plain-text replies, and classifies
//! plain-text replies given while an email address is expected.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is a valid regex")
});

/// Replies that decline the email offer, compared after [`normalize_reply`].
pub const DECLINE_TOKENS: &[&str] = &["no", "n", "nope", "not now", "skip", "no thanks", "cancel"];

/// A classified inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` or `/help`.
    Start,
    /// `/research <topic>` (`inline_pdf = false`) or `/researchpdf <topic>`.
    ///
    /// The topic is whitespace-normalized and may be empty; the dispatcher
    /// rejects empty topics.
    Research { topic: String, inline_pdf: bool },
    /// A slash command the bot does not know.
    Unknown { command: String },
    /// Anything that is not a command.
    Text(String),
}

impl Command {
    /// Parse raw message text.
    ///
    /// Commands are case-sensitive. A `@BotName` suffix on the command token
    /// (as sent by Telegram group chats) is ignored.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if !trimmed.starts_with('/') {
            return Self::Text(trimmed.to_string());
        }

        let (token, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((token, rest)) => (token, rest),
            None => (trimmed, ""),
        };
        let name = token.split('@').next().unwrap_or(token);
        let topic = rest.split_whitespace().collect::<Vec<_>>().join(" ");

        match name {
            "/start" | "/help" => Self::Start,
            "/research" => Self::Research {
                topic,
                inline_pdf: false,
            },
            "/researchpdf" => Self::Research {
                topic,
                inline_pdf: true,
            },
            other => Self::Unknown {
                command: other.to_string(),
            },
        }
    }

    /// Command name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Research {
                inline_pdf: false, ..
            } => "research",
            Self::Research {
                inline_pdf: true, ..
            } => "researchpdf",
            Self::Unknown { .. } => "unknown",
            Self::Text(_) => "text",
        }
    }
}

/// Interpretation of a plain-text reply while an email address is expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailReply {
    Address(String),
    Decline,
    Unrecognized,
}

impl EmailReply {
    pub fn classify(text: &str) -> Self {
        let candidate = text.trim();
        if is_valid_email(candidate) {
            return Self::Address(candidate.to_string());
        }
        if is_decline(candidate) {
            return Self::Decline;
        }
        Self::Unrecognized
    }
}

pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_PATTERN.is_match(candidate.trim())
}

pub fn is_decline(text: &str) -> bool {
    let normalized = normalize_reply(text);
    DECLINE_TOKENS.contains(&normalized.as_str())
}

/// Lowercase, collapse whitespace, and drop trailing `.`/`!`.
pub fn normalize_reply(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(|c: char| c == '.' || c == '!' || c.is_whitespace())
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_and_help() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse("/help"), Command::Start);
        assert_eq!(Command::parse("/start@BriefBot"), Command::Start);
    }

    #[test]
    fn test_parse_research_topic_is_rest_of_line() {
        assert_eq!(
            Command::parse("/research  quantum   computing "),
            Command::Research {
                topic: "quantum computing".into(),
                inline_pdf: false
            }
        );
        assert_eq!(
            Command::parse("/researchpdf@BriefBot rust async"),
            Command::Research {
                topic: "rust async".into(),
                inline_pdf: true
            }
        );
    }

    #[test]
    fn test_parse_research_without_topic() {
        assert_eq!(
            Command::parse("/research"),
            Command::Research {
                topic: String::new(),
                inline_pdf: false
            }
        );
        assert_eq!(
            Command::parse("/researchpdf   \t "),
            Command::Research {
                topic: String::new(),
                inline_pdf: true
            }
        );
    }

    #[test]
    fn test_commands_are_case_sensitive() {
        assert_eq!(
            Command::parse("/Research cats"),
            Command::Unknown {
                command: "/Research".into()
            }
        );
    }

    #[test]
    fn test_parse_plain_text() {
        assert_eq!(
            Command::parse("  someone@example.com "),
            Command::Text("someone@example.com".into())
        );
    }

    #[test]
    fn test_command_kind() {
        assert_eq!(Command::parse("/researchpdf x").kind(), "researchpdf");
        assert_eq!(Command::parse("hi").kind(), "text");
    }

    #[test]
    fn test_valid_emails() {
        for addr in [
            "example@gmail.com",
            "first.last+tag@sub.example.co.uk",
            "a_b%c-d@my-host.io",
        ] {
            assert!(is_valid_email(addr), "{addr} should be valid");
        }
    }

    #[test]
    fn test_invalid_emails() {
        for addr in [
            "",
            "plainaddress",
            "@example.com",
            "user@",
            "user@example",
            "user@example.c",
            "user name@example.com",
            "user@@example.com",
        ] {
            assert!(!is_valid_email(addr), "{addr} should be invalid");
        }
    }

    #[test]
    fn test_decline_tokens_case_insensitive() {
        for reply in ["no", "NO", "No.", "Not   now", "SKIP!", "nope", "n", "No thanks"] {
            assert!(is_decline(reply), "{reply} should decline");
        }
        assert!(!is_decline("not really sure"));
        assert!(!is_decline("yes"));
    }

    #[test]
    fn test_classify_email_reply() {
        assert_eq!(
            EmailReply::classify(" example@gmail.com "),
            EmailReply::Address("example@gmail.com".into())
        );
        assert_eq!(EmailReply::classify("Nope"), EmailReply::Decline);
        assert_eq!(EmailReply::classify("maybe later?"), EmailReply::Unrecognized);
    }
}
