//! Chat-facing text for summaries and the fixed bot replies.

use crate::types::Summary;

pub const GREETING: &str = "Hello! I'm Briefbot.\n\
Use /research <topic> to get a research summary.\n\
Use /researchpdf <topic> to get the summary as a PDF as well.\n\
After each summary I can email you the PDF report.";

pub const IDLE_HELP: &str =
    "Send /research <topic> for a summary, or /researchpdf <topic> to get a PDF too.";

pub const EMAIL_PROMPT: &str = "Would you like this report emailed to you? \
Reply with your email address, or \"no\" to skip.";

pub const EMAIL_REASK: &str =
    "I didn't catch that. Please reply with a valid email address, or \"no\" to skip.";

pub const EMAIL_DECLINED: &str = "No problem, I won't email the report.";

pub fn usage(command: &str) -> String {
    format!("Usage: {command} <topic>")
}

pub fn email_subject(topic: Option<&str>) -> String {
    match topic {
        Some(topic) if !topic.trim().is_empty() => format!("Research Summary: {}", topic.trim()),
        _ => "Research Summary".to_string(),
    }
}

pub fn email_confirmation(topic: &str, recipient: &str) -> String {
    format!("Done! The report on \"{topic}\" was sent to {recipient}.")
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse [`escape_html`].
pub fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

/// Render a summary as a Telegram HTML message: heading, bullets, then linked sources.
pub fn format_summary_html(summary: &Summary) -> String {
    let mut out = format!(
        "<b>Research Summary for:</b> {}\n\n",
        escape_html(&summary.topic)
    );
    for bullet in &summary.bullets {
        out.push_str("• ");
        out.push_str(&escape_html(bullet));
        out.push('\n');
    }

    if !summary.sources.is_empty() {
        out.push_str("\n<b>Sources</b>\n");
        for (i, source) in summary.sources.iter().enumerate() {
            let title = if source.title.trim().is_empty() {
                &source.url
            } else {
                &source.title
            };
            out.push_str(&format!(
                "{}. <a href=\"{}\">{}</a>\n",
                i + 1,
                escape_html(&source.url),
                escape_html(title)
            ));
        }
    }
    out
}
