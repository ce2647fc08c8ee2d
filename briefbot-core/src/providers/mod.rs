//! Summarization provider implementations.
//!
//! Holds the prompt construction and bullet extraction shared by every
//! hosted model, plus the Google Gemini implementation of [`Summarizer`].
//!
//! [`Summarizer`]: crate::adapters::Summarizer

pub mod gemini;

pub use gemini::GeminiSummarizer;

/// Build the summarization prompt for a topic and its search snippets.
pub fn build_summary_prompt(topic: &str, snippets: &[String]) -> String {
    let mut prompt = format!(
        "Summarize the following search results about \"{topic}\" in concise key bullet points.\n\
         Write one bullet per line, each starting with \"- \". Do not add a title or closing remarks.\n\n"
    );
    for (i, snippet) in snippets.iter().enumerate() {
        prompt.push_str(&format!("Result {}:\n{}\n\n", i + 1, snippet.trim()));
    }
    prompt.push_str("Bullet points:");
    prompt
}

/// Extract bullet strings from a model reply.
///
/// Lines marked with `-`, `*`, `•` or a `N.` / `N)` enumerator are bullets.
/// When no line is marked, every non-empty line is taken as a bullet.
/// Markdown bold markers are stripped.
pub fn parse_bullets(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let marked: Vec<String> = lines
        .iter()
        .filter_map(|line| strip_marker(line))
        .map(clean_bullet)
        .filter(|b| !b.is_empty())
        .collect();

    if !marked.is_empty() {
        return marked;
    }

    lines
        .into_iter()
        .map(clean_bullet)
        .filter(|b| !b.is_empty())
        .collect()
}

fn strip_marker(line: &str) -> Option<&str> {
    for marker in ["- ", "* ", "• ", "•"] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest);
        }
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return Some(rest);
        }
    }
    None
}

fn clean_bullet(text: &str) -> String {
    text.replace("**", "").trim().to_string()
}
