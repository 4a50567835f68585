//! Parsing of the recognition service's one-line answer.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::error::RecognitionError;
use super::types::CardFields;

/// Opening Markdown code fence with an optional language tag.
static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z]*\s*").expect("valid code fence pattern"));

/// Parse a semicolon separated record into [`CardFields`].
///
/// Models like to wrap answers in Markdown code fences and sometimes echo a
/// header line; both are tolerated. The first line that contains a separator
/// wins, otherwise the first non-empty line.
pub fn parse_record_line(text: &str) -> Result<CardFields, RecognitionError> {
    let mut body = text.trim();
    if let Some(m) = CODE_FENCE.find(body) {
        body = &body[m.end()..];
    }
    let body = body.trim_end().trim_end_matches("```").trim();

    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let line = lines
        .iter()
        .find(|l| l.contains(';'))
        .or_else(|| lines.first())
        .ok_or(RecognitionError::EmptyResult)?;

    let values = line.split(';').map(str::to_string).collect();
    Ok(CardFields::from_values(values))
}
