//! Shared utility functions.

/// Truncates a string to at most `max_chars` characters, ending with an ellipsis when cut.
pub fn truncate_string(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let kept: String = input.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Splits off the first whitespace-delimited token, returning it and the trimmed remainder.
pub fn split_first_token(input: &str) -> Option<(&str, &str)> {
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.find(char::is_whitespace) {
        Some(idx) => Some((&trimmed[..idx], trimmed[idx..].trim())),
        None => Some((trimmed, "")),
    }
}
