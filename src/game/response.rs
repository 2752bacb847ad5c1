use crate::error::InvalidResponseReason;

/// Cleans a raw player response into a lookup-ready single word.
///
/// Trims, rejects blanks and multi-word answers, drops double quotes, and
/// requires at least one letter or digit. Words containing letters keep only
/// their ASCII letters (`"Star!"` becomes `star`); purely numeric answers
/// are kept as-is.
pub fn normalize_response(raw: &str) -> Result<String, InvalidResponseReason> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InvalidResponseReason::Empty);
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(InvalidResponseReason::MultipleWords);
    }

    let unquoted: String = trimmed.chars().filter(|c| *c != '"').collect();
    if !unquoted.chars().any(char::is_alphanumeric) {
        return Err(InvalidResponseReason::NoAlphanumeric);
    }

    let word: String = if unquoted.chars().any(char::is_alphabetic) {
        unquoted.chars().filter(char::is_ascii_alphabetic).collect()
    } else {
        unquoted
    };
    if word.is_empty() {
        return Err(InvalidResponseReason::NoAlphanumeric);
    }

    Ok(word.to_lowercase())
}
