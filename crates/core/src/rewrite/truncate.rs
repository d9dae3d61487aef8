//! Input budget truncation.

/// Rough characters-per-token ratio for English text.
pub const CHARS_PER_TOKEN: usize = 4;

/// A boundary cut is only taken when it keeps more than this many characters.
pub const MIN_BOUNDARY_CHARS: usize = 1000;

/// Marker appended after a hard cut.
pub const ELLIPSIS: char = '…';

/// Character budget equivalent to `budget_tokens`.
pub fn char_budget(budget_tokens: u32) -> usize {
    (budget_tokens as usize).saturating_mul(CHARS_PER_TOKEN).max(1)
}

/// Truncates `text` to roughly `budget_tokens` tokens.
///
/// Text within budget is returned unchanged. Otherwise the text is cut to the
/// character budget, then back to the last newline or period inside that slice
/// when the cut keeps more than [`MIN_BOUNDARY_CHARS`] characters. Failing
/// that, the slice is hard-cut and [`ELLIPSIS`] is appended.
pub fn truncate_to_token_budget(text: &str, budget_tokens: u32) -> String {
    let budget = char_budget(budget_tokens);

    let Some((slice_end, _)) = text.char_indices().nth(budget) else {
        return text.to_string();
    };
    let slice = &text[..slice_end];

    let last_break = match (slice.rfind('\n'), slice.rfind('.')) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };

    if let Some(idx) = last_break
        && slice[..idx].chars().count() > MIN_BOUNDARY_CHARS
    {
        return slice[..=idx].trim_end().to_string();
    }

    let mut truncated = slice.trim_end().to_string();
    truncated.push(ELLIPSIS);
    truncated
}
