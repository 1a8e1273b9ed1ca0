/// Sentence delimiter used to break the summary into bullets.
pub const BULLET_DELIMITER: &str = ". ";

/// Splits the whole summary into bullets.
///
/// This runs over the full buffer on every update, so the last bullet keeps
/// growing (and earlier ones may change) while text is still streaming in.
pub fn bullets(summary: &str) -> Vec<&str> {
    summary
        .split(BULLET_DELIMITER)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Markdown list rendering used by the terminal client.
pub fn render_bullets(summary: &str) -> String {
    let mut out = String::with_capacity(summary.len() + 16);
    for sentence in bullets(summary) {
        out.push_str("- ");
        out.push_str(sentence);
        out.push('\n');
    }
    out
}
