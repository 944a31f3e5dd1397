//! Heading identifiers.

/// Derive an anchor identifier from heading text.
///
/// The text is lower-cased, ASCII letters and digits are copied through,
/// every literal space becomes `-` and everything else is dropped. Runs of
/// hyphens are not collapsed and leading/trailing hyphens are kept, so the
/// result maps one-to-one onto the spaces in the source text.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c)
            } else if c == ' ' {
                Some('-')
            } else {
                None
            }
        })
        .collect()
}
