/// Splits free-form user text into normalized ticker symbols.
///
/// Pieces are comma-separated, trimmed, and uppercased; empty pieces are
/// dropped. Repeated symbols are kept in input order. An empty return
/// value is the caller's cue to treat the input as invalid.
pub fn parse_symbols(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
