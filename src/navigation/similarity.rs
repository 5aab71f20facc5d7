//! Text similarity used for duplicate suppression

/// Fraction of character positions at which `a` and `b` agree, relative to
/// the longer string
///
/// This is a cheap heuristic, not a metric: an insertion near the start of
/// either string shifts every later position and drives the score toward 0.
/// Two empty strings score 0, so empty text is never mistaken for a match.
pub fn positional_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    let aligned = a.chars().zip(b.chars()).filter(|(x, y)| x == y).count();
    aligned as f64 / longest as f64
}
