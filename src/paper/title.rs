//! Title comparison used to validate resolved seeds

/// Largest edit distance at which a resolved title still counts as the
/// requested one
pub const DEFAULT_MAX_TITLE_DISTANCE: usize = 10;

/// Computes the Levenshtein distance between two titles, by character
///
/// The comparison is case sensitive; callers normalize if they want otherwise.
pub fn title_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let n = b_chars.len();

    // Two DP rows: distances between `a[..i]` and `b[..j]`.
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for j in 1..=n {
            let cost = if ca == b_chars[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Returns true if `found` is within `max_distance` edits of `requested`
pub fn titles_match(requested: &str, found: &str, max_distance: usize) -> bool {
    title_distance(requested, found) <= max_distance
}
