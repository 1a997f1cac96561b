//! Filename derivation from paper titles

use regex::Regex;
use std::sync::OnceLock;

/// Maximum number of characters kept from a title slug
pub const MAX_SLUG_CHARS: usize = 50;

/// Extension of every persisted record
pub const FILE_EXTENSION: &str = "json";

static WORD_RUN: OnceLock<Regex> = OnceLock::new();

fn word_run() -> &'static Regex {
    WORD_RUN.get_or_init(|| Regex::new(r"\w+").expect("static pattern is valid"))
}

/// Converts a title into its filename stem
///
/// Word-character runs are joined by `_`, lowercased, and truncated to
/// [`MAX_SLUG_CHARS`] characters. Titles with no word characters produce an
/// empty slug.
///
/// # Examples
///
/// ```
/// use cite_ripple::paper::slugify_title;
///
/// assert_eq!(
///     slugify_title("Attention Is All You Need: Transformer Models!!"),
///     "attention_is_all_you_need_transformer_models"
/// );
/// ```
pub fn slugify_title(title: &str) -> String {
    let joined = word_run()
        .find_iter(title)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();

    joined.chars().take(MAX_SLUG_CHARS).collect()
}

/// Returns the output filename for a title, or `None` if the slug is empty
pub fn file_name_for(title: &str) -> Option<String> {
    let slug = slugify_title(title);
    if slug.is_empty() {
        None
    } else {
        Some(format!("{}.{}", slug, FILE_EXTENSION))
    }
}
