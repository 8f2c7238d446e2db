//! Light markdown cleanup for paper titles, summaries, and notes.
//!
//! Only heading markers and inline links are removed; all other markdown is kept for
//! the renderer.

#[cfg(feature = "lite")]
use regex_lite::Regex;
#[cfg(all(feature = "regex", not(feature = "lite")))]
use regex::Regex;

#[cfg(not(any(feature = "regex", feature = "lite")))]
compile_error!("digestboard requires the \"regex\" or \"lite\" feature to be enabled");

use std::sync::LazyLock;

static HEADING_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#{1,6}\s+").unwrap());

static LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());

/// Removes heading markers (`## `) and unwraps links (`[text](url)` becomes `text`).
///
/// # Examples
///
/// ```
/// use digestboard::markdown::clean_markdown;
///
/// assert_eq!(clean_markdown("### Results: see [the paper](https://a.example)"), "Results: see the paper");
/// ```
pub fn clean_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let without_headings = HEADING_REGEX.replace_all(text, "");
    LINK_REGEX.replace_all(&without_headings, "$1").into_owned()
}
