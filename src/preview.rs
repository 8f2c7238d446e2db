//! Length-bounded previews of long text fields.

/// Preview length on narrow viewports, in characters
pub const NARROW_PREVIEW_CHARS: usize = 40;
/// Preview length on wide viewports, in characters
pub const WIDE_PREVIEW_CHARS: usize = 60;
/// Appended to truncated previews
pub const ELLIPSIS: &str = "...";
/// Viewports narrower than this many pixels are narrow
pub const NARROW_VIEWPORT_WIDTH: u32 = 768;

/// Returns a preview of `text`: the first 40 (narrow) or 60 characters, followed by
/// [`ELLIPSIS`] only when something was cut.
///
/// Lengths are counted in characters, not bytes, so CJK text is cut on character
/// boundaries.
///
/// # Examples
///
/// ```
/// use digestboard::preview;
///
/// assert_eq!(preview("short", false), "short");
/// assert_eq!(preview(&"x".repeat(100), false).chars().count(), 63);
/// ```
pub fn preview(text: &str, is_narrow: bool) -> String {
    let limit = if is_narrow {
        NARROW_PREVIEW_CHARS
    } else {
        WIDE_PREVIEW_CHARS
    };

    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Whether a viewport of `width` pixels counts as narrow
pub fn is_narrow_viewport(width: u32) -> bool {
    width < NARROW_VIEWPORT_WIDTH
}
