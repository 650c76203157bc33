//! Fixed rewrite rules for the two note fields that carry markup.
//!
//! These are literal substring replacements for the exact markup the
//! sentence-mining note type produces, not general HTML handling. Anything that
//! is not one of these literals passes through untouched.

/// Blue highlight the card editor puts around the mined word.
pub const HIGHLIGHT_OPEN: &str = "<font color=\"#0000ff\">";
pub const HIGHLIGHT_CLOSE: &str = "</font>";
pub const EMPHASIS_MARKER: &str = "**";

pub const IMAGE_OPEN: &str = "<img src=\"";
pub const IMAGE_CLOSE: &str = "\">";

pub trait NormalizeField {
    /// Turns every highlight open and close tag into a `**` marker.
    fn emphasis_markers(&self) -> String;

    /// Drops every `<img src="` and `">`, leaving the bare file name.
    fn image_source(&self) -> String;
}

impl NormalizeField for str {
    fn emphasis_markers(&self) -> String {
        self.replace(HIGHLIGHT_OPEN, EMPHASIS_MARKER).replace(HIGHLIGHT_CLOSE, EMPHASIS_MARKER)
    }

    fn image_source(&self) -> String {
        self.replace(IMAGE_OPEN, "").replace(IMAGE_CLOSE, "")
    }
}

impl NormalizeField for String {
    fn emphasis_markers(&self) -> String {
        self.as_str().emphasis_markers()
    }

    fn image_source(&self) -> String {
        self.as_str().image_source()
    }
}
