//! Field rules for post creation.
//!
//! Every function takes raw caller input and returns the normalized value
//! that is allowed into a `PostDraft`.

use crate::error::ValidationError;
use url::Url;

pub const USERNAME_MIN_CHARS: usize = 2;
pub const USERNAME_MAX_CHARS: usize = 30;
pub const CAPTION_MIN_CHARS: usize = 1;
pub const CAPTION_MAX_CHARS: usize = 500;

/// Trims and checks a username: 2–30 chars of `[A-Za-z0-9_]`.
pub fn username(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
        return Err(ValidationError::UsernameLength);
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::UsernameCharset);
    }
    Ok(trimmed.to_string())
}

/// Trims, length-checks and HTML-escapes a caption.
///
/// The length limit applies to what the user typed, not to the escaped form.
/// Besides `& < > " ' /`, backslash and backtick are escaped too.
pub fn caption(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if !(CAPTION_MIN_CHARS..=CAPTION_MAX_CHARS).contains(&len) {
        return Err(ValidationError::CaptionLength);
    }
    let escaped = html_escape::encode_safe(trimmed);
    if !escaped.contains(['\\', '`']) {
        return Ok(escaped.into_owned());
    }
    // encode_safe never emits either character, so a plain pass is enough.
    Ok(escaped.replace('\\', "&#x5C;").replace('`', "&#96;"))
}

/// Accepts only absolute `http`/`https` URLs with a host.
pub fn image_url(raw: &str) -> Result<String, ValidationError> {
    let url = Url::parse(raw.trim()).map_err(|_| ValidationError::ImageUrl)?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url.into()),
        _ => Err(ValidationError::ImageUrl),
    }
}
