//! Slug normalization.
//!
//! Turns free-text titles into URL-safe slugs matching `[a-z0-9-]+`.
//! Accented Latin letters are folded to their ASCII base letter
//! ("Äänestys" becomes "aanestys"); every other run of non-alphanumeric
//! characters collapses into a single hyphen.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Maximum slug length accepted by [`validate_slug`](crate::validate_slug).
pub const MAX_SLUG_LEN: usize = 63;

/// Convert a title into a slug.
///
/// Returns an empty string when the title contains no convertible
/// characters (e.g. `"!!!"`). The result is never longer than
/// [`MAX_SLUG_LEN`] and never starts or ends with a hyphen, so
/// `slugify(&slugify(x)) == slugify(x)` for any input.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    let mut last_was_dash = true; // Prevents leading dash

    for c in title.to_lowercase().nfkd() {
        if is_combining_mark(c) {
            continue;
        }

        if c.is_ascii_alphanumeric() {
            if result.len() == MAX_SLUG_LEN {
                break;
            }
            result.push(c);
            last_was_dash = false;
        } else if !last_was_dash {
            if result.len() + 1 >= MAX_SLUG_LEN {
                break;
            }
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}
