//! Verification-code extraction
//!
//! Account-confirmation emails carry a 6- or 8-digit numeric token in
//! the subject or body. These are pure functions: the caller decides
//! what to do with a found code (copy it, print it, notify).

use crate::message::Message;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// Exactly 6 or exactly 8 digits on word boundaries. A 5- or 7-digit
/// run matches neither alternative.
static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{6}\b|\b\d{8}\b").expect("code pattern"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

static HTML: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"<[a-z][\s\S]*>")
        .case_insensitive(true)
        .build()
        .expect("html pattern")
});

/// Find the verification code in a message, if any.
///
/// The subject is scanned first and its leftmost match wins. Only
/// when the subject yields nothing is the body scanned, after markup
/// has been stripped so codes inside HTML elements are still found.
#[must_use]
pub fn extract_code(message: &Message) -> Option<String> {
    if let Some(subject) = message.subject.as_deref() {
        if let Some(found) = CODE.find(subject) {
            return Some(found.as_str().to_string());
        }
    }

    let body = message.body.as_deref()?;
    let text = strip_tags(body);
    CODE.find(&text).map(|found| found.as_str().to_string())
}

/// Remove markup tags from `input`.
///
/// A naive single pass removing `<...>` runs. This is the one
/// sanitize step applied before text is displayed or scanned; it is
/// not an HTML parser.
#[must_use]
pub fn strip_tags(input: &str) -> String {
    TAG.replace_all(input, "").into_owned()
}

/// Whether `input` looks like an HTML fragment rather than plain text.
#[must_use]
pub fn looks_like_html(input: &str) -> bool {
    HTML.is_match(input)
}
