//! Cut the content fragment out of a full HTML page.
//!
//! `rst2html` has no body-only mode: it always prints a complete document with
//! `<head>`, stylesheet and all. The host embeds converter output in its own
//! templates, so only what sits between `<body>` and `</body>` is kept.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

static BODY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<body[^>]*>\r?\n?(.*?)\r?\n?</body\s*>").expect("valid body regex")
});

/// Return the `<body>` contents of `html`, or `html` unchanged when it has
/// no body element (already a fragment).
pub fn extract_body(html: &[u8]) -> Vec<u8> {
    match BODY.captures(html).and_then(|c| c.get(1)) {
        Some(m) => m.as_bytes().to_vec(),
        None => html.to_vec(),
    }
}
