//! Text helpers shared by the parsers, normalizer and renderer.
//!
//! - Whitespace collapsing and title folding for dedup keys
//! - Whole-word keyword matching
//! - Truncation for log previews
//! - Slugs for source-specific URL segments
//! - HTML escaping for the digest's HTML alternative

/// Collapse runs of whitespace into single spaces and trim the ends.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_text("  AI \n  Meetup "), "AI Meetup");
/// ```
pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fold a title for comparison: lowercase with whitespace collapsed.
pub fn fold_title(title: &str) -> String {
    clean_text(title).to_lowercase()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (backing off to a char
/// boundary) with an ellipsis and byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Convert text to a lowercase, hyphenated slug.
///
/// Characters other than alphanumerics, spaces and hyphens are dropped and
/// runs of separators collapse to a single hyphen.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("New York"), "new-york");
/// assert_eq!(slugify("UX & Design"), "ux-design");
/// ```
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .split(|c: char| c == ' ' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Whether `keyword` occurs in `text` as whole words, ignoring case.
///
/// Both sides are split on non-alphanumerics, so `ai` matches "AI-powered"
/// and "Gen AI" but not "Fair" or "Email", and multi-word keywords must
/// appear as consecutive words.
///
/// # Examples
///
/// ```ignore
/// assert!(contains_keyword("Machine Learning Night", "machine learning"));
/// assert!(!contains_keyword("Job Fair", "ai"));
/// ```
pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    let needle = words(keyword);
    if needle.is_empty() {
        return false;
    }
    words(text)
        .windows(needle.len())
        .any(|window| window == needle.as_slice())
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
