//! Tag codec: pure helpers shared by the registry and the compiler.
//!
//! A template is an opaque string carrying `%tag%` placeholders. This module
//! knows how to escape a template for regex use, how to find its tags, and
//! how to turn one tag into the capturing fragment the compiler splices in.
//! No state, no failure modes.

use std::collections::{HashMap, HashSet};

/// Fragment used for tags without a declared override: one or more
/// non-slash characters.
pub(crate) const DEFAULT_FRAGMENT: &str = "[^/]+";

/// Escape the metacharacters that actually occur in permalink templates.
///
/// Source patterns avoid regex syntax apart from `/`, `#`, `.` and `?`, so
/// only those four are escaped. Anything else passes through untouched.
pub(crate) fn escape_for_regex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '/' | '#' | '.' | '?') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Ordered tag literals (`%x%`) in `template`, left to right, duplicates
/// preserved. Position in this list is the capture-group numbering: the
/// k-th tag (1-based) owns capture group k.
pub(crate) fn extract_tags(template: &str) -> Vec<String> {
    regex!(r"%[A-Za-z0-9_]+%").find_iter(template).map(|m| m.as_str().to_string()).collect()
}

/// The capturing regex fragment for one tag: the handler override when
/// declared, else [`DEFAULT_FRAGMENT`], wrapped in a group.
pub(crate) fn tag_fragment(tag: &str, overrides: &HashMap<String, String>) -> String {
    match overrides.get(tag) {
        Some(fragment) => format!("({fragment})"),
        None => format!("({DEFAULT_FRAGMENT})"),
    }
}

/// Replace every tag literal in an already-escaped template with its
/// capturing fragment. Duplicate literals all become groups, which keeps
/// group numbering aligned with [`extract_tags`] order.
pub(crate) fn substitute_tags(template: &str, overrides: &HashMap<String, String>) -> String {
    let mut out = template.to_string();
    let mut done: HashSet<String> = HashSet::new();
    for tag in extract_tags(template) {
        if done.insert(tag.clone()) {
            out = out.replace(&tag, &tag_fragment(&tag, overrides));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_only_the_template_metacharacters() {
        assert_eq!(escape_for_regex("id.php?news_id=5"), r"id\.php\?news_id=5");
        assert_eq!(escape_for_regex("a/b#c"), r"a\/b\#c");
        assert_eq!(escape_for_regex("plain-text_123"), "plain-text_123");
    }

    #[test]
    fn extracts_tags_in_template_order() {
        let tags = extract_tags("news-%news_id%-%title%.html");
        assert_eq!(tags, vec!["%news_id%".to_string(), "%title%".to_string()]);
    }

    #[test]
    fn duplicate_tags_are_preserved() {
        let tags = extract_tags("%id%/%id%-%title%");
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0], tags[1]);
    }

    #[test]
    fn fragment_uses_override_when_declared() {
        let mut overrides = HashMap::new();
        overrides.insert("%news_id%".to_string(), "[0-9]+".to_string());
        assert_eq!(tag_fragment("%news_id%", &overrides), "([0-9]+)");
        assert_eq!(tag_fragment("%title%", &overrides), "([^/]+)");
    }

    #[test]
    fn substitution_turns_template_into_capture_pattern() {
        let mut overrides = HashMap::new();
        overrides.insert("%news_id%".to_string(), "[0-9]+".to_string());
        let escaped = escape_for_regex("news-%news_id%-%title%.html");
        assert_eq!(substitute_tags(&escaped, &overrides), r"news-([0-9]+)-([^/]+)\.html");
    }
}
