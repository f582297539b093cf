//! Regex compilation.
//!
//! Turns each registered `(handler, rule)` into a [`CompiledPattern`]: three
//! compiled matchers plus structural flags.
//!
//! - **document-scan**: matches canonical links embedded anywhere in page
//!   output; case-insensitive, unanchored, optionally base-path prefixed.
//! - **canonical-path**: matches a request path that still has the canonical
//!   shape; end-anchored, no prefix.
//! - **friendly-path**: matches a request path in the friendly shape the
//!   replace template describes; end-anchored, no prefix.
//!
//! All escaping happens before tag substitution so fragments keep their
//! metacharacters. Compilation failures are caught here and excluded with a
//! warning; at use time a pattern either matches or yields zero occurrences.

use regex::{Regex, RegexBuilder};

use super::registry::Registry;
use super::warnings::Warning;
use crate::{Config, HandlerName, PatternRule, codec};

bitflags::bitflags! {
    /// Structural facts about one compiled pattern.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PatternFlags: u8 {
        /// No tags at all: the outbound pass degrades to a literal
        /// substring replacement.
        const LITERAL    = 1 << 0;
        /// Some captured tag carries a table-lookup declaration.
        const HAS_LOOKUP = 1 << 1;
        /// The document-scan form received the base-path prefix.
        const PREFIXED   = 1 << 2;
    }
}

/// A rule compiled for matching. Never mutated; rebuilt when the registry
/// changes.
#[derive(Debug)]
pub struct CompiledPattern {
    pub handler: HandlerName,
    pub rule_index: usize,
    pub rule: PatternRule,
    pub flags: PatternFlags,
    pub(crate) scan: Regex,
    pub(crate) canonical: Regex,
    pub(crate) friendly: Regex,
    /// Tag literals of each template, cached once in capture order.
    pub(crate) search_tags: Vec<String>,
    pub(crate) replace_tags: Vec<String>,
}

/// Prefix `template` with the configured base path, unless it already
/// references a known root entry (prevents double-prefixing when a rule
/// spells out the full path itself).
pub(crate) fn apply_prefix(template: &str, config: &Config) -> (String, bool) {
    if config.base_path.is_empty() {
        return (template.to_string(), false);
    }
    let lower = template.to_ascii_lowercase();
    let references_root =
        config.root_entries.iter().any(|e| !e.is_empty() && lower.contains(&e.to_ascii_lowercase()));
    if references_root {
        (template.to_string(), false)
    } else {
        (format!("{}{}", config.base_path, template), true)
    }
}

pub(crate) fn compile_all(registry: &Registry, config: &Config, warnings: &mut Vec<Warning>) -> Vec<CompiledPattern> {
    let mut compiled = Vec::new();

    for (handler, rule_index, rule) in registry.all_rules() {
        let entry = match registry.handler(handler) {
            Some(entry) => entry,
            None => continue,
        };

        let (scan_src, prefixed) = apply_prefix(&rule.search, config);
        let scan_pat = codec::substitute_tags(&codec::escape_for_regex(&scan_src), &entry.overrides);
        let canonical_pat =
            format!("{}$", codec::substitute_tags(&codec::escape_for_regex(&rule.search), &entry.overrides));
        let friendly_pat =
            format!("{}$", codec::substitute_tags(&codec::escape_for_regex(&rule.replace), &entry.overrides));

        let built = RegexBuilder::new(&scan_pat).case_insensitive(true).build().and_then(|scan| {
            let canonical = Regex::new(&canonical_pat)?;
            let friendly = Regex::new(&friendly_pat)?;
            Ok((scan, canonical, friendly))
        });

        let (scan, canonical, friendly) = match built {
            Ok(regexes) => regexes,
            Err(err) => {
                warnings.push(Warning::Config {
                    handler: handler.to_string(),
                    detail: format!("rule `{}` does not compile: {err}", rule.search),
                });
                continue;
            }
        };

        let search_tags = codec::extract_tags(&rule.search);
        let replace_tags = codec::extract_tags(&rule.replace);

        let mut flags = PatternFlags::empty();
        if search_tags.is_empty() && replace_tags.is_empty() {
            flags |= PatternFlags::LITERAL;
        }
        if search_tags.iter().any(|t| entry.lookups.contains_key(t)) {
            flags |= PatternFlags::HAS_LOOKUP;
        }
        if prefixed {
            flags |= PatternFlags::PREFIXED;
        }

        tracing::trace!(handler, rule_index, scan = %scan_pat, ?flags, "compiled pattern");

        compiled.push(CompiledPattern {
            handler: handler.to_string(),
            rule_index,
            rule: rule.clone(),
            flags,
            scan,
            canonical,
            friendly,
            search_tags,
            replace_tags,
        });
    }

    compiled
}
