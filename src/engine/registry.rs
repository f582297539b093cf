//! Pattern registry.
//!
//! Holds, per handler, the declared search/replace pattern pairs, the
//! per-tag regex overrides and the table-lookup declarations. Contributions
//! are validated here so that compilation and matching never fail at use
//! time: a malformed override or an unresolvable rule is dropped with a
//! [`Warning::Config`] and the rest of the handler still loads.

use std::collections::HashMap;

use super::warnings::Warning;
use crate::{HandlerContribution, HandlerName, PatternRule, TableLookup, codec};

/// Validated state for one handler.
#[derive(Debug, Default)]
pub(crate) struct HandlerRules {
    pub rules: Vec<PatternRule>,
    pub overrides: HashMap<String, String>,
    pub lookups: HashMap<String, TableLookup>,
}

/// All registered handlers, in registration order.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    order: Vec<HandlerName>,
    entries: HashMap<HandlerName, HandlerRules>,
}

impl Registry {
    /// Register (or replace) one handler's contribution.
    ///
    /// Re-registering a handler replaces its prior contribution wholesale;
    /// its position in the evaluation order is kept.
    pub(crate) fn register(
        &mut self,
        handler: &str,
        contribution: HandlerContribution,
        warnings: &mut Vec<Warning>,
    ) {
        let mut entry = HandlerRules::default();

        for (tag, fragment) in contribution.overrides {
            if !is_tag_literal(&tag) {
                warnings.push(Warning::Config {
                    handler: handler.to_string(),
                    detail: format!("override `{tag}` is not a %tag% literal"),
                });
                continue;
            }
            if regex::Regex::new(&format!("({fragment})")).is_err() {
                warnings.push(Warning::Config {
                    handler: handler.to_string(),
                    detail: format!("override fragment `{fragment}` for {tag} does not compile"),
                });
                continue;
            }
            entry.overrides.insert(tag, fragment);
        }

        for (tag, lookup) in contribution.lookups {
            if !is_tag_literal(&tag) {
                warnings.push(Warning::Config {
                    handler: handler.to_string(),
                    detail: format!("lookup key `{tag}` is not a %tag% literal"),
                });
                continue;
            }
            // At most one lookup per (handler, tag); the first declaration wins.
            if entry.lookups.contains_key(&tag) {
                warnings.push(Warning::Config {
                    handler: handler.to_string(),
                    detail: format!("duplicate lookup for {tag} ignored"),
                });
                continue;
            }
            entry.lookups.insert(tag, lookup);
        }

        for rule in contribution.rules {
            match uncovered_replace_tag(&rule, &entry.lookups) {
                Some(tag) => warnings.push(Warning::Config {
                    handler: handler.to_string(),
                    detail: format!("rule `{}` skipped: {tag} has no capture and no lookup", rule.search),
                }),
                None => entry.rules.push(rule),
            }
        }

        if !self.entries.contains_key(handler) {
            self.order.push(handler.to_string());
        }
        self.entries.insert(handler.to_string(), entry);
    }

    pub(crate) fn handler(&self, name: &str) -> Option<&HandlerRules> {
        self.entries.get(name)
    }

    /// Stable ordered iteration: handlers in registration order, rules in
    /// declaration order. Drives both compilation and pass evaluation, so
    /// "first pattern wins" is deterministic.
    pub(crate) fn all_rules(&self) -> impl Iterator<Item = (&str, usize, &PatternRule)> {
        self.order.iter().flat_map(move |h| {
            let entry = &self.entries[h];
            entry.rules.iter().enumerate().map(move |(i, r)| (h.as_str(), i, r))
        })
    }
}

fn is_tag_literal(tag: &str) -> bool {
    let tags = codec::extract_tags(tag);
    tags.len() == 1 && tags[0] == tag
}

/// A replace-template tag must be captured by the search template or be
/// supplied by a lookup keyed on a captured tag. Returns the first tag that
/// is neither.
fn uncovered_replace_tag(rule: &PatternRule, lookups: &HashMap<String, TableLookup>) -> Option<String> {
    let search_tags = codec::extract_tags(&rule.search);
    codec::extract_tags(&rule.replace).into_iter().find(|tag| {
        !search_tags.contains(tag)
            && !lookups.iter().any(|(key, lookup)| {
                search_tags.contains(key) && lookup.columns.iter().any(|(col_tag, _)| col_tag == tag)
            })
    })
}
