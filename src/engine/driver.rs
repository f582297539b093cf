//! Pass orchestration.
//!
//! [`Engine`] owns the validated registry, the compiled patterns and the
//! diagnostic logs, and runs the three passes:
//!
//! - **outbound**: rewrite canonical links embedded in rendered output
//!   into their friendly form. A pure buffer transform.
//! - **inbound**: resolve a friendly request path back to its canonical
//!   target for a 301 redirect.
//! - **enforce-friendly**: the inverse redirect: a request that still uses
//!   the canonical shape is answered with its friendly location.
//!
//! The engine is request-scoped and synchronous: construct it (or share it
//! read-only after [`Engine::load`]), run one pass, inspect
//! [`Engine::warnings`] and [`Engine::queries`]. No warning ever aborts a
//! pass.

use std::collections::{HashMap, HashSet};

use regex::{Regex, RegexBuilder};
use tracing::debug;

use super::compile::{self, CompiledPattern, PatternFlags};
use super::registry::Registry;
use super::resolve::{self, ResolveRequest};
use super::statement::{self, Statement};
use super::warnings::Warning;
use crate::{Config, HandlerSource, RowFetcher, RowQuery, TableLookup, codec, slug};

/// The rewrite engine. Generic over the row-fetch boundary; everything else
/// comes in through [`Engine::load`].
#[derive(Debug)]
pub struct Engine<F> {
    config: Config,
    fetcher: F,
    registry: Registry,
    compiled: Vec<CompiledPattern>,
    warnings: Vec<Warning>,
    queries: Vec<RowQuery>,
    /// Warnings up to this index stem from loading and survive pass resets.
    load_marker: usize,
}

impl<F: RowFetcher> Engine<F> {
    pub fn new(config: Config, fetcher: F) -> Self {
        Engine {
            config,
            fetcher,
            registry: Registry::default(),
            compiled: Vec::new(),
            warnings: Vec::new(),
            queries: Vec::new(),
            load_marker: 0,
        }
    }

    /// Build the registry from a handler source and compile every pattern.
    ///
    /// Replaces whatever was loaded before. Registration and compilation
    /// problems are recorded as [`Warning::Config`] and the offending rule
    /// skipped; loading itself cannot fail.
    pub fn load(&mut self, source: &dyn HandlerSource) {
        self.warnings.clear();
        self.queries.clear();

        let mut registry = Registry::default();
        for handler in source.enabled_handlers() {
            match source.contribution(&handler) {
                Some(contribution) => registry.register(&handler, contribution, &mut self.warnings),
                None => self.warnings.push(Warning::Config {
                    handler: handler.clone(),
                    detail: "contribution missing".to_string(),
                }),
            }
        }

        self.compiled = compile::compile_all(&registry, &self.config, &mut self.warnings);
        self.registry = registry;
        self.load_marker = self.warnings.len();
        debug!(patterns = self.compiled.len(), warnings = self.load_marker, "registry loaded");
    }

    /// Outbound pass: scan `buffer` for canonical links and rewrite each
    /// occurrence into its friendly form. Returns the rewritten buffer;
    /// never redirects.
    pub fn rewrite_outbound(&mut self, buffer: &str) -> String {
        self.begin_pass();
        let Engine { config, fetcher, registry, compiled, warnings, queries, .. } = self;

        let empty_lookups = HashMap::new();
        let mut rewrites: Vec<(Regex, String)> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for cp in compiled.iter() {
            let occs = resolve::occurrences(&cp.scan, buffer);
            if occs.is_empty() {
                warnings
                    .push(Warning::NoMatch { handler: cp.handler.clone(), pattern: cp.rule.search.clone() });
                continue;
            }
            debug!(handler = %cp.handler, rule = cp.rule_index, occurrences = occs.len(), "document scan matched");

            let statements = if cp.flags.contains(PatternFlags::LITERAL) {
                // No tags: one statement, a plain substring replacement.
                vec![Statement {
                    search: cp.rule.search.clone(),
                    replace: slug::clean_url(&cp.rule.replace, config.delimiter, config.normalize_ascii),
                }]
            } else {
                let lookups = handler_lookups(registry, &cp.handler, &empty_lookups);
                let req = ResolveRequest {
                    handler: &cp.handler,
                    capture_tags: &cp.search_tags,
                    emit_tags: &cp.replace_tags,
                    lookups,
                };
                let table = resolve::resolve_tags(&req, &occs, &*fetcher, warnings, queries);
                statement::build(&cp.rule, &table, occs.len(), config)
            };

            for st in statements {
                let (prefixed, _) = compile::apply_prefix(&st.search, config);
                let pattern = codec::escape_for_regex(&prefixed);
                if !seen.insert(pattern.clone()) {
                    continue;
                }
                match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                    Ok(re) => rewrites.push((re, st.replace)),
                    // Captured values can smuggle metacharacters the template
                    // escaping does not cover; skip rather than die.
                    Err(err) => warnings.push(Warning::Config {
                        handler: cp.handler.clone(),
                        detail: format!("statement `{}` does not compile: {err}", st.search),
                    }),
                }
            }
        }

        let mut out = buffer.to_string();
        for (re, replacement) in &rewrites {
            out = re.replace_all(&out, regex::NoExpand(replacement.as_str())).into_owned();
        }
        out
    }

    /// Inbound pass: resolve a friendly request path back to its canonical
    /// target. Returns the absolute redirect target (site base + canonical
    /// path) for the first fully resolved pattern, in registry order;
    /// `None` means passthrough, the path matched nothing.
    pub fn resolve_inbound(&mut self, path: &str) -> Option<String> {
        self.begin_pass();
        let Engine { config, fetcher, registry, compiled, warnings, queries, .. } = self;

        let empty_lookups = HashMap::new();
        for cp in compiled.iter() {
            let occs = resolve::occurrences(&cp.friendly, path);
            if occs.is_empty() {
                warnings
                    .push(Warning::NoMatch { handler: cp.handler.clone(), pattern: cp.rule.replace.clone() });
                continue;
            }

            // Friendly path captures with the replace template, emits the
            // canonical side.
            let lookups = handler_lookups(registry, &cp.handler, &empty_lookups);
            let req = ResolveRequest {
                handler: &cp.handler,
                capture_tags: &cp.replace_tags,
                emit_tags: &cp.search_tags,
                lookups,
            };
            let table = resolve::resolve_tags(&req, &occs, &*fetcher, warnings, queries);
            let first = match statement::build(&cp.rule, &table, occs.len(), config).into_iter().next() {
                Some(statement) => statement,
                None => continue,
            };
            if !codec::extract_tags(&first.search).is_empty() {
                // Not fully specified; the next pattern may still win.
                continue;
            }

            debug!(handler = %cp.handler, target = %first.search, "inbound path resolved");
            return Some(format!("{}{}", config.site_url, first.search));
        }
        None
    }

    /// Enforce-friendly pass: a request path that still has the canonical
    /// shape resolves to its friendly location (the 301 target that keeps
    /// crawlers off non-friendly URLs). `None` means the path is already
    /// friendly or matches no pattern.
    pub fn enforce_friendly(&mut self, path: &str) -> Option<String> {
        self.begin_pass();
        let Engine { config, fetcher, registry, compiled, warnings, queries, .. } = self;

        let empty_lookups = HashMap::new();
        for cp in compiled.iter() {
            let occs = resolve::occurrences(&cp.canonical, path);
            if occs.is_empty() {
                warnings
                    .push(Warning::NoMatch { handler: cp.handler.clone(), pattern: cp.rule.search.clone() });
                continue;
            }

            let lookups = handler_lookups(registry, &cp.handler, &empty_lookups);
            let req = ResolveRequest {
                handler: &cp.handler,
                capture_tags: &cp.search_tags,
                emit_tags: &cp.replace_tags,
                lookups,
            };
            let table = resolve::resolve_tags(&req, &occs, &*fetcher, warnings, queries);
            let first = match statement::build(&cp.rule, &table, occs.len(), config).into_iter().next() {
                Some(statement) => statement,
                None => continue,
            };
            if !codec::extract_tags(&first.replace).is_empty() {
                continue;
            }

            debug!(handler = %cp.handler, target = %first.replace, "canonical path enforced");
            return Some(format!("{}{}", config.site_url, first.replace));
        }
        None
    }

    /// Diagnostics accumulated by loading plus the most recent pass.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// The batched row fetches the most recent pass issued, in order.
    pub fn queries(&self) -> &[RowQuery] {
        &self.queries
    }

    /// The compiled patterns, in evaluation order.
    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.compiled
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    fn begin_pass(&mut self) {
        self.warnings.truncate(self.load_marker);
        self.queries.clear();
    }
}

fn handler_lookups<'a>(
    registry: &'a Registry,
    handler: &str,
    empty: &'a HashMap<String, TableLookup>,
) -> &'a HashMap<String, TableLookup> {
    registry.handler(handler).map_or(empty, |entry| &entry.lookups)
}
