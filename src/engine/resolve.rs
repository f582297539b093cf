//! Tag resolution.
//!
//! A matched pattern yields raw capture groups; resolution turns those into
//! an ordered [`TagTable`]: for every tag, one value per occurrence. Values
//! come either straight from a capture group (position k of the capture
//! template owns group k) or from a batched table lookup keyed by a
//! captured id.
//!
//! Resolution is direction-agnostic. The outbound pass captures with the
//! search template and emits through the replace template; the inbound pass
//! swaps the two. Lookup-derived tags are exactly the emit-template tags
//! absent from the capture template, so captured and fetched values never
//! collide.
//!
//! Lookup batching: per (pattern, key tag) the captured ids are
//! deduplicated into a single fetch. A missing row or a failed fetch
//! degrades to `None` for the affected occurrences and records a warning;
//! it never aborts the pass.

use std::collections::HashSet;

use regex::Regex;

use super::warnings::Warning;
use crate::{RowFetcher, RowQuery, Rows, TableLookup};

/// One match of a compiled pattern. `groups[0]` is the whole match; group k
/// corresponds to the k-th tag of the capture template.
#[derive(Debug, Clone)]
pub(crate) struct Occurrence {
    pub groups: Vec<Option<String>>,
}

/// Every match of `re` in `text`, in positional order.
pub(crate) fn occurrences(re: &Regex, text: &str) -> Vec<Occurrence> {
    re.captures_iter(text)
        .map(|caps| Occurrence {
            groups: (0..caps.len()).map(|i| caps.get(i).map(|m| m.as_str().to_string())).collect(),
        })
        .collect()
}

/// Ordered tag -> per-occurrence values. Capture tags first (template
/// order), lookup-derived tags appended as they resolve. `None` marks an
/// occurrence with no substitution value; the statement builder leaves the
/// literal token in place for it.
#[derive(Debug, Default)]
pub(crate) struct TagTable {
    entries: Vec<(String, Vec<Option<String>>)>,
}

impl TagTable {
    /// Insert unless the tag is already present (duplicate tag literals in
    /// one template refer to the same capture; the first occurrence wins).
    /// Returns whether the entry was inserted.
    pub(crate) fn insert_first_wins(&mut self, tag: &str, values: Vec<Option<String>>) -> bool {
        if self.contains(tag) {
            return false;
        }
        self.entries.push((tag.to_string(), values));
        true
    }

    pub(crate) fn contains(&self, tag: &str) -> bool {
        self.entries.iter().any(|(t, _)| t == tag)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &(String, Vec<Option<String>>)> {
        self.entries.iter()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, tag: &str) -> Option<&[Option<String>]> {
        self.entries.iter().find(|(t, _)| t == tag).map(|(_, v)| v.as_slice())
    }
}

/// Everything [`resolve_tags`] needs beside the occurrences themselves.
pub(crate) struct ResolveRequest<'a> {
    pub handler: &'a str,
    pub capture_tags: &'a [String],
    pub emit_tags: &'a [String],
    pub lookups: &'a std::collections::HashMap<String, TableLookup>,
}

pub(crate) fn resolve_tags(
    req: &ResolveRequest<'_>,
    occs: &[Occurrence],
    fetcher: &dyn RowFetcher,
    warnings: &mut Vec<Warning>,
    queries: &mut Vec<RowQuery>,
) -> TagTable {
    let mut table = TagTable::default();

    for (position, tag) in req.capture_tags.iter().enumerate() {
        let group = position + 1;
        let values: Vec<Option<String>> =
            occs.iter().map(|o| o.groups.get(group).cloned().flatten()).collect();

        if !table.insert_first_wins(tag, values.clone()) {
            continue;
        }

        let lookup = match req.lookups.get(tag) {
            Some(lookup) => lookup,
            None => continue,
        };

        // Only fetch columns the emit template actually uses.
        let requested = requested_columns(req, lookup);
        if requested.is_empty() {
            continue;
        }

        let mut ids: Vec<String> = Vec::new();
        for v in values.iter().flatten() {
            if !ids.iter().any(|seen| seen == v) {
                ids.push(v.clone());
            }
        }
        if ids.is_empty() {
            continue;
        }

        let query = RowQuery {
            table: lookup.table.clone(),
            key_column: lookup.primary_key.clone(),
            ids,
            filter: lookup.filter.clone(),
            columns: requested.iter().map(|(_, column)| column.clone()).collect(),
        };
        queries.push(query.clone());

        let rows: Rows = match fetcher.fetch_rows(&query) {
            Ok(rows) => rows,
            Err(err) => {
                tracing::debug!(handler = req.handler, table = %query.table, %err, "fetch failed, degrading to zero rows");
                Rows::default()
            }
        };

        for id in &query.ids {
            if !rows.contains_key(id) {
                warnings.push(Warning::LookupMiss {
                    handler: req.handler.to_string(),
                    table: lookup.table.clone(),
                    tag: tag.clone(),
                    id: id.clone(),
                });
            }
        }

        // Re-join each occurrence's captured id back to its fetched row.
        for (emit_tag, column) in requested {
            let resolved: Vec<Option<String>> = values
                .iter()
                .map(|captured| {
                    captured.as_ref().and_then(|id| rows.get(id)).and_then(|row| row.get(&column)).cloned()
                })
                .collect();
            table.insert_first_wins(&emit_tag, resolved);
        }
    }

    // Emit tags with neither a capture nor a lookup stay literal; say so once.
    let mut reported: HashSet<&String> = HashSet::new();
    for tag in req.emit_tags {
        if !table.contains(tag) && reported.insert(tag) {
            warnings.push(Warning::AmbiguousTag { handler: req.handler.to_string(), tag: tag.clone() });
        }
    }

    table
}

/// Intersection of the emit-template tags with the lookup's declared
/// columns, excluding tags the capture template already supplies. Ordered
/// by the emit template.
fn requested_columns(req: &ResolveRequest<'_>, lookup: &TableLookup) -> Vec<(String, String)> {
    let mut requested: Vec<(String, String)> = Vec::new();
    for tag in req.emit_tags {
        if req.capture_tags.contains(tag) || requested.iter().any(|(t, _)| t == tag) {
            continue;
        }
        if let Some((_, column)) = lookup.columns.iter().find(|(col_tag, _)| col_tag == tag) {
            requested.push((tag.clone(), column.clone()));
        }
    }
    requested
}
