extern crate self as relink;

use std::collections::HashMap;

#[macro_use]
mod macros;
mod api;
mod codec;
mod engine;
mod slug;

pub use api::{Config, NoRows, StaticSource};
pub use engine::{CompiledPattern, Engine, PatternFlags, Warning};

// --- Core data model --------------------------------------------------------

/// Name of a content-type handler contributing rewrite rules, e.g. `news`.
pub type HandlerName = String;

/// A declared permalink shape: the canonical search template and the friendly
/// replace template it rewrites to.
///
/// Templates carry `%tag%` placeholders, e.g.
/// search `id.php?news_id=%news_id%`, replace `news-%news_id%-%title%.html`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    pub search: String,
    pub replace: String,
}

impl PatternRule {
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        PatternRule { search: search.into(), replace: replace.into() }
    }
}

/// A table-lookup declaration: resolves a captured key tag (e.g. `%news_id%`)
/// into extra column values needed by the opposite template (e.g. `%title%`).
///
/// `columns` maps tag literals to column names, in declaration order. At most
/// one lookup per `(handler, key tag)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLookup {
    pub table: String,
    pub primary_key: String,
    pub columns: Vec<(String, String)>,
    /// Extra filter clause the data layer applies verbatim, e.g. `news_draft='0'`.
    pub filter: Option<String>,
}

/// Everything one handler contributes to the registry.
#[derive(Debug, Clone, Default)]
pub struct HandlerContribution {
    pub rules: Vec<PatternRule>,
    /// Tag literal -> regex fragment, e.g. `%news_id%` -> `[0-9]+`.
    pub overrides: Vec<(String, String)>,
    /// Key tag literal -> lookup declaration.
    pub lookups: Vec<(String, TableLookup)>,
}

// --- Collaborator boundaries -------------------------------------------------

/// Source of handler enablement and per-handler rule contributions.
///
/// The engine only ever sees the result of discovery; where the rules come
/// from (files, database, statics) is the caller's business.
pub trait HandlerSource {
    /// Enabled handler names, in the order they should be evaluated.
    fn enabled_handlers(&self) -> Vec<HandlerName>;

    /// The contribution for one handler, or `None` when it cannot be loaded.
    fn contribution(&self, handler: &str) -> Option<HandlerContribution>;
}

/// Fetch result: primary-key value -> column name -> value.
pub type Rows = HashMap<String, HashMap<String, String>>;

/// One batched row fetch. The id set is already deduplicated; the data layer
/// is responsible for safe parameterization of `filter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowQuery {
    pub table: String,
    pub key_column: String,
    pub ids: Vec<String>,
    pub filter: Option<String>,
    pub columns: Vec<String>,
}

/// Opaque data-layer failure. The engine degrades a failed fetch to zero
/// rows; it never aborts a pass over one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("row fetch failed: {0}")]
pub struct FetchError(pub String);

/// Key-value row fetch boundary to the data store.
pub trait RowFetcher {
    fn fetch_rows(&self, query: &RowQuery) -> Result<Rows, FetchError>;
}
