//! Non-fatal diagnostics.
//!
//! Nothing in a pass ever propagates as `Err`: a broken rule is skipped at
//! registration, a pattern that matches nothing is recorded, a lookup that
//! comes back empty degrades to an unresolved tag. Each of those leaves one
//! of these records behind, inspectable through `Engine::warnings` after
//! the pass completes.

/// One recorded degradation. Accumulated, never thrown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Warning {
    /// Malformed contribution: bad override fragment, unresolvable replace
    /// tag, missing contribution, regex that failed to compile. The rule
    /// (or override) is excluded; the rest of the handler still loads.
    #[error("{handler}: {detail}")]
    Config { handler: String, detail: String },

    /// A compiled pattern matched nothing in the scanned text. Expected on
    /// most passes; recorded for diagnosis.
    #[error("{handler}: `{pattern}` matched nothing")]
    NoMatch { handler: String, pattern: String },

    /// A fetch returned no row for one captured id. The occurrence keeps
    /// the literal tag token; other occurrences are unaffected.
    #[error("{handler}: no `{table}` row for {tag}={id}")]
    LookupMiss { handler: String, table: String, tag: String, id: String },

    /// An emit-side tag with neither a capture nor a lookup to supply it.
    /// The template token passes through unresolved.
    #[error("{handler}: tag {tag} has no capture and no lookup")]
    AmbiguousTag { handler: String, tag: String },
}
