//! Pattern compilation and rewrite engine.
//!
//! This module is the operational core of the crate. The public entry point
//! is [`Engine`]; everything else is plumbing split into focused submodules
//! under `src/engine/`.
//!
//! ## How the parts work together
//!
//! Running a pass over a rendered buffer or a request path is a pipeline:
//!
//! ```text
//! handler contributions ──┐
//!                         │  Registry::register        (registry.rs)
//!                         │    - idempotent per handler
//!                         │    - rejects unresolvable rules
//!                         v
//!                 compile (compile.rs)
//!                   - document-scan regex  (outbound)
//!                   - canonical-path regex (enforce-friendly)
//!                   - friendly-path regex  (inbound)
//!                         │
//! buffer / path ──────────┼─ collect occurrences
//!                         v
//!                 resolve_tags (resolve.rs)
//!                   - positional captures per occurrence
//!                   - one deduplicated fetch per (pattern, key tag)
//!                         │
//!                         v
//!                 build statements (statement.rs)
//!                   - substitute per occurrence
//!                   - URL cleanup on the friendly side
//!                         │
//!                         v
//!                 Engine pass (driver.rs)
//!                   - outbound: merged search -> replace map
//!                   - inbound / enforce: first resolved target
//! ```
//!
//! ## Responsibilities by module
//!
//! - `registry.rs`: per-handler rules, overrides and lookups; validation at
//!   registration so compilation never fails at use time.
//! - `compile.rs`: derives [`CompiledPattern`]s and structural
//!   [`PatternFlags`] from the registry.
//! - `resolve.rs`: turns regex occurrences into an ordered tag-value table,
//!   batching table lookups.
//! - `statement.rs`: produces one concrete search/replace pair per
//!   occurrence.
//! - `driver.rs`: orchestrates the three passes and owns the warning and
//!   query logs.
//! - `warnings.rs`: the non-fatal diagnostic taxonomy.
//!
//! No warning aborts a pass; every entry point returns a result plus
//! whatever diagnostics accumulated. See `Engine::warnings`.

#[path = "engine/compile.rs"]
mod compile;
#[path = "engine/driver.rs"]
mod driver;
#[path = "engine/registry.rs"]
mod registry;
#[path = "engine/resolve.rs"]
mod resolve;
#[path = "engine/statement.rs"]
mod statement;
#[path = "engine/warnings.rs"]
mod warnings;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

#[allow(unused_imports)]
pub use compile::{CompiledPattern, PatternFlags};
pub use driver::Engine;
pub use warnings::Warning;
