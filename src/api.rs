use crate::{FetchError, HandlerContribution, HandlerName, HandlerSource, RowFetcher, RowQuery, Rows};

/// Engine configuration.
///
/// Plain data, owned by the request-handling context; construct one per
/// request or share it read-only. No process-wide state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix applied to document-scan patterns, e.g. `fusion/`. Empty
    /// disables prefixing.
    pub base_path: String,
    /// Known root entries (files/segments living at the base path). A
    /// search template referencing one of these is never prefixed again.
    pub root_entries: Vec<String>,
    /// Absolute site base prepended to redirect targets.
    pub site_url: String,
    /// Transliterate friendly URLs to plain ASCII.
    pub normalize_ascii: bool,
    /// Delimiter friendly URLs collapse whitespace into.
    pub delimiter: char,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_path: String::new(),
            root_entries: Vec::new(),
            site_url: String::new(),
            normalize_ascii: false,
            delimiter: '-',
        }
    }
}

/// A [`HandlerSource`] over a fixed in-memory list of contributions.
///
/// Contributions are small, externally owned and static per request, so in
/// most embeddings this is all the "discovery" needed.
///
/// # Example
/// ```
/// use relink::{Config, Engine, NoRows, PatternRule, StaticSource};
///
/// let source = StaticSource::new().with("print", relink::HandlerContribution {
///     rules: vec![PatternRule::new("print.php?type=%type%", "print-%type%.html")],
///     overrides: vec![("%type%".to_string(), "[a-z]+".to_string())],
///     lookups: vec![],
/// });
///
/// let mut engine = Engine::new(Config::default(), NoRows);
/// engine.load(&source);
///
/// let page = engine.rewrite_outbound("<a href='print.php?type=news'>print</a>");
/// assert_eq!(page, "<a href='print-news.html'>print</a>");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entries: Vec<(HandlerName, HandlerContribution)>,
}

impl StaticSource {
    pub fn new() -> Self {
        StaticSource::default()
    }

    pub fn with(mut self, handler: impl Into<HandlerName>, contribution: HandlerContribution) -> Self {
        self.entries.push((handler.into(), contribution));
        self
    }
}

impl HandlerSource for StaticSource {
    fn enabled_handlers(&self) -> Vec<HandlerName> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    fn contribution(&self, handler: &str) -> Option<HandlerContribution> {
        self.entries.iter().find(|(name, _)| name == handler).map(|(_, c)| c.clone())
    }
}

/// A [`RowFetcher`] for embeddings without table lookups: every fetch
/// returns zero rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRows;

impl RowFetcher for NoRows {
    fn fetch_rows(&self, _query: &RowQuery) -> Result<Rows, FetchError> {
        Ok(Rows::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Engine, PatternRule, Warning};

    fn print_source() -> StaticSource {
        StaticSource::new().with(
            "print",
            HandlerContribution {
                rules: vec![PatternRule::new("print.php?type=%type%", "print-%type%.html")],
                overrides: vec![("%type%".to_string(), "[a-z]+".to_string())],
                lookups: vec![],
            },
        )
    }

    #[test]
    fn static_source_preserves_registration_order() {
        let source = print_source().with("extra", HandlerContribution::default());
        assert_eq!(source.enabled_handlers(), vec!["print".to_string(), "extra".to_string()]);
        assert!(source.contribution("print").is_some());
        assert!(source.contribution("missing").is_none());
    }

    #[test]
    fn engine_round_trips_without_lookups() {
        let mut engine = Engine::new(Config { site_url: "https://example.com/".to_string(), ..Config::default() }, NoRows);
        engine.load(&print_source());

        let page = engine.rewrite_outbound("see print.php?type=news today");
        assert_eq!(page, "see print-news.html today");

        let target = engine.resolve_inbound("print-news.html");
        assert_eq!(target.as_deref(), Some("https://example.com/print.php?type=news"));
        assert!(engine.queries().is_empty());
    }

    #[test]
    fn missing_contribution_is_a_config_warning() {
        struct Flaky;
        impl HandlerSource for Flaky {
            fn enabled_handlers(&self) -> Vec<HandlerName> {
                vec!["ghost".to_string()]
            }
            fn contribution(&self, _: &str) -> Option<HandlerContribution> {
                None
            }
        }

        let mut engine = Engine::new(Config::default(), NoRows);
        engine.load(&Flaky);
        assert!(matches!(engine.warnings(), [Warning::Config { handler, .. }] if handler == "ghost"));
    }
}
