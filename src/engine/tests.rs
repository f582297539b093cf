//! Full-pipeline tests: registry -> compile -> resolve -> statements ->
//! passes, driven through the public `Engine` surface.

use std::cell::Cell;
use std::collections::HashMap;

use crate::{
    Config, Engine, FetchError, HandlerContribution, PatternRule, RowFetcher, RowQuery, Rows, StaticSource,
    TableLookup, Warning,
};

/// In-memory data layer: table -> id -> column -> value. Counts fetches and
/// can be switched into failure mode.
struct MemoryRows {
    tables: HashMap<String, Rows>,
    calls: Cell<usize>,
    fail: Cell<bool>,
}

impl MemoryRows {
    fn new(tables: &[(&str, &[(&str, &[(&str, &str)])])]) -> Self {
        let tables = tables
            .iter()
            .map(|(table, rows)| {
                let rows = rows
                    .iter()
                    .map(|(id, cols)| {
                        (id.to_string(), cols.iter().map(|(c, v)| (c.to_string(), v.to_string())).collect())
                    })
                    .collect();
                (table.to_string(), rows)
            })
            .collect();
        MemoryRows { tables, calls: Cell::new(0), fail: Cell::new(false) }
    }
}

impl RowFetcher for MemoryRows {
    fn fetch_rows(&self, query: &RowQuery) -> Result<Rows, FetchError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail.get() {
            return Err(FetchError("db offline".to_string()));
        }
        let table = match self.tables.get(&query.table) {
            Some(table) => table,
            None => return Ok(Rows::default()),
        };
        Ok(query
            .ids
            .iter()
            .filter_map(|id| {
                table.get(id).map(|row| {
                    let columns = row
                        .iter()
                        .filter(|(column, _)| query.columns.contains(column))
                        .map(|(column, value)| (column.clone(), value.clone()))
                        .collect();
                    (id.clone(), columns)
                })
            })
            .collect())
    }
}

fn news_contribution() -> HandlerContribution {
    HandlerContribution {
        rules: vec![PatternRule::new("id.php?news_id=%news_id%", "news-%news_id%-%title%.html")],
        overrides: vec![("%news_id%".to_string(), "[0-9]+".to_string())],
        lookups: vec![(
            "%news_id%".to_string(),
            TableLookup {
                table: "news".to_string(),
                primary_key: "news_id".to_string(),
                columns: vec![("%title%".to_string(), "news_subject".to_string())],
                filter: Some("news_draft='0'".to_string()),
            },
        )],
    }
}

fn news_source() -> StaticSource {
    StaticSource::new().with("news", news_contribution())
}

fn news_rows() -> MemoryRows {
    MemoryRows::new(&[(
        "news",
        &[("5", &[("news_subject", "Hello World")]), ("7", &[("news_subject", "Second Post")])],
    )])
}

fn news_engine() -> Engine<MemoryRows> {
    let config = Config { site_url: "https://example.com/".to_string(), ..Config::default() };
    let mut engine = Engine::new(config, news_rows());
    engine.load(&news_source());
    engine
}

#[test]
fn outbound_rewrites_every_occurrence() {
    let mut engine = news_engine();
    let page = engine.rewrite_outbound(
        "<a href='id.php?news_id=5'>first</a> and <a href='id.php?news_id=7'>second</a>",
    );

    assert_eq!(page, "<a href='news-5-hello-world.html'>first</a> and <a href='news-7-second-post.html'>second</a>");
    assert_eq!(engine.fetcher().calls.get(), 1, "one batched fetch for both ids");
    assert_eq!(engine.queries().len(), 1);
    assert_eq!(engine.queries()[0].ids, vec!["5".to_string(), "7".to_string()]);
    assert_eq!(engine.queries()[0].columns, vec!["news_subject".to_string()]);
    assert_eq!(engine.queries()[0].filter.as_deref(), Some("news_draft='0'"));
}

#[test]
fn tagless_pattern_is_a_plain_substring_replace() {
    let source = StaticSource::new().with(
        "core",
        HandlerContribution {
            rules: vec![PatternRule::new("submit.php", "submit.html")],
            overrides: vec![],
            lookups: vec![],
        },
    );
    let mut engine = Engine::new(Config::default(), MemoryRows::new(&[]));
    engine.load(&source);

    let page = engine.rewrite_outbound("<a href='submit.php'>submit</a> or submit.php");
    assert_eq!(page, "<a href='submit.html'>submit</a> or submit.html");
    assert!(engine.queries().is_empty());
}

#[test]
fn outbound_deduplicates_shared_ids() {
    let mut engine = news_engine();
    let page = engine.rewrite_outbound("id.php?news_id=5 twice id.php?news_id=5");

    assert_eq!(page, "news-5-hello-world.html twice news-5-hello-world.html");
    assert_eq!(engine.queries()[0].ids, vec!["5".to_string()]);
    assert_eq!(engine.fetcher().calls.get(), 1);
}

#[test]
fn outbound_is_idempotent() {
    let mut engine = news_engine();
    let once = engine.rewrite_outbound("go to id.php?news_id=5 now");
    let twice = engine.rewrite_outbound(&once);

    assert_eq!(once, twice, "friendly URLs must not re-match the document scan");
    assert!(engine.warnings().iter().any(|w| matches!(w, Warning::NoMatch { .. })));
}

#[test]
fn outbound_lookup_miss_keeps_the_literal_tag() {
    let mut engine = news_engine();
    let page = engine.rewrite_outbound("id.php?news_id=9 and id.php?news_id=7");

    // Id 9 has no row: its occurrence keeps %title% unresolved, the other
    // occurrence still resolves.
    assert_eq!(page, "news-9-%title%.html and news-7-second-post.html");
    assert!(
        engine.warnings().iter().any(|w| matches!(w, Warning::LookupMiss { id, .. } if id == "9")),
        "missing row is recorded, not fatal"
    );
}

#[test]
fn outbound_fetch_failure_degrades_to_unresolved() {
    let mut engine = news_engine();
    engine.fetcher().fail.set(true);
    let page = engine.rewrite_outbound("id.php?news_id=5");

    assert_eq!(page, "news-5-%title%.html");
    assert!(engine.warnings().iter().any(|w| matches!(w, Warning::LookupMiss { .. })));
}

#[test]
fn inbound_round_trips_the_outbound_rewrite() {
    let mut engine = news_engine();
    let page = engine.rewrite_outbound("<a href='id.php?news_id=5'>x</a>");
    let path = page.split('\'').nth(1).unwrap();
    assert_eq!(path, "news-5-hello-world.html");

    let calls_before = engine.fetcher().calls.get();
    let target = engine.resolve_inbound(path);

    assert_eq!(target.as_deref(), Some("https://example.com/id.php?news_id=5"));
    assert_eq!(engine.fetcher().calls.get(), calls_before, "inbound needs no lookup here");
}

#[test]
fn inbound_passthrough_records_the_failures() {
    let mut engine = news_engine();
    let target = engine.resolve_inbound("about.html");

    assert_eq!(target, None);
    assert!(engine.warnings().iter().any(|w| matches!(w, Warning::NoMatch { .. })));
}

#[test]
fn inbound_first_registered_pattern_wins() {
    let shape = |search: &str| HandlerContribution {
        rules: vec![PatternRule::new(search, "item-%id%.html")],
        overrides: vec![("%id%".to_string(), "[0-9]+".to_string())],
        lookups: vec![],
    };
    let source = StaticSource::new().with("albums", shape("albums.php?id=%id%")).with("files", shape("files.php?id=%id%"));

    let mut engine = Engine::new(Config::default(), MemoryRows::new(&[]));
    engine.load(&source);

    assert_eq!(engine.resolve_inbound("item-5.html").as_deref(), Some("albums.php?id=5"));
}

#[test]
fn enforce_friendly_builds_the_redirect_target() {
    let mut engine = news_engine();
    let target = engine.enforce_friendly("id.php?news_id=5");

    assert_eq!(target.as_deref(), Some("https://example.com/news-5-hello-world.html"));
    assert_eq!(engine.fetcher().calls.get(), 1, "the friendly side needs the title lookup");
    assert_eq!(engine.queries().len(), 1);
}

#[test]
fn enforce_friendly_ignores_already_friendly_paths() {
    let mut engine = news_engine();
    assert_eq!(engine.enforce_friendly("news-5-hello-world.html"), None);
}

#[test]
fn transliteration_applies_when_toggled_on() {
    let config = Config {
        site_url: "https://example.com/".to_string(),
        normalize_ascii: true,
        ..Config::default()
    };
    let mut engine = Engine::new(
        config,
        MemoryRows::new(&[("news", &[("5", &[("news_subject", "Révolution Française")])])]),
    );
    engine.load(&news_source());

    let page = engine.rewrite_outbound("id.php?news_id=5");
    assert_eq!(page, "news-5-revolution-francaise.html");
}

#[test]
fn warnings_are_scoped_to_the_last_pass() {
    let source = news_source().with("ghost", HandlerContribution {
        rules: vec![PatternRule::new("x-%a%", "y-%b%")],
        overrides: vec![],
        lookups: vec![],
    });
    let mut engine = Engine::new(Config::default(), news_rows());
    engine.load(&source);

    let config_warnings =
        engine.warnings().iter().filter(|w| matches!(w, Warning::Config { .. })).count();
    assert_eq!(config_warnings, 1, "ghost rule is rejected at registration");

    engine.rewrite_outbound("nothing to see");
    let no_match = engine.warnings().iter().filter(|w| matches!(w, Warning::NoMatch { .. })).count();
    assert_eq!(no_match, 1);

    engine.rewrite_outbound("id.php?news_id=5");
    assert!(
        engine.warnings().iter().all(|w| !matches!(w, Warning::NoMatch { .. })),
        "previous pass diagnostics are gone"
    );
    assert_eq!(
        engine.warnings().iter().filter(|w| matches!(w, Warning::Config { .. })).count(),
        1,
        "load diagnostics survive"
    );
}

#[test]
fn reloading_replaces_the_rule_set() {
    let mut engine = news_engine();
    assert!(engine.resolve_inbound("news-5-hello-world.html").is_some());

    let reshaped = StaticSource::new().with("news", HandlerContribution {
        rules: vec![PatternRule::new("id.php?news_id=%news_id%", "story/%news_id%")],
        overrides: vec![("%news_id%".to_string(), "[0-9]+".to_string())],
        lookups: vec![],
    });
    engine.load(&reshaped);

    assert_eq!(engine.resolve_inbound("news-5-hello-world.html"), None);
    assert_eq!(engine.resolve_inbound("story/5").as_deref(), Some("https://example.com/id.php?news_id=5"));
}
