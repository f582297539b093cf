//! Statement building.
//!
//! For every occurrence a pattern captured, substitute the resolved tag
//! values back into the literal templates, producing one concrete
//! `search -> replace` pair. An occurrence with no value for some tag keeps
//! that literal token; the friendly side is URL-cleaned, the canonical side
//! is left verbatim.

use super::resolve::TagTable;
use crate::{Config, PatternRule, slug};

/// One fully substituted rewrite pair. Terminal: the driver either merges
/// it into the outbound map or takes one side as a redirect target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Statement {
    pub search: String,
    pub replace: String,
}

pub(crate) fn build(rule: &PatternRule, table: &TagTable, count: usize, config: &Config) -> Vec<Statement> {
    (0..count)
        .map(|i| {
            let mut search = rule.search.clone();
            let mut replace = rule.replace.clone();
            for (tag, values) in table.iter() {
                if let Some(Some(value)) = values.get(i) {
                    search = search.replace(tag.as_str(), value);
                    replace = replace.replace(tag.as_str(), value);
                }
            }
            Statement { search, replace: slug::clean_url(&replace, config.delimiter, config.normalize_ascii) }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &[Option<&str>])]) -> TagTable {
        let mut table = TagTable::default();
        for (tag, values) in entries {
            table.insert_first_wins(tag, values.iter().map(|v| v.map(str::to_string)).collect());
        }
        table
    }

    #[test]
    fn substitutes_per_occurrence() {
        let rule = PatternRule::new("id.php?news_id=%news_id%", "news-%news_id%-%title%.html");
        let table = table(&[
            ("%news_id%", &[Some("5"), Some("7")]),
            ("%title%", &[Some("Hello World"), Some("Second Post")]),
        ]);

        let statements = build(&rule, &table, 2, &Config::default());
        assert_eq!(statements[0].search, "id.php?news_id=5");
        assert_eq!(statements[0].replace, "news-5-hello-world.html");
        assert_eq!(statements[1].search, "id.php?news_id=7");
        assert_eq!(statements[1].replace, "news-7-second-post.html");
    }

    #[test]
    fn unresolved_tag_stays_literal() {
        let rule = PatternRule::new("id.php?news_id=%news_id%", "news-%news_id%-%title%.html");
        let table = table(&[("%news_id%", &[Some("5")]), ("%title%", &[None])]);

        let statements = build(&rule, &table, 1, &Config::default());
        assert_eq!(statements[0].replace, "news-5-%title%.html");
    }

    #[test]
    fn canonical_side_is_never_cleaned() {
        let rule = PatternRule::new("id.php?q=%q%", "page-%q%");
        let table = table(&[("%q%", &[Some("A B")])]);

        let statements = build(&rule, &table, 1, &Config::default());
        // The query side keeps the raw capture; only the friendly side is slugged.
        assert_eq!(statements[0].search, "id.php?q=A B");
        assert_eq!(statements[0].replace, "page-a-b");
    }
}
