use relink::{
    Config, Engine, FetchError, HandlerContribution, PatternRule, RowFetcher, RowQuery, Rows, StaticSource,
    TableLookup,
};
use std::io::{self, IsTerminal, Read};

fn main() {
    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let input = match cli.input {
        Some(input) => input,
        None => {
            if io::stdin().is_terminal() {
                eprintln!("error: no input; pass -i <text> or pipe something in");
                std::process::exit(2);
            }
            let mut buf = String::new();
            if io::stdin().read_to_string(&mut buf).is_err() {
                eprintln!("error: could not read stdin");
                std::process::exit(2);
            }
            buf.trim_end().to_string()
        }
    };

    let config = Config { site_url: cli.site_url, normalize_ascii: cli.normalize, ..Config::default() };
    let mut engine = Engine::new(config, DemoRows);
    engine.load(&demo_source());

    match cli.mode {
        Mode::Outbound => println!("{}", engine.rewrite_outbound(&input)),
        Mode::Inbound => match engine.resolve_inbound(&input) {
            Some(target) => println!("301 {target}"),
            None => println!("passthrough"),
        },
        Mode::Enforce => match engine.enforce_friendly(&input) {
            Some(target) => println!("301 {target}"),
            None => println!("passthrough"),
        },
    }

    for query in engine.queries() {
        eprintln!("query: {} {} in ({})", query.table, query.key_column, query.ids.join(","));
    }
    for warning in engine.warnings() {
        eprintln!("warning: {warning}");
    }
}

enum Mode {
    Outbound,
    Inbound,
    Enforce,
}

struct Cli {
    mode: Mode,
    input: Option<String>,
    site_url: String,
    normalize: bool,
}

fn parse_args() -> Result<Cli, String> {
    let mut mode = Mode::Outbound;
    let mut input: Option<String> = None;
    let mut site_url = String::new();
    let mut normalize = false;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("relink {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--mode" => {
                let value = args.next().ok_or_else(|| "error: --mode expects a value".to_string())?;
                mode = match value.as_str() {
                    "outbound" => Mode::Outbound,
                    "inbound" => Mode::Inbound,
                    "enforce" => Mode::Enforce,
                    other => return Err(format!("error: unknown mode `{other}`")),
                };
            }
            "--site" => {
                site_url = args.next().ok_or_else(|| "error: --site expects a value".to_string())?;
            }
            "--normalize" => normalize = true,
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value);
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.is_empty() {
                    input = Some(rest);
                }
                break;
            }
            other if input.is_none() && !other.starts_with('-') => input = Some(other.to_string()),
            other => return Err(format!("error: unknown argument `{other}`")),
        }
    }

    Ok(Cli { mode, input, site_url, normalize })
}

fn print_help() {
    println!(
        "relink - permalink rewrite scratchpad

USAGE:
    relink [--mode outbound|inbound|enforce] [--site URL] [--normalize] [-i TEXT]

The built-in demo registry knows two handlers:
    news:     id.php?news_id=%news_id%      -> news-%news_id%-%title%.html
    articles: article.php?id=%article_id%   -> article-%article_id%-%title%.html

EXAMPLES:
    relink -i \"<a href='id.php?news_id=5'>read</a>\"
    relink --mode inbound -i news-5-hello-world.html
    relink --mode enforce -i id.php?news_id=5"
    );
}

fn demo_source() -> StaticSource {
    StaticSource::new()
        .with(
            "news",
            HandlerContribution {
                rules: vec![PatternRule::new("id.php?news_id=%news_id%", "news-%news_id%-%title%.html")],
                overrides: vec![("%news_id%".to_string(), "[0-9]+".to_string())],
                lookups: vec![(
                    "%news_id%".to_string(),
                    TableLookup {
                        table: "news".to_string(),
                        primary_key: "news_id".to_string(),
                        columns: vec![("%title%".to_string(), "news_subject".to_string())],
                        filter: None,
                    },
                )],
            },
        )
        .with(
            "articles",
            HandlerContribution {
                rules: vec![PatternRule::new("article.php?id=%article_id%", "article-%article_id%-%title%.html")],
                overrides: vec![("%article_id%".to_string(), "[0-9]+".to_string())],
                lookups: vec![(
                    "%article_id%".to_string(),
                    TableLookup {
                        table: "articles".to_string(),
                        primary_key: "article_id".to_string(),
                        columns: vec![("%title%".to_string(), "article_subject".to_string())],
                        filter: None,
                    },
                )],
            },
        )
}

/// Canned rows so the demo resolves something without a database.
struct DemoRows;

impl RowFetcher for DemoRows {
    fn fetch_rows(&self, query: &RowQuery) -> Result<Rows, FetchError> {
        let subject = |id: &str, kind: &str| format!("{kind} number {id}");
        let mut rows = Rows::default();
        for id in &query.ids {
            let value = match query.table.as_str() {
                "news" => ("news_subject", subject(id, "News")),
                "articles" => ("article_subject", subject(id, "Article")),
                _ => continue,
            };
            rows.insert(id.clone(), [(value.0.to_string(), value.1)].into_iter().collect());
        }
        Ok(rows)
    }
}
