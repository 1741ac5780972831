//! asoflab CLI — point-in-time financial data queries from the terminal.
//!
//! Commands:
//! - `tables` — list loaded relations and their row counts
//! - `fields` — list queryable fields, filtered by category or keyword
//! - `field-info` — show metadata for fields matching a keyword
//! - `query` — run a point-in-time query for tickers and a field
//! - `universe` — list active tickers, optionally by sector/industry
//! - `classifications` — list sector or industry values

mod load;

use anyhow::{Context, Result};
use asoflab_core::params::Params;
use asoflab_core::{listing, FieldSpec, QueryEngine, ResultTable, Value};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "asoflab",
    about = "Point-in-time financial data queries (what was known, when)"
)]
struct Cli {
    /// Directory of semicolon-separated CSV relations.
    #[arg(long, default_value = "data", global = true)]
    data: PathBuf,

    /// Field catalog TOML file.
    #[arg(long, default_value = "meta/fields.toml", global = true)]
    meta: PathBuf,

    /// CSV field delimiter.
    #[arg(long, default_value = ";", global = true)]
    delimiter: char,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List loaded relations and their row counts.
    Tables,
    /// List queryable fields.
    Fields {
        /// Restrict to categories (description, pricing, market, fundamental).
        #[arg(long)]
        category: Vec<String>,
        /// Keyword to match against long and short names.
        #[arg(long)]
        search: Option<String>,
    },
    /// Show full metadata for fields matching a keyword.
    FieldInfo {
        /// Keyword to match against long and short names.
        keyword: String,
    },
    /// Run a point-in-time query.
    Query {
        /// Field long or short name.
        field: String,

        /// Tickers to query (e.g. AAPL MSFT).
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Keyword parameters as key=value (e.g. pt=q as_of_date_end=2023-01-31).
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Emit JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List tickers active as of a date.
    Universe {
        /// As-of date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<String>,

        /// Restrict to these classification values.
        #[arg(long)]
        values: Vec<String>,

        /// Classification level for --values (sector or industry).
        #[arg(long, default_value = "sector")]
        level: String,
    },
    /// List sector or industry classification values.
    Classifications {
        /// Classification level (sector or industry).
        #[arg(long, default_value = "sector")]
        level: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let engine = build_engine(&cli)?;

    match cli.command {
        Commands::Tables => run_tables(&engine),
        Commands::Fields { category, search } => run_fields(&engine, &category, search.as_deref()),
        Commands::FieldInfo { keyword } => run_field_info(&engine, &keyword),
        Commands::Query {
            field,
            tickers,
            params,
            json,
        } => run_query(&engine, &field, &tickers, &params, json),
        Commands::Universe {
            as_of,
            values,
            level,
        } => run_universe(&engine, as_of.as_deref(), &values, &level),
        Commands::Classifications { level } => run_classifications(&engine, &level),
    }
}

fn build_engine(cli: &Cli) -> Result<QueryEngine> {
    let store = load::load_relations(&cli.data, cli.delimiter as u8)?;
    let catalog = load::load_catalog(&cli.meta)?;
    Ok(QueryEngine::new(store, catalog))
}

fn run_tables(engine: &QueryEngine) -> Result<()> {
    println!("{:<24} {:>10}", "Relation", "Rows");
    println!("{}", "-".repeat(35));
    for name in engine.store().names() {
        let rows = engine.store().get(name)?.len();
        println!("{name:<24} {rows:>10}");
    }
    Ok(())
}

fn run_fields(engine: &QueryEngine, categories: &[String], search: Option<&str>) -> Result<()> {
    let catalog = engine.catalog();
    let fields: Vec<&FieldSpec> = if let Some(keyword) = search {
        catalog.search(keyword)
    } else if !categories.is_empty() {
        let cats: Vec<&str> = categories.iter().map(String::as_str).collect();
        catalog.fields_by_category(&cats)
    } else {
        catalog.fields().iter().collect()
    };

    println!(
        "{:<28} {:<14} {:<12} Quick Document",
        "Long Name", "Short Name", "Category"
    );
    println!("{}", "-".repeat(80));
    for f in fields {
        println!(
            "{:<28} {:<14} {:<12} {}",
            f.long_name,
            f.short_name,
            f.strategy().name(),
            f.doc
        );
    }
    Ok(())
}

fn run_field_info(engine: &QueryEngine, keyword: &str) -> Result<()> {
    let matches = engine.catalog().search(keyword);
    if matches.is_empty() {
        println!("No field matches '{keyword}'.");
        return Ok(());
    }
    for f in matches {
        println!("{} ({})", f.long_name, f.short_name);
        println!("  Parameters: {}", f.params_doc);
        println!("  {}\n", f.doc);
    }
    Ok(())
}

fn run_query(
    engine: &QueryEngine,
    field: &str,
    tickers: &[String],
    raw_params: &[String],
    json: bool,
) -> Result<()> {
    let mut params = Params::new();
    for raw in raw_params {
        let (key, value) = raw
            .split_once('=')
            .with_context(|| format!("parameter '{raw}' is not key=value"))?;
        params.insert(key, value);
    }

    let result = engine.get_data(tickers, field, &params)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_table(&result);
    }
    Ok(())
}

fn run_universe(
    engine: &QueryEngine,
    as_of: Option<&str>,
    values: &[String],
    level: &str,
) -> Result<()> {
    let as_of = parse_as_of(as_of)?;
    let tickers = if values.is_empty() {
        listing::all_tickers(engine.store(), as_of)?
    } else {
        listing::tickers_by_classification(engine.store(), values, level, as_of)?
    };
    for t in tickers {
        println!("{t}");
    }
    Ok(())
}

fn run_classifications(engine: &QueryEngine, level: &str) -> Result<()> {
    for v in listing::classification_values(engine.store(), level)? {
        println!("{v}");
    }
    Ok(())
}

fn parse_as_of(as_of: Option<&str>) -> Result<NaiveDate> {
    match as_of {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("as-of date '{s}' is not YYYY-MM-DD")),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn print_table(result: &ResultTable) {
    let mut widths: Vec<usize> = result.columns().iter().map(String::len).collect();
    let mut ticker_width = "Ticker".len();

    let rendered: Vec<(String, Vec<String>)> = result
        .index()
        .iter()
        .zip(result.rows())
        .map(|(ticker, row)| {
            ticker_width = ticker_width.max(ticker.len());
            let cells: Vec<String> = row.iter().map(render_cell).collect();
            for (w, cell) in widths.iter_mut().zip(&cells) {
                *w = (*w).max(cell.len());
            }
            (ticker.clone(), cells)
        })
        .collect();

    print!("{:<ticker_width$}", "Ticker");
    for (name, w) in result.columns().iter().zip(widths.iter().copied()) {
        print!("  {name:<w$}");
    }
    println!();
    println!(
        "{}",
        "-".repeat(ticker_width + widths.iter().map(|w| w + 2).sum::<usize>())
    );
    for (ticker, cells) in rendered {
        print!("{ticker:<ticker_width$}");
        for (cell, w) in cells.iter().zip(widths.iter().copied()) {
            print!("  {cell:<w$}");
        }
        println!();
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
