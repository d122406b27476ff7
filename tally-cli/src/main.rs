use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tally_core::query::{self, DEFAULT_PAGE_LIMIT, TransactionQuery};
use tally_core::time::{BoundSide, parse_date_bound, parse_timezone};
use tally_core::{
    Category, Granularity, MemoryStore, RecentTransaction, TransactionDraft, TransactionStore,
    TransactionType, breakdown_by_category, bucket_trends_in, summarize,
};
use tally_parse::{
    CompletionConfig, HeuristicParser, HttpCompleter, LlmParser, ParseError, Provider,
    TransactionParser,
};

mod auth;
mod config;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version,
    about = "Personal finance tracker: parse transactions, summarize spending"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Shared input and scoping flags for commands that read stored transactions
#[derive(clap::Args, Debug)]
struct Source {
    /// Transactions file (.json array of records, or .csv)
    #[arg(long)]
    file: PathBuf,

    /// Owner to scope to (default: analytics.owner from config)
    #[arg(long)]
    owner: Option<String>,
}

#[derive(clap::Args, Debug)]
struct Range {
    /// Inclusive start, YYYY-MM-DD or RFC 3339
    #[arg(long)]
    start: Option<String>,

    /// Inclusive end, YYYY-MM-DD or RFC 3339
    #[arg(long)]
    end: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse free text into a transaction draft
    Parse {
        /// e.g. "Bought coffee for $5.50"
        text: String,

        /// Use the keyword heuristic instead of the LLM
        #[arg(long)]
        heuristic: bool,

        /// Transactions file whose newest entries give the model context
        #[arg(long)]
        recent: Option<PathBuf>,
    },

    /// List transactions, newest first
    List {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        range: Range,
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: usize,
    },

    /// Income, expenses, savings, and savings rate
    Summary {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        range: Range,
    },

    /// Totals per category, largest first
    Categories {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        range: Range,
        /// income or expense (default: expense)
        #[arg(long = "type")]
        kind: Option<String>,
    },

    /// Income/expense totals per day or month
    Trends {
        #[command(flatten)]
        source: Source,
        /// daily or monthly
        #[arg(long, default_value = "daily")]
        period: String,
        /// Look-back window in days (default: analytics.trend_days from config)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.tally/config.toml with defaults
    Init,
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;

    let env = env_logger::Env::default().default_filter_or(cfg.log.level.as_str());
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Command::Parse { text, heuristic, recent } => {
            let recent = match recent {
                Some(path) => load_recent(&path, &owner_or_default(None, &cfg))?,
                None => Vec::new(),
            };
            let parser = build_parser(&cfg, heuristic)?;
            let parsed = match parser.parse(&text, &recent) {
                Ok(draft) => draft,
                Err(ParseError::InvalidInput) => bail!("input is required"),
            };
            print_json(&ParseOutput {
                parsed,
                original_input: &text,
            })?;
        }

        Command::List {
            source,
            range,
            category,
            kind,
            page,
            limit,
        } => {
            let (store, owner) = load_source(&source, &cfg)?;
            let q = range_query(owner, &range)?
                .with_category(category.as_deref().map(parse_category).transpose()?)
                .with_kind(kind.as_deref().map(parse_kind).transpose()?);
            print_json(&query::list(store.records(), &q, page, limit))?;
        }

        Command::Summary { source, range } => {
            let (store, owner) = load_source(&source, &cfg)?;
            let q = range_query(owner, &range)?;
            print_json(&summarize(&store.find(&q)))?;
        }

        Command::Categories { source, range, kind } => {
            let (store, owner) = load_source(&source, &cfg)?;
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            let bounds = range_query(owner.clone(), &range)?;
            let q = TransactionQuery::for_categories(owner, kind).between(bounds.start, bounds.end);
            print_json(&breakdown_by_category(&store.find(&q)))?;
        }

        Command::Trends { source, period, days } => {
            let (store, owner) = load_source(&source, &cfg)?;
            let days = days.unwrap_or(cfg.analytics.trend_days);
            let tz = parse_timezone(&cfg.analytics.timezone)?;
            let q = TransactionQuery::trend_window(owner, Utc::now(), days);
            let granularity = Granularity::from_period(&period);
            print_json(&bucket_trends_in(&store.find(&q), granularity, &tz))?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                println!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParseOutput<'a> {
    parsed: TransactionDraft,
    original_input: &'a str,
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Heuristic parser when asked for, or when no credentials are configured;
/// otherwise the LLM parser over HTTP.
fn build_parser(cfg: &Config, heuristic: bool) -> Result<Box<dyn TransactionParser>> {
    if heuristic {
        return Ok(Box::new(HeuristicParser::new()));
    }

    let provider = Provider::from_name(&cfg.llm.provider)?;
    let Some(api_key) = auth::api_key(provider)? else {
        log::info!("no {:?} credentials found; using heuristic parser", provider);
        return Ok(Box::new(HeuristicParser::new()));
    };

    let completer = HttpCompleter::new(CompletionConfig {
        provider,
        model: cfg.llm.model.clone(),
        base_url: cfg
            .llm
            .base_url
            .clone()
            .unwrap_or_else(|| provider.default_base_url().to_string()),
        api_key,
        timeout: cfg.llm.timeout(),
        max_tokens: cfg.llm.max_tokens,
    })?;
    Ok(Box::new(LlmParser::new(completer)))
}

fn owner_or_default(owner: Option<&str>, cfg: &Config) -> String {
    owner.unwrap_or(&cfg.analytics.owner).to_string()
}

fn load_source(source: &Source, cfg: &Config) -> Result<(MemoryStore, String)> {
    let owner = owner_or_default(source.owner.as_deref(), cfg);
    if !source.file.exists() {
        bail!("file not found: {} (pass --file <path>)", source.file.display());
    }
    let txns = tally_ingest::load_path(&source.file, &owner)?;
    Ok((MemoryStore::with_records(txns), owner))
}

/// The owner's five newest transactions as parser context.
fn load_recent(path: &Path, owner: &str) -> Result<Vec<RecentTransaction>> {
    let txns = tally_ingest::load_path(path, owner)?;
    let newest = query::list(&txns, &TransactionQuery::for_owner(owner), 1, 5);
    Ok(newest.transactions.iter().map(RecentTransaction::from).collect())
}

fn range_query(owner: String, range: &Range) -> Result<TransactionQuery> {
    let start = range
        .start
        .as_deref()
        .map(|s| parse_date_bound(s, BoundSide::Start))
        .transpose()?;
    let end = range
        .end
        .as_deref()
        .map(|s| parse_date_bound(s, BoundSide::End))
        .transpose()?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            bail!("--start must not be after --end");
        }
    }
    Ok(TransactionQuery::for_owner(owner).between(start, end))
}

fn parse_category(s: &str) -> Result<Category> {
    Category::from_name(s).with_context(|| format!("unknown category: {s}"))
}

fn parse_kind(s: &str) -> Result<TransactionType> {
    TransactionType::from_name(s)
        .with_context(|| format!("type must be income or expense, got {s}"))
}
