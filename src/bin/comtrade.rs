use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Args, Parser, Subcommand, ValueEnum};
use comtrade_rs::query::{Frequency, TradeRegime};
use comtrade_rs::{Client, TradeQuery, TradeTable, YearRange};
use comtrade_rs::{stats, storage};
use num_format::{Locale, ToFormattedString};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "comtrade",
    version,
    about = "Fetch UN Comtrade trade flows and derive bilateral net exports"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the API calls a query would issue, without running them.
    Urls(QueryArgs),
    /// Fetch data, derive net exports (and optionally save and print stats).
    Get(GetArgs),
    /// Fetch the per-chapter (AG2) breakdown for the last year of the range.
    Breakdown(GetArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RegimeArg {
    All,
    Imports,
    Exports,
    ReExports,
    ReImports,
}

impl From<RegimeArg> for TradeRegime {
    fn from(r: RegimeArg) -> Self {
        match r {
            RegimeArg::All => TradeRegime::All,
            RegimeArg::Imports => TradeRegime::Imports,
            RegimeArg::Exports => TradeRegime::Exports,
            RegimeArg::ReExports => TradeRegime::ReExports,
            RegimeArg::ReImports => TradeRegime::ReImports,
        }
    }
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Load the query from a JSON file; other query flags override its fields.
    #[arg(long)]
    query: Option<PathBuf>,
    /// Reporter codes separated by comma or semicolon (e.g., 842,124)
    #[arg(short, long)]
    reporters: Option<String>,
    /// Partner codes separated by comma or semicolon (default 0 = World)
    #[arg(short, long)]
    partners: Option<String>,
    /// Commodity codes separated by comma or semicolon (default TOTAL)
    #[arg(short, long)]
    commodities: Option<String>,
    /// Year (YYYY) or half-open range (YYYY:YYYY). Defaults to the last five years.
    #[arg(short, long)]
    years: Option<String>,
    /// Product classification (e.g., HS, H4, S3)
    #[arg(long)]
    classification: Option<String>,
    /// Trade regime filter.
    #[arg(long, value_enum)]
    regime: Option<RegimeArg>,
    /// Request monthly instead of annual data.
    #[arg(long, default_value_t = false)]
    monthly: bool,
    /// API root (default: public Comtrade endpoint).
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Args, Debug)]
struct GetArgs {
    #[command(flatten)]
    query: QueryArgs,
    /// Save results to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Print grouped statistics to stdout.
    #[arg(long, default_value_t = false)]
    stats: bool,
    /// Locale for number formatting in stats (en, de, fr, ...).
    #[arg(long, default_value = "en")]
    locale: String,
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Last five complete years.
fn default_years() -> YearRange {
    let this_year = chrono::Local::now().year();
    YearRange::new(this_year - 5, this_year)
}

fn map_locale(tag: &str) -> &'static Locale {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => &Locale::de,
        "fr" | "fr_fr" => &Locale::fr,
        "es" | "es_es" => &Locale::es,
        "it" | "it_it" => &Locale::it,
        "pt" | "pt_pt" | "pt_br" => &Locale::pt,
        "nl" | "nl_nl" => &Locale::nl,
        _ => &Locale::en,
    }
}

fn fmt_value(v: f64, locale: &Locale) -> String {
    if v.is_finite() {
        (v.round() as i64).to_formatted_string(locale)
    } else {
        "NA".to_string()
    }
}

impl QueryArgs {
    fn build(&self) -> Result<TradeQuery> {
        let mut q = match &self.query {
            Some(path) => {
                let txt = std::fs::read_to_string(path)
                    .with_context(|| format!("read {}", path.display()))?;
                serde_json::from_str::<TradeQuery>(&txt)
                    .with_context(|| format!("parse query {}", path.display()))?
            }
            None => {
                let reporters = self.reporters.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("--reporters is required unless --query is given")
                })?;
                TradeQuery::new(parse_list(reporters), ["0"], ["TOTAL"], default_years())
            }
        };
        if let Some(r) = &self.reporters {
            q.reporters = parse_list(r);
        }
        if let Some(p) = &self.partners {
            q.partners = parse_list(p);
        }
        if let Some(c) = &self.commodities {
            q.commodities = parse_list(c);
        }
        if let Some(y) = &self.years {
            q.years = YearRange::parse(y)?;
        }
        if let Some(px) = &self.classification {
            q.classification = px.clone();
        }
        if let Some(rg) = self.regime {
            q.regime = rg.into();
        }
        if self.monthly {
            q.frequency = Frequency::Monthly;
        }
        q.validate()?;
        Ok(q)
    }

    fn client(&self) -> Client {
        match &self.base_url {
            Some(url) => Client::with_base_url(url.clone()),
            None => Client::default(),
        }
    }
}

fn main() -> Result<()> {
    // warnings carry the API's diagnostics (empty datasets, failed calls)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Urls(args) => cmd_urls(args),
        Command::Get(args) => cmd_get(args, false),
        Command::Breakdown(args) => cmd_get(args, true),
    }
}

fn cmd_urls(args: QueryArgs) -> Result<()> {
    let query = args.build()?;
    println!("UN Comtrade API calls:");
    for url in args.client().urls(&query)? {
        println!("{}", url);
    }
    Ok(())
}

fn cmd_get(args: GetArgs, breakdown: bool) -> Result<()> {
    let query = args.query.build()?;
    let client = args.query.client();

    let table = if breakdown {
        client.fetch_breakdown(&query)?
    } else {
        client.fetch_report(&query)?
    };
    eprintln!("Fetched {} rows", table.len());

    if let Some(path) = args.out.as_ref() {
        let fmt = match args.format {
            Some(OutFormat::Csv) => "csv",
            Some(OutFormat::Json) => "json",
            None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
        }
        .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_csv(&table, path)?,
            "json" => storage::save_json(&table, path)?,
            other => anyhow::bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} rows to {}", table.len(), path.display());
    }

    if args.stats {
        print_stats(&table, map_locale(&args.locale));
    }

    Ok(())
}

fn print_stats(table: &TradeTable, locale: &Locale) {
    for s in stats::grouped_summary(table) {
        println!(
            "{} -> {}  {}  years={}..{}  count={}  total={} min={} max={} mean={} median={}",
            s.key.reporter_code,
            s.key.partner_code,
            s.key.flow,
            s.first_year,
            s.last_year,
            s.count,
            fmt_value(s.total, locale),
            fmt_value(s.min, locale),
            fmt_value(s.max, locale),
            fmt_value(s.mean, locale),
            fmt_value(s.median, locale),
        );
    }
}
