// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cloud_dependency_explorer::{
    Catalog, CompanyRecord, Config, Explorer, FilterState, HttpClassifier, Provider,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cloud-explorer")]
#[command(about = "Which cloud provider runs the internet's biggest companies", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ./cloud-explorer.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Provider detection endpoint
    #[arg(long, global = true)]
    classifier_url: Option<String>,

    /// CSV replacing the built-in catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Write logs to this file (the TUI owns the terminal)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive dashboard (default)
    Tui,
    /// Print the companies matching a filter
    List {
        /// Case-insensitive name search
        #[arg(short, long, default_value = "")]
        query: String,
        /// Only this provider
        #[arg(short, long)]
        provider: Option<Provider>,
        /// Preview a provider (overrides query and provider)
        #[arg(long)]
        hover: Option<Provider>,
    },
    /// Print provider counts and the Big 3 share
    Stats,
    /// Detect the provider of a domain and print the new record
    Add {
        /// e.g. https://www.stripe.com
        url: String,
    },
    /// Write the catalog to CSV
    Export {
        #[arg(short, long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Commands::Tui));
    init_logging(cli.log_file.as_deref(), interactive)?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.classifier_url {
        config.classifier.endpoint = url;
    }
    if let Some(path) = cli.catalog {
        config.dashboard.catalog_path = Some(path);
    }

    let catalog = load_catalog(&config)?;
    let explorer = Explorer::new(&catalog).with_big_three(config.dashboard.big_three.clone());

    match cli.command {
        None | Some(Commands::Tui) => run_ui_mode(explorer, &config)?,
        Some(Commands::List { query, provider, hover }) => {
            let mut state = FilterState::new().with_query(&query);
            state.selected_provider = provider;
            state.hovered_provider = hover;
            run_list(&explorer, &state);
        }
        Some(Commands::Stats) => run_stats(&explorer),
        Some(Commands::Add { url }) => run_add(explorer, &config, &url)?,
        Some(Commands::Export { out }) => run_export(&explorer, &out)?,
    }

    Ok(())
}

fn init_logging(log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let default_level = if log_file.is_some() { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {:?}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        // Logging to stderr would tear the alternate screen
        None if interactive => {}
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

fn load_catalog(config: &Config) -> Result<Catalog> {
    match &config.dashboard.catalog_path {
        Some(path) => Catalog::from_csv_path(path)
            .with_context(|| format!("Failed to load catalog {:?}", path)),
        None => Ok(Catalog::builtin()),
    }
}

fn print_record(company: &CompanyRecord) {
    println!(
        "  {:<24} {:<8} {:<26} {}",
        company.name, company.symbol, company.domain, company.provider
    );
}

fn run_list(explorer: &Explorer, state: &FilterState) {
    let companies = explorer.visible_with(state);

    println!(
        "📋 {} ({})",
        cloud_dependency_explorer::explorer::heading_for(state),
        companies.len()
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for company in companies {
        print_record(company);
    }

    if state.hovered_provider.is_none() && explorer.offers_add_for(&state.query) {
        println!("\n💡 No match. Add it with: cloud-explorer add {}", state.query.trim());
    }
}

fn run_stats(explorer: &Explorer) {
    let stats = explorer.stats();

    println!("☁️  Cloud Provider Market Share");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for share in &stats.providers {
        println!(
            "  {:<8} {:>4}  {:>3}%  {}",
            share.provider.as_str(),
            share.count,
            share.percent,
            "█".repeat(share.percent as usize / 2)
        );
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Total companies: {}", stats.total);
    println!("  The Big 3 control {}%", stats.big_three_share);
}

fn run_add(mut explorer: Explorer, config: &Config, url: &str) -> Result<()> {
    let classifier = HttpClassifier::new(&config.classifier.endpoint, config.classifier.timeout())?;
    let runtime = tokio::runtime::Runtime::new()?;

    println!("🔍 Detecting cloud provider via {}...", classifier.endpoint());
    let record = runtime.block_on(explorer.add_company(url, &classifier))?;

    println!("✅ Added");
    print_record(&record);
    Ok(())
}

fn run_export(explorer: &Explorer, out: &Path) -> Result<()> {
    let file = File::create(out).with_context(|| format!("Failed to create {:?}", out))?;
    explorer.catalog().write_csv(file)?;

    println!("✓ Wrote {} companies to {:?}", explorer.catalog().len(), out);
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(explorer: Explorer, config: &Config) -> Result<()> {
    let classifier = HttpClassifier::new(&config.classifier.endpoint, config.classifier.timeout())?;

    let mut app = ui::App::new(explorer, std::sync::Arc::new(classifier))?;
    ui::run_ui(&mut app)?;

    println!("✅ Dashboard closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_explorer: Explorer, _config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web dashboard: cargo run --bin explorer-server --features server");
    std::process::exit(1);
}
