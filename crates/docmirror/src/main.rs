use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use docmirror_core::client::{HttpFetcher, PageFetcher};
use docmirror_core::config::{MirrorConfig, load_config};
use docmirror_core::mirror::{UNCATEGORIZED_SLUG, clean_output, mirror_pages};
use docmirror_core::report::{now_utc_string, render_index};
use docmirror_core::sitemap::documentation_urls;
use docmirror_core::taxonomy::parse_navigation;

const DEFAULT_CONFIG_FILE: &str = "docmirror.toml";

#[derive(Debug, Parser)]
#[command(
    name = "docmirror",
    version,
    about = "Mirror a remote documentation site into a categorized local tree"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Config file (default: docmirror.toml)"
    )]
    config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        help = "Override the output docs directory"
    )]
    output: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Full mirror run: sitemap, taxonomy, fetch, rewrite, index")]
    Sync,
    #[command(about = "Fetch and print the navigation taxonomy without writing anything")]
    Taxonomy(TaxonomyArgs),
}

#[derive(Debug, Args)]
struct TaxonomyArgs {
    #[arg(long, help = "Print the category tree as JSON")]
    json: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = load_config(&config_path)?;
    // Flag beats env beats config file.
    let docs_dir = cli
        .output
        .clone()
        .map(|path| path.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|| config.docs_dir());

    match cli.command {
        Some(Commands::Sync) => run_sync(&config, &docs_dir),
        Some(Commands::Taxonomy(args)) => run_taxonomy(&config, &args),
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn run_sync(config: &MirrorConfig, docs_dir_name: &str) -> Result<()> {
    let base_url = config.base_url();
    let docs_prefix = config.docs_prefix();
    let docs_dir = PathBuf::from(docs_dir_name);
    let index_file = PathBuf::from(config.index_file());
    let fetcher = HttpFetcher::new(config)?;

    let sitemap_url = config.sitemap_url();
    println!("sitemap: fetching {sitemap_url}");
    let sitemap_xml = fetcher
        .fetch_text(&sitemap_url)
        .context("failed to fetch the sitemap")?;
    let urls = documentation_urls(&sitemap_xml, &base_url, &docs_prefix)?;
    println!("sitemap: {} documentation pages", urls.len());

    let nav_url = config.nav_page_url();
    println!("taxonomy: fetching {nav_url}");
    let nav_markup = fetcher
        .fetch_text(&nav_url)
        .context("failed to fetch the navigation page")?;
    let taxonomy = parse_navigation(&nav_markup, &base_url);
    println!(
        "taxonomy: {} categories, {} indexed pages",
        taxonomy.categories.len(),
        taxonomy.index.len()
    );

    clean_output(&docs_dir, &index_file)?;
    println!("clean: reset {}", docs_dir.display());

    let outcome = mirror_pages(&urls, &taxonomy, &fetcher, &docs_dir, &docs_prefix)?;
    for warning in &outcome.warnings {
        eprintln!("  ! {warning}");
    }
    for failure in &outcome.failures {
        eprintln!("  ! failed {}: {}", failure.url, failure.reason);
    }
    println!(
        "mirror: {} pages written ({} in {UNCATEGORIZED_SLUG}/)",
        outcome.pages_written,
        outcome.others.len()
    );

    let index = render_index(
        &config.index_title(),
        &format!("{base_url}{docs_prefix}"),
        docs_dir_name,
        &taxonomy.categories,
        &outcome.others,
        &now_utc_string(),
    );
    fs::write(&index_file, index)
        .with_context(|| format!("failed to write {}", index_file.display()))?;
    println!("index: wrote {}", index_file.display());

    println!(
        "done: {} pages, {} unresolved links, {} page failures",
        outcome.pages_written,
        outcome.warnings.len(),
        outcome.failures.len()
    );
    Ok(())
}

fn run_taxonomy(config: &MirrorConfig, args: &TaxonomyArgs) -> Result<()> {
    let fetcher = HttpFetcher::new(config)?;
    let nav_url = config.nav_page_url();
    let nav_markup = fetcher
        .fetch_text(&nav_url)
        .context("failed to fetch the navigation page")?;
    let taxonomy = parse_navigation(&nav_markup, &config.base_url());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&taxonomy.categories)?);
        return Ok(());
    }

    for category in &taxonomy.categories {
        println!("{} ({})", category.title, category.slug);
        for file in &category.files {
            println!("  - {} [{}]", file.title, file.slug);
        }
    }
    println!(
        "total: {} categories, {} indexed pages",
        taxonomy.categories.len(),
        taxonomy.index.len()
    );
    Ok(())
}
