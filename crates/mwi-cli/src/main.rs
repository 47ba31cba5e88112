//! `mwi` — command-line entry point (spec.md §6). One `Commands` enum per
//! verb family, each arm a thin adapter into the crate that owns the
//! behavior. Exit codes follow spec.md §6's inverted convention: `1` on
//! success, `0` on failure.

mod crawl;
mod process_extractor;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use mwi_core::{config::parse_csv, Config, Error, Expression, Land, Result};
use mwi_dictionary::{rescore_land, stemmer_for_lang};
use mwi_enrich::{apply_heuristics, DomainEnricher, HeuristicRule};
use mwi_fetch::{FetchConfig, Fetcher};
use mwi_gate::RelevanceGate;
use mwi_media::{AnalyzeFilter, MediaAnalyzer};
use mwi_readable::{MergeStrategy, Refiner};
use mwi_store::{SqliteStore, Store};
use tracing_subscriber::EnvFilter;

use crate::crawl::{crawl_land, CrawlOptions};
use crate::process_extractor::ProcessExtractor;

#[derive(Parser)]
#[command(name = "mwi", about = "Crawl, score, and refine a bounded web corpus")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Database lifecycle.
    Db {
        #[command(subcommand)]
        action: DbCommand,
    },
    /// Land (research project) lifecycle and crawl operations.
    Land {
        #[command(subcommand)]
        action: LandCommand,
    },
    /// Domain Enricher operations.
    Domain {
        #[command(subcommand)]
        action: DomainCommand,
    },
    /// Host-normalization heuristics.
    Heuristic {
        #[command(subcommand)]
        action: HeuristicCommand,
    },
}

#[derive(Subcommand)]
enum DbCommand {
    /// Create the database file and apply the schema if absent.
    Setup,
}

#[derive(Subcommand)]
enum LandCommand {
    Create {
        name: String,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        lang: Option<String>,
    },
    List {
        #[arg(long)]
        name: Option<String>,
    },
    Addterm {
        land: String,
        terms: String,
    },
    Addurl {
        land: String,
        #[arg(long)]
        urls: Option<String>,
        #[arg(long)]
        path: Option<String>,
    },
    Crawl {
        name: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        http: Option<String>,
        #[arg(long)]
        depth: Option<i32>,
    },
    Readable {
        name: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        depth: Option<i32>,
        #[arg(long, default_value = "smart_merge")]
        merge: String,
    },
    Consolidate {
        name: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        depth: Option<i32>,
    },
    Delete {
        name: String,
        #[arg(long)]
        maxrel: Option<f64>,
    },
    Medianalyse {
        name: String,
        #[arg(long)]
        depth: Option<i32>,
        #[arg(long)]
        minrel: Option<i64>,
    },
}

#[derive(Subcommand)]
enum DomainCommand {
    Crawl {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        http: Option<String>,
    },
}

#[derive(Subcommand)]
enum HeuristicCommand {
    Update,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(message) => {
            println!("{message}");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(0);
        }
    }
}

async fn run(command: Command) -> Result<String> {
    let config = Config::from_env();
    let store = open_store().await?;

    match command {
        Command::Db { action: DbCommand::Setup } => Ok("database ready".to_string()),

        Command::Land { action } => run_land(&store, &config, action).await,
        Command::Domain { action: DomainCommand::Crawl { limit, http } } => run_domain_crawl(&store, &config, limit, http).await,
        Command::Heuristic { action: HeuristicCommand::Update } => {
            let rules = HeuristicRule::default_rules();
            let lands = store.list_lands(None).await.map_err(Error::from)?;
            let mut rekeyed = 0usize;
            for land in &lands {
                let stats = apply_heuristics(&store, land, &rules).await.map_err(Error::from)?;
                rekeyed += stats.rekeyed;
            }
            Ok(format!("applied heuristics across {} land(s), {rekeyed} expression(s) rekeyed", lands.len()))
        }
    }
}

async fn run_land(store: &SqliteStore, config: &Config, action: LandCommand) -> Result<String> {
    match action {
        LandCommand::Create { name, desc, lang } => {
            if store.get_land(&name).await.map_err(Error::from)?.is_some() {
                return Err(Error::InvalidArgument(format!("land already exists: {name}")));
            }
            let land = store.create_land(Land::new(name, desc, lang)).await.map_err(Error::from)?;
            Ok(format!("created land '{}' (id {})", land.name, land.id.unwrap_or_default()))
        }

        LandCommand::List { name } => {
            let lands = store.list_lands(name.as_deref()).await.map_err(Error::from)?;
            for land in &lands {
                println!("{}\t{}\t{}", land.id.unwrap_or_default(), land.name, land.lang);
            }
            Ok(format!("{} land(s)", lands.len()))
        }

        LandCommand::Addterm { land, terms } => {
            let land = get_land(store, &land).await?;
            let stemmer = stemmer_for_lang(&land.lang);
            for term in parse_csv(&terms) {
                let lemma = stemmer.stem(&mwi_dictionary::fold(&term));
                let word = store.add_word_if_absent(&term, &lemma).await.map_err(Error::from)?;
                store
                    .link_land_word(land.id.ok_or_else(|| Error::Internal("land has no id".into()))?, word.id.unwrap_or_default())
                    .await
                    .map_err(Error::from)?;
            }
            let stats = rescore_land(store, &land).await?;
            Ok(format!("added term(s), rescored {} expression(s), {} changed", stats.processed, stats.changed))
        }

        LandCommand::Addurl { land, urls, path } => {
            let land = get_land(store, &land).await?;
            let land_id = land.id.ok_or_else(|| Error::Internal("land has no id".into()))?;
            let collected = collect_seed_urls(urls, path)?;
            let mut added = 0usize;
            for url in collected {
                store.upsert_expression(Expression::seed(land_id, url)).await.map_err(Error::from)?;
                added += 1;
            }
            Ok(format!("added {added} seed url(s) to land '{}'", land.name))
        }

        LandCommand::Crawl { name, limit, http, depth } => {
            let land = get_land(store, &name).await?;
            let fetcher = Fetcher::new(FetchConfig::from_core(config)).map_err(|e| Error::Network(e.to_string()))?;
            let gate = build_gate(config);
            let options = CrawlOptions {
                concurrency: config.fetch_concurrency,
                discovery_depth_cap: config.link_depth_cap,
                max_fetch_depth: depth,
                limit,
                http_status_filter: http,
            };
            let stats = crawl_land(store, &land, &fetcher, gate.as_ref(), &options).await?;
            Ok(format!(
                "crawled '{}': fetched {}, approved {}, rejected {}, failed {}",
                land.name, stats.fetched, stats.approved, stats.rejected, stats.failed
            ))
        }

        LandCommand::Readable { name, limit: _, depth: _, merge } => {
            let land = get_land(store, &name).await?;
            let strategy = MergeStrategy::parse(&merge)?;
            let Some(binary_path) = std::env::var("MWI_READABLE_EXTRACTOR_PATH").ok().filter(|v| !v.is_empty()) else {
                return Err(Error::InvalidArgument("MWI_READABLE_EXTRACTOR_PATH is not configured".into()));
            };
            let extractor = Arc::new(ProcessExtractor::new(binary_path, config.readable_timeout_secs));
            let refiner = Refiner::new(extractor, config.readable_retries, config.readable_batch_size);
            let stats = refiner.refine_land(store, &land, strategy).await?;
            Ok(format!(
                "refined '{}': processed {}, updated {}, skipped {}, errors {}",
                land.name, stats.processed, stats.updated, stats.skipped, stats.errors
            ))
        }

        LandCommand::Consolidate { name, limit, depth } => {
            let land = get_land(store, &name).await?;
            let options = mwi_consolidate::ConsolidateOptions { max_depth: depth, limit };
            let stats = mwi_consolidate::consolidate_land(store, &land, &options).await.map_err(Error::from)?;
            Ok(format!(
                "consolidated '{}': processed {}, links +{}, media +{}, rescored {}",
                land.name, stats.processed, stats.links_added, stats.media_added, stats.rescored
            ))
        }

        LandCommand::Delete { name, maxrel } => {
            let land = get_land(store, &name).await?;
            let land_id = land.id.ok_or_else(|| Error::Internal("land has no id".into()))?;
            let threshold = maxrel.unwrap_or(f64::MAX) as i64;
            let deleted = store.delete_expressions_below_relevance(land_id, threshold).await.map_err(Error::from)?;
            Ok(format!("deleted {deleted} expression(s) below relevance {threshold} from '{}'", land.name))
        }

        LandCommand::Medianalyse { name, depth, minrel } => {
            let land = get_land(store, &name).await?;
            let analyzer = MediaAnalyzer::new(config);
            let filter = AnalyzeFilter { max_depth: depth, min_relevance: minrel };
            let stats = analyzer.analyze_land(store, &land, filter).await.map_err(Error::from)?;
            Ok(format!(
                "analyzed media for '{}': processed {}, analyzed {}, denied {}, rejected {}, errored {}",
                land.name, stats.processed, stats.analyzed, stats.denied, stats.rejected, stats.errored
            ))
        }
    }
}

async fn run_domain_crawl(store: &SqliteStore, config: &Config, limit: Option<usize>, http: Option<String>) -> Result<String> {
    let fetcher = Fetcher::new(FetchConfig::from_core(config)).map_err(|e| Error::Network(e.to_string()))?;
    let enricher = DomainEnricher::new(fetcher);
    let lands = store.list_lands(None).await.map_err(Error::from)?;
    let mut hosts = std::collections::BTreeSet::new();
    for land in &lands {
        let land_id = land.id.ok_or_else(|| Error::Internal("land has no id".into()))?;
        let expressions = store.list_expressions(land_id, None, None).await.map_err(Error::from)?;
        for expression in expressions {
            if let Ok(url) = url::Url::parse(&expression.url) {
                if let Some(host) = url.host_str() {
                    hosts.insert(host.to_string());
                }
            }
        }
    }
    let mut hosts: Vec<String> = hosts.into_iter().collect();
    if let Some(limit) = limit {
        hosts.truncate(limit);
    }
    let stats = enricher.enrich_all(store, hosts, http.as_deref()).await.map_err(Error::from)?;
    Ok(format!("enriched domains: processed {}, updated {}, failed {}", stats.processed, stats.updated, stats.failed))
}

async fn get_land(store: &SqliteStore, name: &str) -> Result<Land> {
    store
        .get_land(name)
        .await
        .map_err(Error::from)?
        .ok_or_else(|| Error::LandNotFound(name.to_string()))
}

fn build_gate(config: &Config) -> Option<RelevanceGate> {
    if !config.openrouter_enabled {
        return None;
    }
    let api_key = config.openrouter_api_key.clone()?;
    RelevanceGate::new(
        api_key,
        config.openrouter_model.clone(),
        config.openrouter_timeout_secs,
        config.openrouter_readable_max_chars,
        config.openrouter_max_calls_per_run,
    )
    .ok()
}

fn collect_seed_urls(urls: Option<String>, path: Option<String>) -> Result<Vec<String>> {
    let mut collected = Vec::new();
    if let Some(urls) = urls {
        collected.extend(parse_csv(&urls));
    }
    if let Some(path) = path {
        let content = std::fs::read_to_string(&path).map_err(|_| Error::UnreadableUrlFile(path.clone()))?;
        collected.extend(content.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string));
    }
    if collected.is_empty() {
        return Err(Error::InvalidArgument("addurl requires --urls or --path".into()));
    }
    Ok(collected)
}

async fn open_store() -> Result<SqliteStore> {
    let data_dir = mwi_core::paths::data_dir();
    std::fs::create_dir_all(&data_dir).map_err(Error::from)?;
    mwi_store::open_with_retry(&mwi_core::paths::database_path()).await.map_err(Error::from)
}
