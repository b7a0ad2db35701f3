//! Scout: submit scrape jobs to the backend and follow them to completion.

mod config;
mod logging;
mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use scout_core::{
    layout_for, sort_newest_first, CategoryFilter, Msg, NotificationKind, ScrapeRequest, Source,
    SourceSelection, TargetBroadcast,
};
use scout_engine::{DashboardView, JobClient, Orchestrator, ReqwestJobClient};
use scout_logging::{scout_info, scout_warn};

use crate::config::{load_config, AppConfig, DEFAULT_CONFIG_FILE};
use crate::logging::LogDestination;
use crate::render::TerminalNotifier;

const HEATMAP_WAIT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Run deal-scouting scrape jobs against the analysis backend")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log to the terminal only, without writing ./scout.log
    #[arg(long)]
    no_log_file: bool,

    /// Log to ./scout.log only, keeping the terminal for progress and results
    #[arg(long, conflicts_with = "no_log_file")]
    log_file_only: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a scrape job and wait for its results
    Scrape(ScrapeArgs),

    /// Show results already stored by the backend
    Results {
        /// Only the latest N deals
        #[arg(short, long)]
        limit: Option<usize>,

        /// Template whose columns are shown
        #[arg(short, long, default_value = "")]
        template: String,
    },

    /// Show the per-company heatmap
    Heatmap {
        /// Comma-separated company names; empty shows everything
        #[arg(default_value = "")]
        targets: String,
    },

    /// List prompt templates and models
    Templates,

    /// List data sources
    Sources,
}

#[derive(clap::Args)]
struct ScrapeArgs {
    /// Target companies, free text
    #[arg(default_value = "ICEYE")]
    targets: String,

    /// Data source; repeat for several
    #[arg(short, long = "source")]
    sources: Vec<Source>,

    /// Prompt template id
    #[arg(short, long)]
    template: Option<String>,

    /// Model identifier
    #[arg(short, long)]
    model: Option<String>,

    /// Backend API key
    #[arg(long, env = "SCOUT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Oldest publication year to keep
    #[arg(long, default_value = "2024")]
    min_year: i32,

    /// Listing pages to scan per source
    #[arg(long, default_value = "1")]
    max_pages: u32,

    /// Rescan URLs seen before
    #[arg(long)]
    force_rescan: bool,

    /// Show only deals whose type contains this text
    #[arg(short, long, default_value = "ALL")]
    filter: String,

    /// Also print the heatmap for the scraped targets
    #[arg(long)]
    heatmap: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let destination = LogDestination::from_flags(cli.no_log_file, cli.log_file_only);
    logging::initialize(destination, logging::level_for(cli.verbose));

    let config = load_config(&cli.config);
    match cli.command {
        Commands::Scrape(args) => scrape(args, &config).await,
        Commands::Results { limit, template } => results(&config, limit, &template).await,
        Commands::Heatmap { targets } => heatmap(&config, &targets).await,
        Commands::Templates => {
            print!("{}", render::template_list());
            Ok(())
        }
        Commands::Sources => {
            print!("{}", render::source_list());
            Ok(())
        }
    }
}

fn client(config: &AppConfig) -> Result<ReqwestJobClient> {
    ReqwestJobClient::new(&config.client_settings()).context("invalid backend url")
}

async fn scrape(args: ScrapeArgs, config: &AppConfig) -> Result<()> {
    let settings = config.client_settings();
    let client = Arc::new(client(config)?);
    let broadcast = TargetBroadcast::new();
    let mut dashboard = args
        .heatmap
        .then(|| DashboardView::spawn(client.clone(), &broadcast));
    let mut orchestrator = Orchestrator::new(
        client,
        settings,
        broadcast,
        Arc::new(TerminalNotifier),
    );

    orchestrator.dispatch(Msg::FormReplaced(ScrapeRequest {
        target_companies: args.targets,
        ai_model: args.model.unwrap_or_else(|| config.default_model.clone()),
        api_key: args.api_key.or_else(|| config.api_key.clone()).unwrap_or_default(),
        min_year: args.min_year,
        max_pages: args.max_pages,
        force_rescan: args.force_rescan,
        ..ScrapeRequest::default()
    }));
    if let Some(template) = args.template {
        orchestrator.dispatch(Msg::TemplateSelected(template));
    }
    if !args.sources.is_empty() {
        let mut request = orchestrator.state().request().clone();
        request.sources =
            SourceSelection::from_sources(args.sources).context("no source selected")?;
        orchestrator.dispatch(Msg::FormReplaced(request));
    }
    orchestrator.dispatch(Msg::FilterSelected(CategoryFilter::parse(&args.filter)));

    let view = orchestrator.view();
    scout_info!(
        "Scraping {:?} from {} source(s), estimated {}",
        orchestrator.state().request().target_companies,
        view.selected_sources.len(),
        view.estimated_time
    );
    orchestrator.dispatch(Msg::StartClicked);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    while orchestrator.state().is_running() {
        if orchestrator.consume_dirty() {
            render::draw_progress(&orchestrator.view());
        }
        let interrupted = tokio::select! {
            _ = &mut ctrl_c => true,
            _ = orchestrator.next_message() => false,
        };
        if interrupted {
            orchestrator.dispose();
            eprintln!();
            bail!("interrupted");
        }
    }
    render::draw_progress(&orchestrator.view());
    eprintln!();

    let view = orchestrator.view();
    print!("{}", render::deal_table(&view));
    if let Some(dashboard) = dashboard.as_mut() {
        let targets = orchestrator.broadcast().current();
        if !targets.is_empty() {
            wait_for_heatmap(dashboard, &targets).await;
            print!("{}", render::tile_table(&dashboard.tiles()));
        }
    }
    match view.last_notification {
        Some(notification) if notification.kind == NotificationKind::Error => {
            bail!(notification.message)
        }
        _ => Ok(()),
    }
}

/// Gives the dashboard a moment to catch up with the last published target.
async fn wait_for_heatmap(dashboard: &mut DashboardView, targets: &str) {
    let loaded = async {
        loop {
            let snapshot = dashboard.snapshot();
            if snapshot.target.as_deref() == Some(targets) {
                return;
            }
            if let Some(error) = snapshot.error {
                scout_warn!("Heatmap for {:?} failed to load: {}", targets, error);
                return;
            }
            if !dashboard.changed().await {
                return;
            }
        }
    };
    if tokio::time::timeout(HEATMAP_WAIT, loaded).await.is_err() {
        scout_warn!("Heatmap for {:?} did not load in time", targets);
    }
}

async fn results(config: &AppConfig, limit: Option<usize>, template: &str) -> Result<()> {
    let client = client(config)?;
    let mut deals = match limit {
        Some(limit) => client.fetch_deals(limit).await,
        None => client.fetch_aggregate_results().await,
    }
    .context("could not load results")?;
    sort_newest_first(&mut deals);
    if deals.is_empty() {
        println!("No results found.");
        return Ok(());
    }
    print!("{}", render::deals_table(layout_for(template).columns, &deals));
    Ok(())
}

async fn heatmap(config: &AppConfig, targets: &str) -> Result<()> {
    let tiles = client(config)?
        .fetch_heatmap(targets)
        .await
        .context("could not load the heatmap")?;
    print!("{}", render::tile_table(&tiles));
    Ok(())
}
