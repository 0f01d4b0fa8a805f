use anyhow::{Context, Result};
use clap::Parser;
use tokio::runtime::Runtime;

use coin_grid::analysis::{
    CombinedDataset, HeadlineMetrics, coin_view, correlation_matrix, latest_row, recent_rows,
    resolve_date_window,
};
use coin_grid::config::{PERSISTENCE, PipelineSettings};
use coin_grid::data::market_chart::CreateChartCollection;
use coin_grid::data::market_chart::cache_file::RawChartCache;
use coin_grid::data::market_chart::coingecko::CoinGeckoApi;
use coin_grid::ui;
use coin_grid::{Cli, Command, DerivedStore, MemoizedStore, PipelineEngine, SqliteStore};

fn chart_providers(settings: &PipelineSettings, prefer_api: bool) -> Result<Vec<Box<dyn CreateChartCollection>>> {
    let cache: Box<dyn CreateChartCollection> = Box::new(RawChartCache::for_request(&settings.chart_request()));
    let api: Box<dyn CreateChartCollection> = Box::new(CoinGeckoApi::new()?);
    Ok(if prefer_api { vec![api, cache] } else { vec![cache, api] })
}

fn pick_coin(dataset: &CombinedDataset, coin: Option<String>) -> Option<String> {
    coin.map(|c| c.to_lowercase()).or_else(|| dataset.default_coin())
}

fn main() -> Result<()> {
    // A. Init Logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // B. Parse Args
    let args = Cli::parse();
    #[cfg(debug_assertions)]
    log::info!("Parsed arguments: {:?}", args);

    let sqlite = SqliteStore::open(&args.db, PERSISTENCE.dataset.table_name)?;
    let store = MemoizedStore::new(sqlite, PERSISTENCE.dataset.memo_ttl);

    match args.command {
        Command::Run(run) => {
            let settings = run.settings();
            let engine = PipelineEngine {
                providers: chart_providers(&settings, run.prefer_api)?,
                settings,
                store: &store,
                dedupe_after_write: run.dedupe,
            };
            let rt = Runtime::new().context("Failed to create Tokio runtime")?;
            let summary = rt.block_on(engine.run(&run.coins()))?;
            print!("{}", ui::render_run_summary(&summary));
        }
        Command::View { coin, from, to, rows } => {
            let dataset = store.dataset()?;
            let Some(coin) = pick_coin(&dataset, coin) else {
                println!("No data available. Run the pipeline first.");
                return Ok(());
            };
            let Some((start_ms, end_ms)) = resolve_date_window(&dataset, from, to) else {
                println!("No data available. Run the pipeline first.");
                return Ok(());
            };
            match coin_view(&dataset, &coin, start_ms, end_ms) {
                Ok(view) => {
                    if let Some(last) = view.last() {
                        print!("{}", ui::render_headline(&HeadlineMetrics::from(last)));
                    }
                    print!("{}", ui::render_rows(recent_rows(&view, rows)));
                }
                Err(missing) => println!("{}", missing),
            }
        }
        Command::Latest { coin } => {
            let dataset = store.dataset()?;
            let Some(coin) = pick_coin(&dataset, coin) else {
                println!("No data available. Run the pipeline first.");
                return Ok(());
            };
            match latest_row(&dataset, &coin) {
                Ok(row) => print!("{}", ui::render_headline(&HeadlineMetrics::from(row))),
                Err(missing) => println!("{}", missing),
            }
        }
        Command::Corr { from, to } => {
            let dataset = store.dataset()?;
            let Some((start_ms, end_ms)) = resolve_date_window(&dataset, from, to) else {
                println!("No data available. Run the pipeline first.");
                return Ok(());
            };
            match correlation_matrix(&dataset, start_ms, end_ms) {
                Ok(matrix) => print!("{}", ui::render_correlation(&matrix)),
                Err(missing) => println!("{}", missing),
            }
        }
        Command::Dedupe => {
            let removed = store.remove_duplicates()?;
            println!("Removed {} duplicate rows", removed);
        }
    }
    Ok(())
}
