mod bench;
mod config;
mod demo_map;
mod watch;

use std::fs::File;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use quadmap_items::{Assets, ItemTypes, SpriteProvider};
use quadmap_render::TileRenderer;

use crate::bench::RunOverrides;
use crate::config::AppConfig;
use crate::watch::ConfigWatcher;

#[derive(Debug, Parser)]
#[command(name = "quadmap", version, about = "Headless chunked tile-map renderer")]
struct Cli {
    /// TOML settings file; built-in defaults when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Frames to render, overriding `[bench] frames`.
    #[arg(long)]
    frames: Option<u64>,

    /// Rebuild stale chunks inline instead of on worker threads.
    #[arg(long)]
    sync: bool,

    /// Start from an empty map and stream nodes in as they are requested.
    #[arg(long = "live-sim")]
    live_sim: bool,

    /// Reload the config file whenever it changes.
    #[arg(long, requires = "config")]
    watch: bool,

    /// Also write the log to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(log_file: Option<&PathBuf>) {
    let Some(path) = log_file else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        return;
    };
    use simplelog::{
        ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
        WriteLogger,
    };
    let term: Box<dyn SharedLogger> = TermLogger::new(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
    match File::create(path) {
        Ok(file) => {
            let _ = CombinedLogger::init(vec![
                term,
                WriteLogger::new(LevelFilter::Debug, Config::default(), file),
            ]);
        }
        Err(e) => {
            let _ = CombinedLogger::init(vec![term]);
            log::warn!("cannot open log file {}: {e}", path.display());
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref());

    let config = match &cli.config {
        Some(path) => match AppConfig::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::error!("{e}");
                process::exit(1);
            }
        },
        None => AppConfig::default(),
    };

    let assets = match Assets::load(&config.assets.items) {
        Ok(a) => a,
        Err(e) => {
            log::error!("{e}");
            process::exit(1);
        }
    };
    let items: Arc<dyn ItemTypes> = Arc::new(assets.items);
    let sprites: Arc<dyn SpriteProvider> = Arc::new(assets.sprites);
    let renderer = Arc::new(TileRenderer::new(items, sprites));

    let watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => match ConfigWatcher::new(path) {
            Ok(w) => Some(w),
            Err(e) => {
                log::warn!("config watching disabled: {e}");
                None
            }
        },
        _ => None,
    };

    let overrides = RunOverrides {
        frames: cli.frames,
        sync: cli.sync,
        live: cli.live_sim,
    };
    let report = bench::run(renderer, config, overrides, watcher.as_ref());
    log::info!(
        "rendered {} frames in {:.2?} ({:.1}% chunk hits)",
        report.frames,
        report.elapsed,
        report.hit_rate() * 100.0
    );
    println!("{}", report.to_markdown());
}
