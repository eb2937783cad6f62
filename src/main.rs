mod app;
mod config;
mod data;
mod layout;
mod util;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to a dataset JSON file; the bundled demo dataset is used when
    /// omitted.
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Layout seed. The same seed always produces the same arrangement.
    #[arg(long, default_value_t = layout::DEFAULT_SEED)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let dataset = match &args.dataset {
        Some(path) => data::load_dataset(path)?,
        None => data::bundled_dataset()?,
    };
    let tuning = config::Tuning::default();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "marketgraph",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::MarketGraphApp::new(
                cc,
                dataset,
                args.seed,
                tuning,
            )))
        }),
    )
    .map_err(|error| anyhow::anyhow!("{error}"))
}
