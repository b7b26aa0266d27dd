pub mod config;
pub mod mqtt;
pub mod tracker;
pub mod ui;

use crate::config::TrackerConfig;
use crate::tracker::position::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::ui::common::Layout;
use crate::ui::BallTrackerUI;
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = match TrackerConfig::load().await {
        Ok(config) => config,
        Err(e) => {
            warn!("{}, falling back to defaults", e);
            TrackerConfig::default()
        }
    };
    info!(
        "Using field {} and ball {}",
        config.field_image.display(),
        config.ball_image.display()
    );

    let runtime = tokio::runtime::Handle::current();

    info!("Starting tracker UI");
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("AFL Ball Tracker")
            .with_inner_size([CANVAS_WIDTH + Layout::SETTINGS_WIDTH, CANVAS_HEIGHT])
            .with_min_inner_size([Layout::SETTINGS_WIDTH + 300.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "AFL Ball Tracker",
        native_options,
        Box::new(move |cc| Ok(Box::new(BallTrackerUI::new(cc, config, runtime)))),
    )
    .map_err(|e| eyre!("UI terminated with an error: {}", e))?;

    info!("Tracker UI closed");
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
