mod app;
mod color;
mod data;
mod state;
mod ui;

use app::AirQualityApp;
use data::sources::SourceConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = SourceConfig::from_env();
    if let Ok(config) = &config {
        log::info!(
            "Reading {} station sources from {}",
            config.sources.len(),
            config.data_dir.display()
        );
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Air Quality Dashboard – PM2.5",
        options,
        Box::new(|_cc| Ok(Box::new(AirQualityApp::new(config)))),
    )
}
