mod app;
mod config;
mod controller;
mod cropper;
mod editor;
mod gradient;
mod intent;
mod notice;
mod render;
mod state;

use app::PortraitApp;
use config::AppConfig;

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load();
    let width = config.window_width.unwrap_or(1100.0);
    let height = config.window_height.unwrap_or(760.0);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Portrait")
            .with_app_id("portrait")
            .with_inner_size([width, height]),
        ..Default::default()
    };

    eframe::run_native(
        "portrait",
        native_options,
        Box::new(|cc| Ok(Box::new(PortraitApp::new(cc, config)))),
    )
}
