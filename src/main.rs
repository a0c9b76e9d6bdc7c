//! A visual designer for `egui` interfaces: compose a component tree, save
//! it as a JSON document, and generate the Rust program that draws it.

mod app;
mod builder;
mod codec;
mod codegen;
mod highlight;
mod model;
mod preview;
mod registry;
mod render;
mod resource;

use crate::app::DesignerApp;

use eframe::egui;
use tracing_subscriber::EnvFilter;

const CANVAS_SIZE: egui::Vec2 = egui::vec2(800.0, 600.0);

fn initial_inner_size() -> egui::Vec2 {
    // Canvas plus the inspector (300) and palette (200), with room for the
    // menu bar
    CANVAS_SIZE + egui::vec2(300.0 + 200.0 + 16.0, 40.0)
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default()
        .with_inner_size(initial_inner_size())
        .with_min_inner_size(egui::vec2(640.0, 480.0))
        .with_resizable(true);

    eframe::run_native(
        "GUI Designer",
        native_options,
        Box::new(|_cc| Ok(Box::<DesignerApp>::default())),
    )
}
