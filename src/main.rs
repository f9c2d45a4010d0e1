// GUI-subsystem binary: no console window is ever allocated by Windows.
#![windows_subsystem = "windows"]

use clearcut::app::ClearCutApp;
use clearcut::logger;
use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([720.0, 520.0])
            .with_title("ClearCut"),
        ..Default::default()
    };

    eframe::run_native(
        "ClearCut",
        options,
        Box::new(|cc| Box::new(ClearCutApp::new(cc))),
    )
}
