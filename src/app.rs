use eframe::egui;

use crate::state::AppState;
use crate::ui::{image_view, panels, table};

/// Share of the central panel given to the table before it scrolls.
const TABLE_HEIGHT_FRACTION: f32 = 0.35;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SolarBoardApp {
    pub state: AppState,
}

impl SolarBoardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for SolarBoardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: selection dropdown ----
        egui::SidePanel::left("selection_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // Apply selection changes before the table is drawn.
        self.state.process_events();

        // ---- Central panel: table, then image viewer ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Solar Dataset and Image Annotation Tool");
            ui.separator();

            ui.push_id("dataset_table", |ui| {
                let max_height = ui.available_height() * TABLE_HEIGHT_FRACTION;
                table::data_table(ui, &self.state, max_height);
            });

            ui.separator();
            ui.strong(format!("Image: {}", self.state.image.name));
            image_view::annotation_toolbar(ui, &mut self.state);
            image_view::image_viewer(ui, &mut self.state);
        });
    }
}
