use eframe::egui::{self, Color32, RichText, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – selection dropdown
// ---------------------------------------------------------------------------

/// Render the left panel with the grouping-value dropdown.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading(format!("Select {}", state.grouping_field));
    ui.separator();

    let Some(session) = &state.session else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the combo box.
    let groups = session.dataset().distinct_groups().to_vec();
    let current = session.selection().0.clone();

    let selected_text = current
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "Select...".to_string());

    egui::ComboBox::from_id_salt("selection_dropdown")
        .selected_text(selected_text)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for value in &groups {
                let is_selected = current.as_ref() == Some(value);
                if ui
                    .selectable_label(is_selected, value.to_string())
                    .clicked()
                {
                    state.request_selection(Some(value.clone()));
                }
            }
        });

    ui.horizontal(|ui: &mut Ui| {
        if ui
            .add_enabled(current.is_some(), egui::Button::new("Clear").small())
            .clicked()
        {
            state.request_selection(None);
        }
        ui.label(format!("{} values", groups.len()));
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open dataset…").clicked() {
                open_dataset_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open image…").clicked() {
                open_image_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui
                .add_enabled(!state.annotations.is_empty(), egui::Button::new("Export annotations…"))
                .clicked()
            {
                export_annotations_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(session) = &state.session {
            ui.label(format!(
                "{} records loaded, {} shown",
                session.dataset().len(),
                state.table.rows.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_dataset_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open dataset")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_dataset(&path);
    }
}

pub fn open_image_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open image")
        .add_filter("Images", &["png", "jpg", "jpeg"])
        .pick_file();

    if let Some(path) = file {
        state.open_image(&path);
    }
}

pub fn export_annotations_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export annotations")
        .set_file_name("annotations.json")
        .add_filter("JSON", &["json"])
        .save_file();

    let Some(path) = file else {
        return;
    };

    let written = state
        .annotations
        .to_json()
        .map_err(anyhow::Error::from)
        .and_then(|json| std::fs::write(&path, json).map_err(anyhow::Error::from));

    match written {
        Ok(()) => {
            log::info!(
                "Exported {} annotations to {}",
                state.annotations.len(),
                path.display()
            );
            state.status_message = None;
        }
        Err(e) => state.report_error("export annotations", &e),
    }
}
