use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

const ROW_HEIGHT: f32 = 20.0;

/// Render the filtered dataset as a table, one column per dataset column.
pub fn data_table(ui: &mut Ui, state: &AppState, max_height: f32) {
    let Some(session) = &state.session else {
        ui.label("No dataset loaded.");
        return;
    };

    let dataset = session.dataset();
    let columns = dataset.columns();
    let rows = &state.table.rows;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto().at_least(90.0), columns.len())
        .min_scrolled_height(0.0)
        .max_scroll_height(max_height)
        .header(ROW_HEIGHT, |mut header| {
            for name in columns {
                header.col(|ui: &mut Ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                let Some(record) = dataset.record(rows[row.index()]) else {
                    return;
                };
                for name in columns {
                    row.col(|ui: &mut Ui| {
                        ui.label(record.get(name).to_string());
                    });
                }
            });
        });

    if rows.is_empty() {
        ui.weak("No matching records.");
    }
}
