use eframe::egui::{self, Color32, TextureOptions, Ui};
use egui_plot::{Line, LineStyle, Plot, PlotImage, PlotPoint, PlotPoints};

use crate::annotation::{Point, Tool};
use crate::color::to_color32;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Annotation toolbar
// ---------------------------------------------------------------------------

pub fn annotation_toolbar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        for &tool in Tool::all() {
            if ui
                .selectable_label(state.annotations.tool() == tool, tool.name())
                .clicked()
            {
                state.annotations.set_tool(tool);
            }
        }

        ui.separator();
        ui.label(format!("{} shapes", state.annotations.len()));
        if ui
            .add_enabled(!state.annotations.is_empty(), egui::Button::new("Clear"))
            .clicked()
        {
            state.annotations.clear();
        }
    });
}

// ---------------------------------------------------------------------------
// Image viewer (central panel, below the table)
// ---------------------------------------------------------------------------

/// Render the image with its annotations and route pointer input to the
/// active tool. Image pixels map to plot units; the plot's y axis points up,
/// so image rows are flipped.
pub fn image_viewer(ui: &mut Ui, state: &mut AppState) {
    let texture = state
        .texture
        .get_or_insert_with(|| {
            ui.ctx().load_texture(
                "annotation_image",
                state.image.to_color_image(),
                TextureOptions::LINEAR,
            )
        })
        .clone();

    let (w, h) = (state.image.width() as f64, state.image.height() as f64);
    let tool = state.annotations.tool();
    // Drags pan the image unless they draw a shape.
    let pans = !tool.is_drawing_tool();
    let stroke_width = state.stroke_width;
    let annotations = state.annotations.annotations();
    let preview = state.annotations.drawing().to_shape();

    let response = Plot::new("image_annotation")
        .data_aspect(1.0)
        .show_grid(false)
        .allow_drag(pans)
        .allow_boxed_zoom(pans)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.image(PlotImage::new(
                &texture,
                PlotPoint::new(w / 2.0, h / 2.0),
                egui::vec2(w as f32, h as f32),
            ));

            for ann in annotations {
                plot_ui.line(
                    Line::new(to_plot_points(&ann.shape.outline(), h))
                        .color(to_color32(ann.color))
                        .width(stroke_width),
                );
            }

            if let Some(shape) = &preview {
                plot_ui.line(
                    Line::new(to_plot_points(&shape.outline(), h))
                        .color(Color32::WHITE)
                        .style(LineStyle::dashed_dense())
                        .width(stroke_width),
                );
            }

            plot_ui.pointer_coordinate()
        });

    let pointer = response.inner.map(|p| to_image_point(p, h));
    let r = &response.response;
    // drag_started() fires past egui's drag threshold; anchor at the press.
    let press_origin = ui
        .input(|i| i.pointer.press_origin())
        .map(|pos| to_image_point(response.transform.value_from_position(pos), h));

    match tool {
        Tool::Pan => {}
        Tool::Erase => {
            if r.clicked() {
                if let Some(p) = pointer {
                    state.annotations.erase_at(p, state.erase_tolerance);
                }
            }
        }
        _ => {
            if r.drag_started() {
                if let Some(start) = drag_anchor(press_origin, pointer) {
                    state.annotations.begin(start);
                }
                if let Some(p) = pointer {
                    state.annotations.extend(p);
                }
            } else if r.dragged() {
                if let Some(p) = pointer {
                    state.annotations.extend(p);
                }
            }
            if r.drag_stopped() {
                if let Some(p) = pointer {
                    state.annotations.extend(p);
                }
                state.annotations.finish();
            }
        }
    }
}

fn to_plot_points(outline: &[Point], image_height: f64) -> PlotPoints<'static> {
    outline
        .iter()
        .map(|&(x, y)| [x as f64, image_height - y as f64])
        .collect()
}

/// Where a new shape starts: the button press, falling back to the pointer.
fn drag_anchor(press_origin: Option<Point>, pointer: Option<Point>) -> Option<Point> {
    press_origin.or(pointer)
}

fn to_image_point(p: PlotPoint, image_height: f64) -> Point {
    (p.x as f32, (image_height - p.y) as f32)
}
