//! Annotation tools and shapes drawn over the sample image.
//!
//! Everything here works in image pixel coordinates (origin top-left, y down).
//! The layer never touches the dataset.

use serde::{Deserialize, Serialize};

use crate::color::StrokeCycle;

/// Unique identifier for an annotation.
pub type AnnotationId = u32;

/// A point in image pixel coordinates.
pub type Point = (f32, f32);

/// Minimum width/height (or length, for lines) of a dragged shape.
pub const MIN_SHAPE_SIZE: f32 = 1.0;

/// Freehand paths skip pointer samples closer than this to the previous one.
pub const MIN_PATH_STEP: f32 = 0.5;

/// Segments used when turning an ellipse into an outline.
const ELLIPSE_SEGMENTS: usize = 64;

/// Tools offered in the image viewer's toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Pan and zoom the image.
    Pan,
    Line,
    /// Freehand open path.
    OpenPath,
    /// Freehand path closed back to its first point.
    ClosedPath,
    /// Ellipse inscribed in the dragged box.
    Circle,
    #[default]
    Rect,
    /// Remove the topmost shape under the pointer.
    Erase,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Pan => "Pan",
            Tool::Line => "Line",
            Tool::OpenPath => "Open path",
            Tool::ClosedPath => "Closed path",
            Tool::Circle => "Circle",
            Tool::Rect => "Rectangle",
            Tool::Erase => "Erase",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[
            Tool::Pan,
            Tool::Line,
            Tool::OpenPath,
            Tool::ClosedPath,
            Tool::Circle,
            Tool::Rect,
            Tool::Erase,
        ]
    }

    /// Whether dragging with this tool creates a shape.
    pub fn is_drawing_tool(&self) -> bool {
        !matches!(self, Tool::Pan | Tool::Erase)
    }
}

/// Shape geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Line { start: Point, end: Point },
    Path { points: Vec<Point>, closed: bool },
    Ellipse { min: Point, max: Point },
    Rect { min: Point, max: Point },
}

impl Shape {
    /// Build a shape from a drag between two corners. Returns `None` for
    /// tools that do not drag out a shape, or when the drag is too small.
    pub fn from_drag(tool: Tool, start: Point, end: Point) -> Option<Self> {
        let min = (start.0.min(end.0), start.1.min(end.1));
        let max = (start.0.max(end.0), start.1.max(end.1));
        let boxed = max.0 - min.0 > MIN_SHAPE_SIZE && max.1 - min.1 > MIN_SHAPE_SIZE;

        match tool {
            Tool::Line if distance(start, end) > MIN_SHAPE_SIZE => Some(Shape::Line { start, end }),
            Tool::Rect if boxed => Some(Shape::Rect { min, max }),
            Tool::Circle if boxed => Some(Shape::Ellipse { min, max }),
            _ => None,
        }
    }

    /// Build a freehand path. Open paths need two points, closed ones three.
    pub fn from_path(points: Vec<Point>, closed: bool) -> Option<Self> {
        let needed = if closed { 3 } else { 2 };
        (points.len() >= needed).then_some(Shape::Path { points, closed })
    }

    /// Polyline tracing the shape's outline; closed shapes repeat their
    /// first point at the end.
    pub fn outline(&self) -> Vec<Point> {
        match self {
            Shape::Line { start, end } => vec![*start, *end],
            Shape::Path { points, closed } => {
                let mut out = points.clone();
                if *closed {
                    if let Some(first) = points.first() {
                        out.push(*first);
                    }
                }
                out
            }
            Shape::Rect { min, max } => vec![
                *min,
                (max.0, min.1),
                *max,
                (min.0, max.1),
                *min,
            ],
            Shape::Ellipse { min, max } => {
                let (cx, cy) = ((min.0 + max.0) / 2.0, (min.1 + max.1) / 2.0);
                let (rx, ry) = ((max.0 - min.0) / 2.0, (max.1 - min.1) / 2.0);
                (0..=ELLIPSE_SEGMENTS)
                    .map(|i| {
                        let t = i as f32 / ELLIPSE_SEGMENTS as f32 * std::f32::consts::TAU;
                        (cx + rx * t.cos(), cy + ry * t.sin())
                    })
                    .collect()
            }
        }
    }

    /// Whether `p` lies inside the shape or within `tolerance` of its outline.
    pub fn hit(&self, p: Point, tolerance: f32) -> bool {
        let inside = match self {
            Shape::Rect { min, max } => {
                p.0 >= min.0 && p.0 <= max.0 && p.1 >= min.1 && p.1 <= max.1
            }
            Shape::Ellipse { min, max } => {
                let (cx, cy) = ((min.0 + max.0) / 2.0, (min.1 + max.1) / 2.0);
                let (rx, ry) = ((max.0 - min.0) / 2.0, (max.1 - min.1) / 2.0);
                let nx = (p.0 - cx) / rx;
                let ny = (p.1 - cy) / ry;
                nx * nx + ny * ny <= 1.0
            }
            Shape::Path {
                points,
                closed: true,
            } => point_in_polygon(points, p),
            Shape::Path { closed: false, .. } | Shape::Line { .. } => false,
        };
        inside
            || self
                .outline()
                .windows(2)
                .any(|seg| distance_to_segment(p, seg[0], seg[1]) <= tolerance)
    }
}

/// A finished annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub shape: Shape,
    /// Stroke colour as sRGB.
    pub color: [u8; 3],
}

/// Shape currently being drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DrawingState {
    #[default]
    Idle,
    Drag {
        tool: Tool,
        start: Point,
        current: Point,
    },
    Path {
        points: Vec<Point>,
        closed: bool,
    },
}

impl DrawingState {
    pub fn is_drawing(&self) -> bool {
        !matches!(self, DrawingState::Idle)
    }

    /// The shape this drawing would produce if finished now.
    pub fn to_shape(&self) -> Option<Shape> {
        match self {
            DrawingState::Idle => None,
            DrawingState::Drag {
                tool,
                start,
                current,
            } => Shape::from_drag(*tool, *start, *current),
            DrawingState::Path { points, closed } => Shape::from_path(points.clone(), *closed),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotation layer
// ---------------------------------------------------------------------------

/// All annotations on the image plus the active tool and in-progress drawing.
#[derive(Debug, Clone, Default)]
pub struct AnnotationLayer {
    tool: Tool,
    annotations: Vec<Annotation>,
    drawing: DrawingState,
    next_id: AnnotationId,
    strokes: StrokeCycle,
}

impl AnnotationLayer {
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            ..Default::default()
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools, abandoning any unfinished drawing.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool != self.tool {
            self.cancel();
            self.tool = tool;
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn drawing(&self) -> &DrawingState {
        &self.drawing
    }

    /// Start drawing at `p` with the active tool.
    pub fn begin(&mut self, p: Point) {
        self.drawing = match self.tool {
            Tool::Line | Tool::Circle | Tool::Rect => DrawingState::Drag {
                tool: self.tool,
                start: p,
                current: p,
            },
            Tool::OpenPath | Tool::ClosedPath => DrawingState::Path {
                points: vec![p],
                closed: self.tool == Tool::ClosedPath,
            },
            Tool::Pan | Tool::Erase => DrawingState::Idle,
        };
    }

    /// Feed a pointer position while the button is held.
    pub fn extend(&mut self, p: Point) {
        match &mut self.drawing {
            DrawingState::Idle => {}
            DrawingState::Drag { current, .. } => *current = p,
            DrawingState::Path { points, .. } => {
                if points.last().map_or(true, |&last| distance(last, p) >= MIN_PATH_STEP) {
                    points.push(p);
                }
            }
        }
    }

    /// Commit the in-progress drawing. Degenerate shapes are dropped.
    pub fn finish(&mut self) -> Option<AnnotationId> {
        let shape = std::mem::take(&mut self.drawing).to_shape()?;
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let color = self.strokes.next_color();
        log::debug!("annotation {id} added: {shape:?}");
        self.annotations.push(Annotation { id, shape, color });
        Some(id)
    }

    pub fn cancel(&mut self) {
        self.drawing = DrawingState::Idle;
    }

    /// Remove and return the topmost annotation hit at `p`.
    pub fn erase_at(&mut self, p: Point, tolerance: f32) -> Option<Annotation> {
        let idx = self
            .annotations
            .iter()
            .rposition(|a| a.shape.hit(p, tolerance))?;
        let removed = self.annotations.remove(idx);
        log::debug!("annotation {} erased", removed.id);
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
        self.drawing = DrawingState::Idle;
    }

    /// Serialize the finished annotations as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.annotations)
    }
}

// ---------------------------------------------------------------------------
// Geometry helpers
// ---------------------------------------------------------------------------

fn distance(a: Point, b: Point) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return distance(p, a);
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    distance(p, (a.0 + t * dx, a.1 + t * dy))
}

/// Ray casting point-in-polygon test.
fn point_in_polygon(vertices: &[Point], (x, y): Point) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (xi, yi) = vertices[i];
        let (xj, yj) = vertices[j];
        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(layer: &mut AnnotationLayer, points: &[Point]) -> Option<AnnotationId> {
        layer.begin(points[0]);
        for &p in &points[1..] {
            layer.extend(p);
        }
        layer.finish()
    }

    #[test]
    fn rect_is_the_default_tool_and_normalizes_corners() {
        let mut layer = AnnotationLayer::default();
        assert_eq!(layer.tool(), Tool::Rect);

        let id = draw(&mut layer, &[(50.0, 40.0), (10.0, 20.0)]);
        assert_eq!(id, Some(0));
        assert_eq!(
            layer.annotations()[0].shape,
            Shape::Rect {
                min: (10.0, 20.0),
                max: (50.0, 40.0)
            }
        );
    }

    #[test]
    fn tiny_drags_are_discarded() {
        let mut layer = AnnotationLayer::new(Tool::Circle);
        assert_eq!(draw(&mut layer, &[(10.0, 10.0), (10.5, 30.0)]), None);
        assert!(layer.is_empty());
        assert!(!layer.drawing().is_drawing());
    }

    #[test]
    fn closed_path_needs_three_points() {
        let mut layer = AnnotationLayer::new(Tool::ClosedPath);
        assert_eq!(draw(&mut layer, &[(0.0, 0.0), (10.0, 0.0)]), None);

        let id = draw(&mut layer, &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        assert!(id.is_some());
        let outline = layer.annotations()[0].shape.outline();
        assert_eq!(outline.first(), outline.last());
    }

    #[test]
    fn freehand_path_skips_jitter() {
        let mut layer = AnnotationLayer::new(Tool::OpenPath);
        layer.begin((0.0, 0.0));
        layer.extend((0.1, 0.1));
        layer.extend((5.0, 0.0));
        match layer.drawing() {
            DrawingState::Path { points, closed } => {
                assert_eq!(points.len(), 2);
                assert!(!closed);
            }
            other => panic!("unexpected drawing state {other:?}"),
        }
    }

    #[test]
    fn erase_removes_topmost_hit() {
        let mut layer = AnnotationLayer::new(Tool::Rect);
        draw(&mut layer, &[(0.0, 0.0), (100.0, 100.0)]);
        draw(&mut layer, &[(20.0, 20.0), (40.0, 40.0)]);
        layer.set_tool(Tool::Line);
        draw(&mut layer, &[(200.0, 0.0), (200.0, 100.0)]);

        let removed = layer.erase_at((30.0, 30.0), 2.0).unwrap();
        assert_eq!(removed.id, 1);
        assert_eq!(layer.erase_at((201.0, 50.0), 2.0).map(|a| a.id), Some(2));
        assert_eq!(layer.erase_at((300.0, 300.0), 2.0), None);
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn ellipse_hit_uses_its_interior() {
        let shape = Shape::from_drag(Tool::Circle, (0.0, 0.0), (20.0, 10.0)).unwrap();
        assert!(shape.hit((10.0, 5.0), 0.0));
        assert!(!shape.hit((1.0, 1.0), 0.0));
    }

    #[test]
    fn switching_tools_cancels_drawing() {
        let mut layer = AnnotationLayer::new(Tool::Rect);
        layer.begin((0.0, 0.0));
        layer.set_tool(Tool::Erase);
        assert!(!layer.drawing().is_drawing());
        assert_eq!(layer.finish(), None);
    }

    #[test]
    fn annotations_export_as_tagged_json() {
        let mut layer = AnnotationLayer::new(Tool::Line);
        draw(&mut layer, &[(0.0, 0.0), (3.0, 4.0)]);
        let json = layer.to_json().unwrap();
        let parsed: Vec<Annotation> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, layer.annotations());
        assert!(json.contains("\"type\": \"line\""));
    }

    #[test]
    fn annotation_ids_wrap_instead_of_overflowing() {
        let mut layer = AnnotationLayer::new(Tool::Rect);
        layer.next_id = AnnotationId::MAX;
        assert_eq!(draw(&mut layer, &[(0.0, 0.0), (10.0, 10.0)]), Some(AnnotationId::MAX));
        assert_eq!(draw(&mut layer, &[(0.0, 0.0), (10.0, 10.0)]), Some(0));
    }
}
