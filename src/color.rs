use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<[u8; 3]> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            [
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            ]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Stroke colours for annotations
// ---------------------------------------------------------------------------

/// Hands out annotation stroke colours in a repeating cycle.
#[derive(Debug, Clone)]
pub struct StrokeCycle {
    colors: Vec<[u8; 3]>,
    next: usize,
}

impl StrokeCycle {
    pub fn new(n: usize) -> Self {
        Self {
            colors: generate_palette(n.max(1)),
            next: 0,
        }
    }

    pub fn next_color(&mut self) -> [u8; 3] {
        let c = self.colors[self.next % self.colors.len()];
        self.next += 1;
        c
    }
}

impl Default for StrokeCycle {
    fn default() -> Self {
        Self::new(8)
    }
}

pub fn to_color32([r, g, b]: [u8; 3]) -> Color32 {
    Color32::from_rgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_hues_are_distinct() {
        let colors = generate_palette(6);
        assert_eq!(colors.len(), 6);
        for (i, a) in colors.iter().enumerate() {
            assert!(colors[i + 1..].iter().all(|b| b != a));
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn stroke_cycle_wraps_around() {
        let mut cycle = StrokeCycle::new(2);
        let first = cycle.next_color();
        let second = cycle.next_color();
        assert_ne!(first, second);
        assert_eq!(cycle.next_color(), first);
    }
}
