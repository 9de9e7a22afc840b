//! Geometry for the sales chart page: turns (label, quantity) rows into
//! SVG pie slices the template can draw directly.

use serde::Serialize;
use std::f64::consts::TAU;

/// Plotly "Plasma" sequence, reused here so the page keeps the look of
/// the report it replaces.
const PALETTE: [&str; 10] = [
    "#0d0887", "#46039f", "#7201a8", "#9c179e", "#bd3786", "#d8576b", "#ed7953", "#fb9f3a",
    "#fdca26", "#f0f921",
];

#[derive(Serialize, Debug, Clone)]
pub struct PieSlice {
    pub label: String,
    pub value: i64,
    pub percent: f64,
    pub path: String,
    pub color: &'static str,
}

/// Builds one filled wedge per row, clockwise from 12 o'clock.
/// Rows with a non-positive total produce no slices.
pub fn pie_slices(data: &[(&str, i64)], cx: f64, cy: f64, r: f64) -> Vec<PieSlice> {
    let total: i64 = data.iter().map(|(_, v)| v).sum();
    if total <= 0 {
        return Vec::new();
    }

    let mut slices = Vec::with_capacity(data.len());
    let mut angle = -TAU / 4.0;
    for (i, (label, value)) in data.iter().enumerate() {
        let sweep = *value as f64 / total as f64 * TAU;
        let (x0, y0) = point_on_circle(cx, cy, r, angle);
        let (x1, y1) = point_on_circle(cx, cy, r, angle + sweep);
        let large_arc = i32::from(sweep > TAU / 2.0);
        slices.push(PieSlice {
            label: (*label).to_string(),
            value: *value,
            percent: *value as f64 * 100.0 / total as f64,
            path: format!(
                "M{cx:.2} {cy:.2} L{x0:.2} {y0:.2} A{r:.2} {r:.2} 0 {large_arc} 1 {x1:.2} {y1:.2} Z"
            ),
            color: PALETTE[i % PALETTE.len()],
        });
        angle += sweep;
    }
    slices
}

fn point_on_circle(cx: f64, cy: f64, r: f64, angle: f64) -> (f64, f64) {
    (cx + r * angle.cos(), cy + r * angle.sin())
}
