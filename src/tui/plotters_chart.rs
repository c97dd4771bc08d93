//! Plotters-powered chart widgets for Ratatui.
//!
//! Two render-only widgets over the per-manager distribution:
//! - `RankedBarChart`: horizontal bars, largest on top
//! - `DonutChart`: share of the total as ring wedges
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use std::f64::consts::TAU;

use plotters::prelude::*;
// `ratatui::style::Color` below shadows the prelude trait that provides `filled`.
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Inner radius of the donut as a fraction of the outer radius.
pub const DONUT_HOLE: f64 = 0.6;

/// Horizontal ranked bar chart.
///
/// `bars` are `(label, value)` pairs, smallest first; index 0 is drawn at the
/// bottom so the largest bar ends up on top.
pub struct RankedBarChart<'a> {
    pub bars: &'a [(String, f64)],
    pub fmt_value: fn(f64) -> String,
}

impl<'a> Widget for RankedBarChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !chart_fits(area, buf) || self.bars.is_empty() {
            return;
        }

        let (x0, x1) = value_bounds(self.bars);
        let n = self.bars.len() as f64;
        let max = self.bars.iter().map(|(_, v)| v.abs()).fold(0.0, f64::max);

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 12)
                .set_label_area_size(LabelAreaPosition::Bottom, 2)
                .build_cartesian_2d(x0..x1, 0.0..n)?;

            let labels = self.bars;
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(4)
                .y_labels(labels.len())
                .x_label_formatter(&|v| (self.fmt_value)(*v))
                .y_label_formatter(&|v| bar_label(labels, *v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            chart.draw_series(self.bars.iter().enumerate().map(|(i, (_, value))| {
                let y = i as f64;
                Rectangle::new(
                    [(0.0, y + 0.15), (*value, y + 0.85)],
                    reds(value.abs(), max).filled(),
                )
            }))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Donut share chart. Slices with a non-positive value are skipped.
pub struct DonutChart<'a> {
    pub slices: &'a [(String, f64)],
}

impl<'a> Widget for DonutChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !chart_fits(area, buf) {
            return;
        }

        let values: Vec<f64> = self.slices.iter().map(|(_, v)| *v).collect();
        let wedges = donut_wedges(&values, DONUT_HOLE, 48);
        if wedges.is_empty() {
            return;
        }
        let count = wedges.len();

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .build_cartesian_2d(-1.1_f64..1.1_f64, -1.1_f64..1.1_f64)?;

            chart.draw_series(
                wedges
                    .iter()
                    .enumerate()
                    .map(|(i, points)| Polygon::new(points.clone(), greys(i, count).filled())),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

fn chart_fits(area: Rect, buf: &mut Buffer) -> bool {
    // When the available area is too small, Plotters may fail to build a chart.
    // In that case, we render a small hint rather than panicking.
    if area.width < 20 || area.height < 8 {
        buf.set_string(
            area.x,
            area.y,
            "Chart area too small (resize terminal).",
            Style::default().fg(Color::Yellow),
        );
        return false;
    }
    true
}

/// X range covering every bar and the zero baseline, padded a little on the right.
pub fn value_bounds(bars: &[(String, f64)]) -> (f64, f64) {
    let mut lo = 0.0_f64;
    let mut hi = 0.0_f64;
    for (_, v) in bars {
        if v.is_finite() {
            lo = lo.min(*v);
            hi = hi.max(*v);
        }
    }
    if hi - lo <= 0.0 {
        return (0.0, 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo, hi + pad)
}

fn bar_label(bars: &[(String, f64)], v: f64) -> String {
    if v < 0.0 {
        return String::new();
    }
    bars.get(v.floor() as usize)
        .map(|(label, _)| label.chars().take(10).collect())
        .unwrap_or_default()
}

/// Ring wedges for `values` (positive values only), each as a closed polygon
/// in unit coordinates. Angles start at 12 o'clock and run clockwise.
pub fn donut_wedges(values: &[f64], hole: f64, steps_per_turn: usize) -> Vec<Vec<(f64, f64)>> {
    let total: f64 = values.iter().filter(|v| v.is_finite() && **v > 0.0).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut wedges = Vec::new();
    let mut start = 0.0_f64;
    for &v in values {
        if !v.is_finite() || v <= 0.0 {
            continue;
        }
        let sweep = TAU * v / total;
        let steps = ((steps_per_turn as f64 * v / total).ceil() as usize).max(2);

        let mut points = Vec::with_capacity(2 * (steps + 1));
        for k in 0..=steps {
            let a = start + sweep * k as f64 / steps as f64;
            points.push(polar(1.0, a));
        }
        for k in (0..=steps).rev() {
            let a = start + sweep * k as f64 / steps as f64;
            points.push(polar(hole, a));
        }
        wedges.push(points);
        start += sweep;
    }
    wedges
}

fn polar(r: f64, angle: f64) -> (f64, f64) {
    (r * angle.sin(), r * angle.cos())
}

/// Light-to-dark red by magnitude.
fn reds(value: f64, max: f64) -> RGBColor {
    let u = if max > 0.0 { (value / max).clamp(0.0, 1.0) } else { 0.0 };
    let fade = (200.0 * (1.0 - u)) as u8;
    RGBColor(255 - (80.0 * u) as u8, fade, fade)
}

/// Dark-to-light grey ramp across `count` slices.
fn greys(i: usize, count: usize) -> RGBColor {
    let u = if count > 1 { i as f64 / (count - 1) as f64 } else { 0.0 };
    let level = (60.0 + 170.0 * u) as u8;
    RGBColor(level, level, level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotters::style::Color as _;

    #[test]
    fn wedges_skip_non_positive_values() {
        let wedges = donut_wedges(&[10.0, 0.0, 30.0, -5.0], DONUT_HOLE, 24);
        assert_eq!(wedges.len(), 2);
        assert!(donut_wedges(&[0.0, -1.0], DONUT_HOLE, 24).is_empty());
    }

    #[test]
    fn wedges_cover_the_full_ring() {
        let wedges = donut_wedges(&[1.0, 3.0], 0.5, 24);
        // First wedge starts at 12 o'clock on the outer ring.
        let (x, y) = wedges[0][0];
        assert!(x.abs() < 1e-9 && (y - 1.0).abs() < 1e-9);
        // Last outer point of the last wedge closes the circle.
        let last = &wedges[1];
        let outer_end = last[last.len() / 2 - 1];
        assert!(outer_end.0.abs() < 1e-9 && (outer_end.1 - 1.0).abs() < 1e-9);
        // Inner points sit on the hole radius.
        let (ix, iy) = last[last.len() - 1];
        assert!(((ix * ix + iy * iy).sqrt() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn bounds_include_zero_and_pad() {
        let bars = vec![("a".to_string(), 50.0), ("b".to_string(), 100.0)];
        let (lo, hi) = value_bounds(&bars);
        assert_eq!(lo, 0.0);
        assert!((hi - 105.0).abs() < 1e-9);
        assert_eq!(value_bounds(&[]), (0.0, 1.0));

        let mixed = vec![("a".to_string(), -20.0), ("b".to_string(), 20.0)];
        assert_eq!(value_bounds(&mixed).0, -20.0);
    }

    #[test]
    fn bar_and_slice_colors_fill() {
        let bar = reds(5.0, 10.0).filled();
        assert!(bar.filled);
        assert_eq!(bar.color.rgb(), (215, 100, 100));

        let slice = greys(0, 3).filled();
        assert!(slice.filled);
        assert_eq!(slice.color.rgb(), (60, 60, 60));
    }

    #[test]
    fn small_area_renders_hint() {
        let area = Rect::new(0, 0, 45, 4);
        let mut buf = Buffer::empty(area);
        let slices = vec![("a".to_string(), 1.0)];
        DonutChart { slices: &slices }.render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "C");
    }

    #[test]
    fn labels_follow_bar_index() {
        let bars = vec![("small".to_string(), 1.0), ("a long manager name".to_string(), 2.0)];
        assert_eq!(bar_label(&bars, 0.4), "small");
        assert_eq!(bar_label(&bars, 1.0), "a long man");
        assert_eq!(bar_label(&bars, 5.0), "");
        assert_eq!(bar_label(&bars, -1.0), "");
    }
}
