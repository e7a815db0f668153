//! PNG rendering of the top-entry charts with the plotters bitmap backend.

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::{PI, TAU};
use std::fmt::Display;
use std::path::Path;

use crate::error::RenderError;
use crate::visualize::{ChartKind, TopEntries};

const FONT: &str = "sans-serif";
const LEGEND_WIDTH: u32 = 180;

/// Pixel size of a single-figure chart before trimming. Subplots scale the height
/// with the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

/// Largest canvas drawn, in pixels. The RGB buffer is three bytes per pixel.
pub const MAX_PIXELS: u64 = 40_000_000;

/// White border kept around the drawn content when the image is trimmed.
const TRIM_PAD: u32 = 12;

/// Draw `entries` as `kind` into `path`, creating the parent directory if needed.
/// The saved image is trimmed to the drawn content.
pub fn render_chart(
    kind: ChartKind,
    entries: &TopEntries,
    path: &Path,
    size: ChartSize,
) -> Result<(), RenderError> {
    if entries.is_empty() {
        return Err(RenderError::NoEntries);
    }
    if entries.value_columns.is_empty() {
        return Err(RenderError::NoValueColumns);
    }
    let (width, height) = canvas_size(kind, entries.len(), size)?;
    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        match kind {
            ChartKind::Subplots => draw_subplots(&root, entries)?,
            ChartKind::GroupedBars => draw_grouped_bars(&root, entries)?,
            ChartKind::HorizontalBars => draw_horizontal_bars(&root, entries)?,
            ChartKind::Pie => draw_pie(&root, entries)?,
        }
        root.present().map_err(draw_err)?;
    }

    let (pixels, width, height) = trim_to_content(&pixels, width, height, TRIM_PAD);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut backend = BitMapBackend::new(path, (width, height));
    backend
        .blit_bitmap((0, 0), (width, height), &pixels)
        .map_err(draw_err)?;
    backend.present().map_err(draw_err)?;
    Ok(())
}

/// Canvas for `kind` with `entries` entries. Subplots grow one panel row per two
/// entries; every other layout uses `size` as is.
pub fn canvas_size(kind: ChartKind, entries: usize, size: ChartSize) -> Result<(u32, u32), RenderError> {
    let height = match kind {
        ChartKind::Subplots => {
            let rows = entries.div_ceil(2) as u64;
            let panel_height = u64::from((size.height / 7 * 5).max(200));
            panel_height.saturating_mul(rows).saturating_add(60)
        }
        _ => u64::from(size.height),
    };
    let width = u64::from(size.width);
    match u32::try_from(height) {
        Ok(h) if width.saturating_mul(height) <= MAX_PIXELS => Ok((size.width, h)),
        _ => Err(RenderError::TooLarge { width, height }),
    }
}

/// Crop an RGB buffer to the smallest box holding every non-white pixel, plus `pad`
/// pixels of margin. An all-white image is returned unchanged.
pub fn trim_to_content(pixels: &[u8], width: u32, height: u32, pad: u32) -> (Vec<u8>, u32, u32) {
    let (w, h) = (width as usize, height as usize);
    let mut bounds: Option<(usize, usize, usize, usize)> = None;
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) * 3;
            if pixels[i..i + 3] == [255, 255, 255] {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    let Some((x0, y0, x1, y1)) = bounds else {
        return (pixels.to_vec(), width, height);
    };
    let pad = pad as usize;
    let (x0, y0) = (x0.saturating_sub(pad), y0.saturating_sub(pad));
    let (x1, y1) = ((x1 + pad).min(w - 1), (y1 + pad).min(h - 1));
    let mut out = Vec::with_capacity((x1 - x0 + 1) * (y1 - y0 + 1) * 3);
    for y in y0..=y1 {
        out.extend_from_slice(&pixels[(y * w + x0) * 3..(y * w + x1 + 1) * 3]);
    }
    (out, (x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32)
}

/// `n` evenly spaced hues, one per value column.
pub fn palette(n: usize) -> Vec<RGBColor> {
    let n = n.max(1);
    (0..n)
        .map(|i| {
            let hue = 0.01 + i as f64 / n as f64;
            let (r, g, b) = HSLColor(hue.fract(), 0.65, 0.55).to_backend_color().rgb;
            RGBColor(r, g, b)
        })
        .collect()
}

/// Compact numeric label: scientific for very large or very small magnitudes.
pub fn format_value(v: f64) -> String {
    if v.abs() >= 1e6 || (v.abs() < 1e-2 && v != 0.0) {
        format!("{:.2e}", v)
    } else if v == v.trunc() {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

/// Axis range covering zero and every value, padded by 5%.
pub fn value_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = (hi - lo).abs().max(1.0) * 0.05;
    let lo = if lo < 0.0 { lo - pad } else { 0.0 };
    let hi = if hi > 0.0 { hi + pad } else { 0.0 };
    if hi > lo {
        (lo, hi)
    } else {
        (lo, lo + 1.0)
    }
}

/// Label for an integer position on a categorical axis laid out over `-0.5..k-0.5`.
fn category_label(names: &[String], v: f64) -> String {
    let idx = v.round();
    if (v - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    names.get(idx as usize).cloned().unwrap_or_default()
}

fn draw_err(e: impl Display) -> RenderError {
    RenderError::Draw(e.to_string())
}

/// One bar chart per entry in a two-column grid; rows = ceil(entries / 2).
fn draw_subplots(root: &DrawingArea<BitMapBackend<'_>, Shift>, entries: &TopEntries) -> Result<(), RenderError> {
    let rows = entries.len().div_ceil(2);
    let root = root
        .titled(ChartKind::Subplots.title(), (FONT, 28))
        .map_err(draw_err)?;

    let colors = palette(entries.value_columns.len());
    let panels = root.split_evenly((rows, 2));
    for (idx, panel) in panels.iter().enumerate().take(entries.len()) {
        let caption = format!("{}: {}", entries.id_column, entries.labels[idx]);
        draw_panel(
            panel,
            &caption,
            &entries.value_columns,
            &entries.values[idx],
            &colors,
        )?;
    }
    Ok(())
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    caption: &str,
    names: &[String],
    values: &[f64],
    colors: &[RGBColor],
) -> Result<(), RenderError> {
    let k = names.len();
    let (y_min, y_max) = value_range(values.iter().copied());
    let mut chart = ChartBuilder::on(area)
        .caption(caption, (FONT, 20))
        .margin(15)
        .x_label_area_size(90)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..(k as f64 - 0.5), y_min..y_max)
        .map_err(draw_err)?;

    // plotters can only rotate text by multiples of 90 degrees.
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(k)
        .x_label_formatter(&|v: &f64| category_label(names, *v))
        .x_label_style((FONT, 14).into_font().transform(FontTransform::Rotate90))
        .y_label_formatter(&|v: &f64| format_value(*v))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, &v)| {
            let x = i as f64;
            let color = colors[i % colors.len()];
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, v)], color.filled())
        }))
        .map_err(draw_err)?;
    Ok(())
}

/// Side-by-side bars per entry, one color per value column, legend on the right.
fn draw_grouped_bars(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    entries: &TopEntries,
) -> Result<(), RenderError> {
    let (width, _) = root.dim_in_pixel();
    let (plot_area, legend_area) = root.split_horizontally(width.saturating_sub(LEGEND_WIDTH).max(1));

    let k = entries.len();
    let series = entries.value_columns.len();
    let colors = palette(series);
    let records = entries.melt();
    let (y_min, y_max) = value_range(records.iter().map(|r| r.value));

    let mut chart = ChartBuilder::on(&plot_area)
        .caption(ChartKind::GroupedBars.title(), (FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..(k as f64 - 0.5), y_min..y_max)
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(k)
        .x_label_formatter(&|v: &f64| category_label(&entries.labels, *v))
        .y_label_formatter(&|v: &f64| format_value(*v))
        .x_desc(entries.id_column.as_str())
        .y_desc("Values")
        .draw()
        .map_err(draw_err)?;

    let group_width = 0.8;
    let bar_width = group_width / series as f64;
    for (c, color) in colors.iter().enumerate() {
        chart
            .draw_series(entries.values.iter().enumerate().map(|(i, row)| {
                let x0 = i as f64 - group_width / 2.0 + c as f64 * bar_width;
                Rectangle::new([(x0, 0.0), (x0 + bar_width, row[c])], color.filled())
            }))
            .map_err(draw_err)?;
    }

    draw_side_legend(&legend_area, "Metrics", &entries.value_columns, &colors)
}

fn draw_side_legend(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    names: &[String],
    colors: &[RGBColor],
) -> Result<(), RenderError> {
    let top = 60;
    area.draw(&Text::new(title, (10, top), (FONT, 18).into_font()))
        .map_err(draw_err)?;
    for (i, name) in names.iter().enumerate() {
        let y = top + 30 + i as i32 * 24;
        let color = colors[i % colors.len()];
        area.draw(&Rectangle::new([(10, y), (24, y + 14)], color.filled()))
            .map_err(draw_err)?;
        area.draw(&Text::new(name.as_str(), (32, y), (FONT, 15).into_font()))
            .map_err(draw_err)?;
    }
    Ok(())
}

/// One stacked horizontal bar per entry; the first entry is drawn at the bottom.
fn draw_horizontal_bars(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    entries: &TopEntries,
) -> Result<(), RenderError> {
    let k = entries.len();
    let colors = palette(entries.value_columns.len());
    let segments = stack_segments(&entries.values);
    let (x_min, x_max) = value_range(segments.iter().flatten().flat_map(|&(a, b)| [a, b]));

    let mut chart = ChartBuilder::on(root)
        .caption(ChartKind::HorizontalBars.title(), (FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(120)
        .build_cartesian_2d(x_min..x_max, -0.5..(k as f64 - 0.5))
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(k)
        .y_label_formatter(&|v: &f64| category_label(&entries.labels, *v))
        .x_label_formatter(&|v: &f64| format_value(*v))
        .x_desc("Total Values")
        .y_desc(entries.id_column.as_str())
        .draw()
        .map_err(draw_err)?;

    for (c, (name, color)) in entries.value_columns.iter().zip(&colors).enumerate() {
        let color = *color;
        chart
            .draw_series(segments.iter().enumerate().map(|(i, row)| {
                let (start, end) = row[c];
                let y = i as f64;
                Rectangle::new([(start, y - 0.4), (end, y + 0.4)], color.filled())
            }))
            .map_err(draw_err)?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;
    Ok(())
}

/// `(start, end)` of each value's segment. Positive values stack rightwards from zero,
/// negative values leftwards.
fn stack_segments(values: &[Vec<f64>]) -> Vec<Vec<(f64, f64)>> {
    values
        .iter()
        .map(|row| {
            let (mut pos, mut neg) = (0.0, 0.0);
            row.iter()
                .map(|&v| {
                    if v >= 0.0 {
                        let seg = (pos, pos + v);
                        pos += v;
                        seg
                    } else {
                        let seg = (neg + v, neg);
                        neg += v;
                        seg
                    }
                })
                .collect()
        })
        .collect()
}

/// Wedge shares of each total. Fails on a negative or non-finite total, or when
/// every total is zero.
pub fn wedge_fractions(labels: &[String], totals: &[f64]) -> Result<Vec<f64>, RenderError> {
    if let Some((label, _)) = labels
        .iter()
        .zip(totals)
        .find(|(_, t)| !t.is_finite() || **t < 0.0)
    {
        return Err(RenderError::InvalidWedge {
            label: label.clone(),
        });
    }
    let sum: f64 = totals.iter().sum();
    if sum <= 0.0 {
        return Err(RenderError::Draw("pie totals sum to zero".to_string()));
    }
    Ok(totals.iter().map(|t| t / sum).collect())
}

/// Wedges start at 12 o'clock and run counter-clockwise in rank order.
fn draw_pie(root: &DrawingArea<BitMapBackend<'_>, Shift>, entries: &TopEntries) -> Result<(), RenderError> {
    let fractions = wedge_fractions(&entries.labels, &entries.totals)?;
    let colors = palette(entries.value_columns.len());

    let root = root
        .titled(ChartKind::Pie.title(), (FONT, 24))
        .map_err(draw_err)?;
    let (w, h) = root.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = f64::from(w.min(h)) * 0.38;

    // plotters sweeps clockwise on screen, so reversing the wedges from the top
    // gives the counter-clockwise layout.
    let sizes: Vec<f64> = entries.totals.iter().rev().copied().collect();
    let wedge_colors: Vec<RGBColor> = (0..entries.len())
        .rev()
        .map(|i| colors[i % colors.len()])
        .collect();
    let labels: Vec<String> = entries.labels.iter().rev().cloned().collect();
    let mut pie = Pie::new(&center, &radius, &sizes, &wedge_colors, &labels);
    pie.start_angle(-90.0);
    pie.label_style((FONT, 18).into_font().color(&BLACK));
    root.draw(&pie).map_err(draw_err)?;

    let point = |angle: f64, r: f64| {
        (
            center.0 + (r * angle.cos()).round() as i32,
            center.1 + (r * angle.sin()).round() as i32,
        )
    };
    let centered = (FONT, 16)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    let mut angle = -PI / 2.0;
    for fraction in fractions.iter().rev() {
        root.draw(&PathElement::new(
            vec![center, point(angle, radius)],
            WHITE.stroke_width(3),
        ))
        .map_err(draw_err)?;
        let mid = angle + fraction * TAU / 2.0;
        let text = format!("{:.1}%", fraction * 100.0);
        root.draw(&Text::new(text, point(mid, radius * 0.6), centered.clone()))
            .map_err(draw_err)?;
        angle += fraction * TAU;
    }
    Ok(())
}
