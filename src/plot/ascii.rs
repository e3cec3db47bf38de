//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed samples: `o`
//! - fitted curve / trend line: `-`
//! - threshold marker: `|` from the bottom edge up to `f(x0)`

use crate::domain::{CurveFile, LinearFit, LogisticFit, PlotPoint};

/// Normalized samples, fitted logistic and threshold marker on the `[0, 1]` axis.
pub fn render_logistic_plot(xs: &[f64], ys: &[f64], fit: &LogisticFit, width: usize, height: usize) -> String {
    let points = zip_points(xs, ys);
    let curve: Vec<(f64, f64)> = fit
        .prediction_grid(width.max(2))
        .into_iter()
        .map(|p| (p.x, p.y))
        .collect();
    render_plot(&points, &curve, Some(fit.threshold_point()), (0.0, 1.0), width, height)
}

/// Plot a saved curve file: normalized samples over the stored prediction grid.
pub fn render_curve_file_plot(curve: &CurveFile, width: usize, height: usize) -> String {
    let norm = &curve.fit.normalization;
    let xs: Vec<f64> = curve.intensities.iter().map(|&i| norm.normalize_x(i)).collect();
    let ys: Vec<f64> = curve.responses.iter().map(|&r| norm.normalize_y(r)).collect();
    let grid: Vec<(f64, f64)> = curve
        .grid
        .x
        .iter()
        .zip(curve.grid.y.iter())
        .map(|(&x, &y)| (x, y))
        .collect();
    let x_range = x_range(grid.iter().map(|p| p.0)).unwrap_or((0.0, 1.0));
    render_plot(
        &zip_points(&xs, &ys),
        &grid,
        Some(curve.fit.threshold_point()),
        x_range,
        width,
        height,
    )
}

/// Scatter with its OLS trend line across the observed x-range.
pub fn render_scatter_plot(xs: &[f64], ys: &[f64], fit: &LinearFit, width: usize, height: usize) -> String {
    let points = zip_points(xs, ys);
    let line = [(fit.line[0].x, fit.line[0].y), (fit.line[1].x, fit.line[1].y)];
    let x_range = x_range(xs.iter().copied()).unwrap_or((fit.line[0].x, fit.line[1].x + 1.0));
    render_plot(&points, &line, None, x_range, width, height)
}

fn zip_points(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    xs.iter().zip(ys.iter()).map(|(&x, &y)| (x, y)).collect()
}

fn render_plot(
    points: &[(f64, f64)],
    curve: &[(f64, f64)],
    marker: Option<PlotPoint>,
    (x_min, x_max): (f64, f64),
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (y_min, y_max) = y_range(points, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curve first (so points can overlay).
    draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max);

    if let Some(m) = marker {
        let x = map_x(m.x, x_min, x_max, width);
        let top = map_y(m.y, y_min, y_max, height);
        draw_line(&mut grid, x, height - 1, x, top, '|');
    }

    for &(px, py) in points {
        if !(px.is_finite() && py.is_finite()) {
            continue;
        }
        let x = map_x(px, x_min, x_max, width);
        let y = map_y(py, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    // Build final string. We include a small header with ranges.
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.3}, {y_max:.3}]\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn x_range(xs: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for x in xs.filter(|x| x.is_finite()) {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }
    if min_x.is_finite() && max_x.is_finite() && max_x > min_x {
        Some((min_x, max_x))
    } else {
        None
    }
}

fn y_range(points: &[(f64, f64)], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for &(_, y) in points.iter().chain(curve.iter()) {
        if y.is_finite() {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve.iter().filter(|(x, y)| x.is_finite() && y.is_finite()) {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, '-');
        } else {
            grid[row][col] = '-';
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
