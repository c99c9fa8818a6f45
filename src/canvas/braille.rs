// Braille-dot raster: a `Surface` whose backing store is a grid of 2x4 dots
// per terminal cell, rendered as a ratatui widget.
//
// Each dot keeps a coverage level and a color. Paths are flattened to
// polylines, fills use even-odd scanlines, strokes stamp a disk along each
// segment. Rectangles act as washes: braille has no background pixels, so a
// rect fades the dots it covers by the paint's alpha and records the paint
// color as the panel backdrop. Shadows are accepted and ignored; a dot grid
// has nothing to blur.

use std::f64::consts::TAU;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;

use super::{Composite, Paint, Rgba, Surface};

const DOT_BITS: [u8; 8] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80];
const DOT_OFFSETS: [(usize, usize); 8] = [
    (0, 0),
    (0, 1),
    (0, 2),
    (1, 0),
    (1, 1),
    (1, 2),
    (0, 3),
    (1, 3),
];

/// Dots at or above this coverage are drawn.
const LIT_THRESHOLD: f32 = 0.3;
const CURVE_SEGMENTS: usize = 8;

#[derive(Debug, Clone, Copy)]
struct Dot {
    level: f32,
    color: Rgba,
}

impl Default for Dot {
    fn default() -> Self {
        Self {
            level: 0.0,
            color: Rgba::rgb(0, 0, 0),
        }
    }
}

#[derive(Debug, Clone)]
struct DrawState {
    transform: [f64; 6],
    fill: Paint,
    stroke: Paint,
    line_width: f64,
    alpha: f64,
    composite: Composite,
    shadow_blur: f64,
    shadow_color: Rgba,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            fill: Paint::default(),
            stroke: Paint::default(),
            line_width: 1.0,
            alpha: 1.0,
            composite: Composite::SourceOver,
            shadow_blur: 0.0,
            shadow_color: Rgba::rgba(0, 0, 0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct SubPath {
    points: Vec<(f64, f64)>,
    closed: bool,
}

#[derive(Default)]
pub struct BrailleCanvas {
    width: u32,
    height: u32,
    dots: Vec<Dot>,
    backdrop: Option<Rgba>,
    state: DrawState,
    stack: Vec<DrawState>,
    path: Vec<SubPath>,
}

impl BrailleCanvas {
    /// Create a canvas covering `cols` x `rows` terminal cells.
    pub fn with_cells(cols: u16, rows: u16) -> Self {
        let mut canvas = Self::default();
        canvas.set_backing_size(u32::from(cols) * 2, u32::from(rows) * 4);
        canvas
    }

    pub fn cells(&self) -> (u16, u16) {
        (
            self.width.div_ceil(2).min(u32::from(u16::MAX)) as u16,
            self.height.div_ceil(4).min(u32::from(u16::MAX)) as u16,
        )
    }

    /// Coverage of one dot, 0.0 when out of range.
    pub fn dot_level(&self, x: u32, y: u32) -> f32 {
        self.index(x, y).map_or(0.0, |i| self.dots[i].level)
    }

    pub fn lit_dots(&self) -> usize {
        self.dots.iter().filter(|d| d.level >= LIT_THRESHOLD).count()
    }

    pub fn backdrop(&self) -> Option<Rgba> {
        self.backdrop
    }

    pub fn clear(&mut self) {
        self.dots.iter_mut().for_each(|d| *d = Dot::default());
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    fn to_device(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.state.transform;
        (a * x + c * y + e, b * x + d * y + f)
    }

    fn to_logical(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.state.transform;
        let det = a * d - b * c;
        if det.abs() <= f64::EPSILON {
            return (x, y);
        }
        let (x, y) = (x - e, y - f);
        ((d * x - c * y) / det, (a * y - b * x) / det)
    }

    fn scale(&self) -> f64 {
        let [a, b, c, d, _, _] = self.state.transform;
        (a * d - b * c).abs().sqrt().max(f64::EPSILON)
    }

    fn current_point(&self) -> Option<(f64, f64)> {
        self.path.last().and_then(|p| p.points.last().copied())
    }

    fn plot(&mut self, index: usize, color: Rgba) {
        let alpha = (self.state.alpha * color.a).clamp(0.0, 1.0) as f32;
        if alpha <= 0.0 {
            return;
        }
        let composite = self.state.composite;
        let dot = &mut self.dots[index];
        match composite {
            Composite::SourceOver => {
                dot.color = if dot.level <= 0.0 {
                    color
                } else {
                    dot.color.lerp(color, f64::from(alpha))
                };
                dot.level = dot.level * (1.0 - alpha) + alpha;
            }
            Composite::Lighter => {
                let add = |a: u8, b: u8| {
                    (f64::from(a) + f64::from(b) * f64::from(alpha)).min(255.0) as u8
                };
                dot.color = if dot.level <= 0.0 {
                    color
                } else {
                    Rgba::rgb(
                        add(dot.color.r, color.r),
                        add(dot.color.g, color.g),
                        add(dot.color.b, color.b),
                    )
                };
                dot.level = (dot.level + alpha).min(1.0);
            }
        }
    }

    fn device_polylines(&self) -> Vec<(Vec<(f64, f64)>, bool)> {
        self.path
            .iter()
            .filter(|p| !p.points.is_empty())
            .map(|p| {
                let points = p.points.iter().map(|&(x, y)| self.to_device(x, y)).collect();
                (points, p.closed)
            })
            .collect()
    }

    fn paint_at_device(&self, paint: &Paint, x: f64, y: f64) -> Rgba {
        let (lx, ly) = self.to_logical(x, y);
        paint.color_at(lx, ly)
    }
}

impl Surface for BrailleCanvas {
    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.state.transform = [a, b, c, d, e, f];
    }

    fn set_fill(&mut self, paint: Paint) {
        self.state.fill = paint;
    }

    fn set_stroke(&mut self, paint: Paint) {
        self.state.stroke = paint;
    }

    fn set_line_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    fn set_shadow(&mut self, blur: f64, color: Rgba) {
        self.state.shadow_blur = blur;
        self.state.shadow_color = color;
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        if alpha.is_finite() {
            self.state.alpha = alpha.clamp(0.0, 1.0);
        }
    }

    fn set_composite(&mut self, op: Composite) {
        self.state.composite = op;
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.push(SubPath {
            points: vec![(x, y)],
            closed: false,
        });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        match self.path.last_mut() {
            Some(sub) if !sub.closed => sub.points.push((x, y)),
            _ => self.move_to(x, y),
        }
    }

    fn quadratic_curve_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        let Some((x0, y0)) = self.current_point() else {
            self.move_to(x, y);
            return;
        };
        for step in 1..=CURVE_SEGMENTS {
            let t = step as f64 / CURVE_SEGMENTS as f64;
            let mt = 1.0 - t;
            let px = mt * mt * x0 + 2.0 * mt * t * cx + t * t * x;
            let py = mt * mt * y0 + 2.0 * mt * t * cy + t * t * y;
            self.line_to(px, py);
        }
    }

    fn arc(&mut self, cx: f64, cy: f64, radius: f64, start: f64, end: f64) {
        if !(radius.is_finite() && radius >= 0.0) {
            return;
        }
        let sweep = (end - start).clamp(-TAU, TAU);
        let segments = ((sweep.abs() * radius * self.scale()).ceil() as usize).clamp(8, 128);
        let first = (cx + radius * start.cos(), cy + radius * start.sin());
        if self.current_point().is_some() {
            self.line_to(first.0, first.1);
        } else {
            self.move_to(first.0, first.1);
        }
        for step in 1..=segments {
            let angle = start + sweep * step as f64 / segments as f64;
            self.line_to(cx + radius * angle.cos(), cy + radius * angle.sin());
        }
    }

    fn close_path(&mut self) {
        if let Some(sub) = self.path.last_mut() {
            sub.closed = true;
        }
    }

    fn fill(&mut self) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let polygons = self.device_polylines();
        let mut edges: Vec<((f64, f64), (f64, f64))> = Vec::new();
        for (points, _) in &polygons {
            if points.len() < 3 {
                continue;
            }
            for i in 0..points.len() {
                edges.push((points[i], points[(i + 1) % points.len()]));
            }
        }
        if edges.is_empty() {
            return;
        }

        let paint = self.state.fill.clone();
        let mut crossings: Vec<f64> = Vec::new();
        for y in 0..self.height {
            let yc = f64::from(y) + 0.5;
            crossings.clear();
            for &((x0, y0), (x1, y1)) in &edges {
                if (y0 <= yc && y1 > yc) || (y1 <= yc && y0 > yc) {
                    crossings.push(x0 + (yc - y0) / (y1 - y0) * (x1 - x0));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil().max(0.0) as u32;
                let end = (span[1] - 0.5).floor().min(f64::from(self.width) - 1.0);
                if end < 0.0 {
                    continue;
                }
                for x in start..=end as u32 {
                    let color =
                        self.paint_at_device(&paint, f64::from(x) + 0.5, yc);
                    if let Some(index) = self.index(x, y) {
                        self.plot(index, color);
                    }
                }
            }
        }
    }

    fn stroke(&mut self) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let radius = (self.state.line_width * self.scale() / 2.0).max(0.5);
        let mut covered = vec![false; self.dots.len()];
        let mut touched: Vec<(u32, u32)> = Vec::new();

        for (points, closed) in self.device_polylines() {
            let mut segments: Vec<((f64, f64), (f64, f64))> =
                points.windows(2).map(|w| (w[0], w[1])).collect();
            if closed && points.len() > 2 {
                segments.push((points[points.len() - 1], points[0]));
            }
            if points.len() == 1 {
                segments.push((points[0], points[0]));
            }
            for ((x0, y0), (x1, y1)) in segments {
                let length = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
                let steps = (length * 2.0).ceil().max(1.0) as usize;
                for step in 0..=steps {
                    let t = step as f64 / steps as f64;
                    let (px, py) = (x0 + (x1 - x0) * t, y0 + (y1 - y0) * t);
                    let min_x = (px - radius).floor().max(0.0) as u32;
                    let min_y = (py - radius).floor().max(0.0) as u32;
                    let max_x = (px + radius).ceil().min(f64::from(self.width) - 1.0);
                    let max_y = (py + radius).ceil().min(f64::from(self.height) - 1.0);
                    if max_x < 0.0 || max_y < 0.0 {
                        continue;
                    }
                    for y in min_y..=max_y as u32 {
                        for x in min_x..=max_x as u32 {
                            let (dx, dy) = (f64::from(x) + 0.5 - px, f64::from(y) + 0.5 - py);
                            if dx * dx + dy * dy > radius * radius {
                                continue;
                            }
                            if let Some(index) = self.index(x, y) {
                                if !covered[index] {
                                    covered[index] = true;
                                    touched.push((x, y));
                                }
                            }
                        }
                    }
                }
            }
        }

        let paint = self.state.stroke.clone();
        for (x, y) in touched {
            let color = self.paint_at_device(&paint, f64::from(x) + 0.5, f64::from(y) + 0.5);
            if let Some(index) = self.index(x, y) {
                self.plot(index, color);
            }
        }
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let corners = [
            self.to_device(x, y),
            self.to_device(x + width, y),
            self.to_device(x, y + height),
            self.to_device(x + width, y + height),
        ];
        let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min).max(0.0);
        let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min).max(0.0);
        let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
        let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);
        let max_x = max_x.min(f64::from(self.width));
        let max_y = max_y.min(f64::from(self.height));
        if max_x <= min_x || max_y <= min_y {
            return;
        }

        let color = self.paint_at_device(&self.state.fill.clone(), min_x, min_y);
        let fade = (self.state.alpha * color.a).clamp(0.0, 1.0) as f32;
        for yy in min_y as u32..max_y.ceil() as u32 {
            for xx in min_x as u32..max_x.ceil() as u32 {
                if let Some(index) = self.index(xx, yy) {
                    self.dots[index].level *= 1.0 - fade;
                }
            }
        }
        self.backdrop = Some(color.with_alpha(1.0));
    }

    fn backing_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.dots = vec![Dot::default(); (width as usize) * (height as usize)];
        // Resizing a canvas resets its drawing state.
        self.state = DrawState::default();
        self.stack.clear();
        self.path.clear();
    }
}

fn to_color(rgba: Rgba, level: f32) -> Color {
    let scale = f64::from(level.clamp(0.0, 1.0)).max(0.35);
    Color::Rgb(
        (f64::from(rgba.r) * scale) as u8,
        (f64::from(rgba.g) * scale) as u8,
        (f64::from(rgba.b) * scale) as u8,
    )
}

impl Widget for &BrailleCanvas {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (cols, rows) = self.cells();
        let backdrop = self
            .backdrop
            .map(|c| Color::Rgb(c.r, c.g, c.b));

        for row in 0..rows.min(area.height) {
            for col in 0..cols.min(area.width) {
                let mut bits: u8 = 0;
                let mut brightest: Option<Dot> = None;
                for (i, &(dx, dy)) in DOT_OFFSETS.iter().enumerate() {
                    let x = u32::from(col) * 2 + dx as u32;
                    let y = u32::from(row) * 4 + dy as u32;
                    let Some(index) = self.index(x, y) else {
                        continue;
                    };
                    let dot = self.dots[index];
                    if dot.level >= LIT_THRESHOLD {
                        bits |= DOT_BITS[i];
                        if brightest.map_or(true, |b| dot.level > b.level) {
                            brightest = Some(dot);
                        }
                    }
                }

                let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) else {
                    continue;
                };
                if let Some(bg) = backdrop {
                    cell.set_bg(bg);
                }
                match brightest {
                    Some(dot) => {
                        let ch = char::from_u32(0x2800 + u32::from(bits)).unwrap_or(' ');
                        cell.set_char(ch);
                        cell.set_fg(to_color(dot.color, dot.level));
                    }
                    None => {
                        cell.set_char(' ');
                    }
                }
            }
        }
    }
}
