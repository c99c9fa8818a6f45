// 2D drawing surface used by the visualizer: path building, fill/stroke,
// gradients, alpha and compositing, and a device-pixel transform.

pub mod braille;

use std::cell::RefCell;
use std::rc::Rc;

pub use braille::BrailleCanvas;

/// 8-bit RGB plus a 0.0..=1.0 alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Linear interpolation in RGB space, alpha included.
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f64::from(a) * (1.0 - t) + f64::from(b) * t).round() as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a * (1.0 - t) + other.a * t,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorStop {
    pub offset: f64,
    pub color: Rgba,
}

impl ColorStop {
    pub fn new(offset: f64, color: Rgba) -> Self {
        Self { offset, color }
    }
}

/// Fill or stroke style.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Linear {
        from: (f64, f64),
        to: (f64, f64),
        stops: Vec<ColorStop>,
    },
    Radial {
        inner: (f64, f64, f64),
        outer: (f64, f64, f64),
        stops: Vec<ColorStop>,
    },
}

impl Default for Paint {
    fn default() -> Self {
        Paint::Solid(Rgba::rgb(0, 0, 0))
    }
}

impl Paint {
    /// Resolve the paint at a point given in the same coordinate space the
    /// gradient was defined in.
    pub fn color_at(&self, x: f64, y: f64) -> Rgba {
        match self {
            Paint::Solid(color) => *color,
            Paint::Linear { from, to, stops } => {
                let (dx, dy) = (to.0 - from.0, to.1 - from.1);
                let len_sq = dx * dx + dy * dy;
                let t = if len_sq <= f64::EPSILON {
                    0.0
                } else {
                    ((x - from.0) * dx + (y - from.1) * dy) / len_sq
                };
                sample_stops(stops, t)
            }
            Paint::Radial { inner, outer, stops } => {
                // Concentric approximation: distance from the outer center
                // mapped between the two radii.
                let dist = ((x - outer.0).powi(2) + (y - outer.1).powi(2)).sqrt();
                let span = outer.2 - inner.2;
                let t = if span.abs() <= f64::EPSILON {
                    1.0
                } else {
                    (dist - inner.2) / span
                };
                sample_stops(stops, t)
            }
        }
    }
}

fn sample_stops(stops: &[ColorStop], t: f64) -> Rgba {
    let Some(first) = stops.first() else {
        return Rgba::rgba(0, 0, 0, 0.0);
    };
    let t = t.clamp(0.0, 1.0);
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            let local = if span <= f64::EPSILON {
                1.0
            } else {
                (t - a.offset) / span
            };
            return a.color.lerp(b.color, local);
        }
    }
    stops[stops.len() - 1].color
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composite {
    #[default]
    SourceOver,
    /// Additive blending.
    Lighter,
}

/// Canvas-style immediate-mode drawing surface.
///
/// Coordinates passed to path methods are logical units; the current
/// transform maps them to backing-store pixels.
pub trait Surface {
    fn save(&mut self);
    fn restore(&mut self);
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64);

    fn set_fill(&mut self, paint: Paint);
    fn set_stroke(&mut self, paint: Paint);
    fn set_line_width(&mut self, width: f64);
    fn set_shadow(&mut self, blur: f64, color: Rgba);
    fn set_global_alpha(&mut self, alpha: f64);
    fn set_composite(&mut self, op: Composite);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quadratic_curve_to(&mut self, cx: f64, cy: f64, x: f64, y: f64);
    fn arc(&mut self, cx: f64, cy: f64, radius: f64, start: f64, end: f64);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Backing-store size in device pixels.
    fn backing_size(&self) -> (u32, u32);
    fn set_backing_size(&mut self, width: u32, height: u32);

    fn create_linear_gradient(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        stops: Vec<ColorStop>,
    ) -> Paint {
        Paint::Linear {
            from: (x0, y0),
            to: (x1, y1),
            stops,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn create_radial_gradient(
        &mut self,
        x0: f64,
        y0: f64,
        r0: f64,
        x1: f64,
        y1: f64,
        r1: f64,
        stops: Vec<ColorStop>,
    ) -> Paint {
        Paint::Radial {
            inner: (x0, y0, r0),
            outer: (x1, y1, r1),
            stops,
        }
    }
}

pub type SharedSurface = Rc<RefCell<dyn Surface>>;
