// Bars: classic spectrum view.
//
// 64 bars across the width, each reading one slice of the frequency buffer.
// Height = sample^1.35 * height * 0.9 * sensitivity (at least 4 units),
// drawn as rounded-top rectangles filled with the theme's vertical gradient
// and a glow.

use super::{sample_at, RenderContext};
use crate::canvas::Paint;

pub const BAR_COUNT: usize = 64;
pub const MIN_BAR_HEIGHT: f64 = 4.0;
const CURVE: f64 = 1.35;
const BAR_FILL: f64 = 0.65;
const GLOW_BLUR: f64 = 18.0;

/// Height of one bar for a normalized sample.
pub fn bar_height(sample: f64, height: f64, sensitivity: f64) -> f64 {
    (sample.powf(CURVE) * height * 0.9 * sensitivity).max(MIN_BAR_HEIGHT)
}

pub fn draw(ctx: &mut RenderContext<'_>, frequency: &[u8], gradient: Paint) {
    let (width, height) = (ctx.width, ctx.height);
    if width <= 0.0 || height <= 0.0 {
        return;
    }
    ctx.wash(None);

    let slice = (frequency.len() / BAR_COUNT).max(1);
    let slot = width / BAR_COUNT as f64;
    let radius = (slot / 2.5).min(12.0);
    let bar_width = slot * BAR_FILL;

    let surface = &mut *ctx.surface;
    surface.save();
    surface.set_fill(gradient);
    surface.set_shadow(GLOW_BLUR, ctx.palette.glow);

    for index in 0..BAR_COUNT {
        let sample = sample_at(frequency, index * slice);
        let bar = bar_height(sample, height, ctx.sensitivity);
        let top = height - bar;
        let left = index as f64 * slot + (slot - bar_width) / 2.0;
        let right = left + bar_width;

        surface.begin_path();
        surface.move_to(left, height);
        surface.line_to(left, top + radius);
        surface.quadratic_curve_to(left, top, left + radius, top);
        surface.line_to(right - radius, top);
        surface.quadratic_curve_to(right, top, right, top + radius);
        surface.line_to(right, height);
        surface.close_path();
        surface.fill();
    }
    surface.restore();
}
