// Rings: three concentric rings whose radius bulges with the spectrum.
//
// Each ring walks its own window of the frequency buffer (offset 32 bins per
// ring) so adjacent rings don't pulse in unison. Stroked with a radial
// gradient from the theme's second stop (inside) to its first.

use std::f64::consts::TAU;

use super::{sample_at, RenderContext};
use crate::canvas::ColorStop;

pub const RING_COUNT: usize = 3;
const STEPS: usize = 120;
const WINDOW_OFFSET: usize = 32;
const WASH_ALPHA: f64 = 0.75;
const GLOW_BLUR: f64 = 16.0;
const LINE_WIDTH: f64 = 2.2;

/// Radius of a ring at one angular step.
pub fn ring_radius(base: f64, sample: f64, max_radius: f64, sensitivity: f64) -> f64 {
    base + sample * max_radius * 0.3 * sensitivity
}

pub fn draw(ctx: &mut RenderContext<'_>, frequency: &[u8]) {
    let (width, height) = (ctx.width, ctx.height);
    if width <= 0.0 || height <= 0.0 {
        return;
    }
    ctx.wash(Some(WASH_ALPHA));

    let (cx, cy) = (width / 2.0, height / 2.0);
    let max_radius = width.min(height) / 2.4;
    let sensitivity = ctx.sensitivity;
    let [outer_color, inner_color] = ctx.palette.gradient;

    let surface = &mut *ctx.surface;
    surface.save();
    surface.set_line_width(LINE_WIDTH);
    surface.set_shadow(GLOW_BLUR, ctx.palette.glow);

    for ring in 0..RING_COUNT {
        let base = (max_radius / RING_COUNT as f64) * (ring + 1) as f64;
        let offset = ring * WINDOW_OFFSET;

        surface.begin_path();
        for step in 0..=STEPS {
            let sample = sample_at(frequency, offset + step);
            let radius = ring_radius(base, sample, max_radius, sensitivity);
            let angle = step as f64 / STEPS as f64 * TAU;
            let (x, y) = (cx + angle.cos() * radius, cy + angle.sin() * radius);
            if step == 0 {
                surface.move_to(x, y);
            } else {
                surface.line_to(x, y);
            }
        }
        surface.close_path();

        let gradient = surface.create_radial_gradient(
            cx,
            cy,
            base * 0.2,
            cx,
            cy,
            base,
            vec![ColorStop::new(0.0, inner_color), ColorStop::new(1.0, outer_color)],
        );
        surface.set_stroke(gradient);
        surface.stroke();
    }
    surface.restore();
}
