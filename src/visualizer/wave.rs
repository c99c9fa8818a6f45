// Wave: oscilloscope trace of the time-domain buffer.

use super::RenderContext;
use crate::canvas::Paint;

const WASH_ALPHA: f64 = 0.85;
const GLOW_BLUR: f64 = 14.0;

/// Map a byte sample centered at 128 into -1.0..=1.0.
pub fn normalize_sample(byte: u8) -> f64 {
    (f64::from(byte) / 255.0) * 2.0 - 1.0
}

pub fn draw(ctx: &mut RenderContext<'_>, time_domain: &[u8]) {
    let (width, height) = (ctx.width, ctx.height);
    if width <= 0.0 || height <= 0.0 || time_domain.is_empty() {
        return;
    }
    ctx.wash(Some(WASH_ALPHA));

    let sensitivity = ctx.sensitivity;
    let surface = &mut *ctx.surface;
    surface.save();
    surface.set_line_width((sensitivity * 2.2).max(1.5));
    surface.set_shadow(GLOW_BLUR, ctx.palette.glow);
    surface.set_stroke(Paint::Solid(ctx.palette.gradient[0]));
    surface.begin_path();

    let step = width / time_domain.len() as f64;
    let center = height / 2.0;
    for (i, &byte) in time_domain.iter().enumerate() {
        let x = i as f64 * step;
        let y = center + normalize_sample(byte) * center * sensitivity;
        if i == 0 {
            surface.move_to(x, y);
        } else {
            surface.line_to(x, y);
        }
    }
    surface.stroke();
    surface.restore();
}
