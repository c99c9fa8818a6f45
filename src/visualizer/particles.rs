// Particles: a fixed pool orbiting the center, pushed outward by the
// spectrum and sped up by overall energy. Additive blending.

use std::f64::consts::TAU;

use rand::Rng;

use super::{sample_at, RenderContext};
use crate::canvas::{Composite, Paint};

pub const PARTICLE_COUNT: usize = 90;
const WASH_ALPHA: f64 = 0.2;
const GLOW_BLUR: f64 = 18.0;

/// One particle in polar coordinates around the canvas center.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub angle: f64,
    /// Radians per frame at zero energy.
    pub speed: f64,
    /// Fraction of the radius base, 0.35..1.0.
    pub base_radius: f64,
    pub size: f64,
}

/// Evenly spaced starting angles, randomized speed, radius and size.
pub fn spawn<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Particle> {
    (0..count)
        .map(|i| Particle {
            angle: TAU * i as f64 / count as f64,
            speed: 0.004 + rng.random::<f64>() * 0.003,
            base_radius: 0.35 + rng.random::<f64>() * 0.65,
            size: 2.0 + rng.random::<f64>() * 3.0,
        })
        .collect()
}

/// Mean of the buffer, normalized to 0.0..=1.0.
pub fn average_energy(frequency: &[u8]) -> f64 {
    if frequency.is_empty() {
        return 0.0;
    }
    let sum: u64 = frequency.iter().map(|&b| u64::from(b)).sum();
    sum as f64 / frequency.len() as f64 / 255.0
}

pub fn draw<R: Rng + ?Sized>(
    ctx: &mut RenderContext<'_>,
    frequency: &[u8],
    particles: &mut Vec<Particle>,
    rng: &mut R,
) {
    let (width, height) = (ctx.width, ctx.height);
    if width <= 0.0 || height <= 0.0 {
        return;
    }
    if particles.is_empty() {
        *particles = spawn(PARTICLE_COUNT, rng);
    }
    ctx.wash(Some(WASH_ALPHA));

    let (cx, cy) = (width / 2.0, height / 2.0);
    let radius_base = width.min(height) / 4.0;
    let average = average_energy(frequency);
    let sensitivity = ctx.sensitivity;
    let count = particles.len();

    let surface = &mut *ctx.surface;
    surface.save();
    surface.set_composite(Composite::Lighter);
    surface.set_shadow(GLOW_BLUR, ctx.palette.glow);
    surface.set_fill(Paint::Solid(ctx.palette.particle));

    for (index, particle) in particles.iter_mut().enumerate() {
        let freq_index = index * frequency.len() / count;
        let sample = sample_at(frequency, freq_index);
        particle.angle += particle.speed * (0.5 + average * 1.5);

        let radius =
            radius_base * particle.base_radius + sample * radius_base * sensitivity * 1.2;
        let (x, y) = (cx + particle.angle.cos() * radius, cy + particle.angle.sin() * radius);
        let size = particle.size * (0.4 + sample * 1.4);

        surface.begin_path();
        surface.set_global_alpha(0.45 + sample * 0.55);
        surface.arc(x, y, size, 0.0, TAU);
        surface.fill();
    }
    surface.restore();
}
