// Rendering algorithms (bars, wave, rings, particles) against a recording
// surface, and the braille raster they draw onto in the terminal.

mod common;

use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;

use myplayer::canvas::{BrailleCanvas, Composite, Paint, Rgba, Surface};
use myplayer::theme::ThemeName;
use myplayer::visualizer::bars::{self, BAR_COUNT, MIN_BAR_HEIGHT};
use myplayer::visualizer::particles::{self, PARTICLE_COUNT};
use myplayer::visualizer::rings::{self, RING_COUNT};
use myplayer::visualizer::wave;
use myplayer::visualizer::RenderContext;

use common::{Op, RecordingSurface};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn context<'a>(
    surface: &'a mut RecordingSurface,
    width: f64,
    height: f64,
) -> RenderContext<'a> {
    RenderContext {
        surface,
        width,
        height,
        sensitivity: 1.0,
        palette: ThemeName::Neon.palette(),
    }
}

fn solid(r: u8, g: u8, b: u8) -> Paint {
    Paint::Solid(Rgba::rgb(r, g, b))
}

// ── Bars ─────────────────────────────────────────────────────────────────────

#[test]
fn test_bar_height_has_floor() {
    assert_eq!(bars::bar_height(0.0, 100.0, 1.0), MIN_BAR_HEIGHT);
    let full = bars::bar_height(1.0, 100.0, 1.0);
    assert!((full - 90.0).abs() < 1e-9);
    assert!(bars::bar_height(1.0, 100.0, 2.0) > full);
}

#[test]
fn test_bars_fill_one_path_per_bar() {
    let mut surface = RecordingSurface::default();
    let frequency = vec![180u8; 1024];
    bars::draw(&mut context(&mut surface, 256.0, 100.0), &frequency, solid(255, 0, 0));
    assert_eq!(surface.count(|op| *op == Op::FillPath), BAR_COUNT);
    assert_eq!(surface.count(|op| matches!(op, Op::FillRect(..))), 1);
    assert!(surface.ops.contains(&Op::Fill(solid(255, 0, 0))));
}

#[test]
fn test_bars_skip_empty_canvas() {
    let mut surface = RecordingSurface::default();
    bars::draw(&mut context(&mut surface, 0.0, 100.0), &[200; 64], solid(0, 0, 0));
    assert!(surface.ops.is_empty());
}

// ── Wave ─────────────────────────────────────────────────────────────────────

#[test]
fn test_wave_sample_normalization() {
    assert_eq!(wave::normalize_sample(0), -1.0);
    assert_eq!(wave::normalize_sample(255), 1.0);
    assert!(wave::normalize_sample(128).abs() < 0.01);
}

#[test]
fn test_wave_traces_every_sample() {
    let mut surface = RecordingSurface::default();
    let samples: Vec<u8> = (0..64).map(|i| (i * 4) as u8).collect();
    wave::draw(&mut context(&mut surface, 128.0, 40.0), &samples);
    assert_eq!(surface.count(|op| matches!(op, Op::MoveTo(..))), 1);
    assert_eq!(surface.count(|op| matches!(op, Op::LineTo(..))), 63);
    assert_eq!(surface.count(|op| *op == Op::StrokePath), 1);
}

#[test]
fn test_wave_silence_is_flat_line() {
    let mut surface = RecordingSurface::default();
    wave::draw(&mut context(&mut surface, 100.0, 50.0), &[128; 16]);
    let ys: Vec<f64> = surface
        .ops
        .iter()
        .filter_map(|op| match op {
            Op::MoveTo(_, y) | Op::LineTo(_, y) => Some(*y),
            _ => None,
        })
        .collect();
    assert_eq!(ys.len(), 16);
    assert!(ys.iter().all(|y| (y - 25.0).abs() < 0.5));
}

#[test]
fn test_wave_empty_buffer_draws_nothing() {
    let mut surface = RecordingSurface::default();
    wave::draw(&mut context(&mut surface, 100.0, 50.0), &[]);
    assert!(surface.ops.is_empty());
}

// ── Rings ────────────────────────────────────────────────────────────────────

#[test]
fn test_ring_radius_grows_with_sample() {
    assert_eq!(rings::ring_radius(10.0, 0.0, 50.0, 1.0), 10.0);
    assert!((rings::ring_radius(10.0, 1.0, 50.0, 1.0) - 25.0).abs() < 1e-9);
}

#[test]
fn test_rings_stroke_closed_paths_with_radial_gradient() {
    let mut surface = RecordingSurface::default();
    rings::draw(&mut context(&mut surface, 120.0, 120.0), &[100; 1024]);
    assert_eq!(surface.count(|op| *op == Op::StrokePath), RING_COUNT);
    assert_eq!(surface.count(|op| *op == Op::ClosePath), RING_COUNT);
    assert_eq!(
        surface.count(|op| matches!(op, Op::Stroke(Paint::Radial { .. }))),
        RING_COUNT
    );
}

// ── Particles ────────────────────────────────────────────────────────────────

#[test]
fn test_particles_spawn_evenly_spaced() {
    let mut rng = StdRng::seed_from_u64(1);
    let pool = particles::spawn(4, &mut rng);
    assert_eq!(pool.len(), 4);
    assert_eq!(pool[0].angle, 0.0);
    assert!((pool[2].angle - std::f64::consts::PI).abs() < 1e-9);
    for p in &pool {
        assert!((0.004..0.007).contains(&p.speed));
        assert!((0.35..1.0).contains(&p.base_radius));
        assert!((2.0..5.0).contains(&p.size));
    }
}

#[test]
fn test_average_energy() {
    assert_eq!(particles::average_energy(&[]), 0.0);
    assert_eq!(particles::average_energy(&[255, 255]), 1.0);
    assert!((particles::average_energy(&[0, 255]) - 0.5).abs() < 1e-9);
}

#[test]
fn test_particles_draw_additively_and_advance() {
    let mut surface = RecordingSurface::default();
    let mut rng = StdRng::seed_from_u64(3);
    let mut pool = Vec::new();
    particles::draw(
        &mut context(&mut surface, 200.0, 100.0),
        &[255; 256],
        &mut pool,
        &mut rng,
    );
    assert_eq!(pool.len(), PARTICLE_COUNT);
    assert!(pool[0].angle > 0.0);
    assert!(surface.ops.contains(&Op::Composite(Composite::Lighter)));
    assert_eq!(surface.count(|op| matches!(op, Op::Arc { .. })), PARTICLE_COUNT);
}

// ── Braille raster ───────────────────────────────────────────────────────────

#[test]
fn test_braille_canvas_cells_and_backing() {
    let canvas = BrailleCanvas::with_cells(10, 3);
    assert_eq!(canvas.backing_size(), (20, 12));
    assert_eq!(canvas.cells(), (10, 3));
    assert_eq!(canvas.lit_dots(), 0);
}

#[test]
fn test_braille_fill_lights_covered_dots() {
    let mut canvas = BrailleCanvas::with_cells(4, 2);
    canvas.set_fill(solid(255, 255, 255));
    canvas.begin_path();
    canvas.move_to(0.0, 0.0);
    canvas.line_to(4.0, 0.0);
    canvas.line_to(4.0, 4.0);
    canvas.line_to(0.0, 4.0);
    canvas.close_path();
    canvas.fill();
    assert_eq!(canvas.lit_dots(), 16);
    assert_eq!(canvas.dot_level(0, 0), 1.0);
    assert_eq!(canvas.dot_level(5, 5), 0.0);
}

#[test]
fn test_braille_transform_scales_paths() {
    let mut canvas = BrailleCanvas::with_cells(4, 2);
    canvas.set_transform(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
    canvas.set_fill(solid(255, 255, 255));
    canvas.begin_path();
    canvas.move_to(0.0, 0.0);
    canvas.line_to(2.0, 0.0);
    canvas.line_to(2.0, 2.0);
    canvas.line_to(0.0, 2.0);
    canvas.close_path();
    canvas.fill();
    assert_eq!(canvas.lit_dots(), 16);
}

#[test]
fn test_braille_wash_fades_and_sets_backdrop() {
    let mut canvas = BrailleCanvas::with_cells(2, 1);
    canvas.set_fill(solid(255, 255, 255));
    canvas.begin_path();
    canvas.move_to(0.0, 0.0);
    canvas.line_to(4.0, 0.0);
    canvas.line_to(4.0, 4.0);
    canvas.line_to(0.0, 4.0);
    canvas.close_path();
    canvas.fill();

    canvas.set_fill(Paint::Solid(Rgba::rgba(10, 20, 30, 1.0)));
    canvas.fill_rect(0.0, 0.0, 4.0, 4.0);
    assert_eq!(canvas.lit_dots(), 0);
    assert_eq!(canvas.backdrop(), Some(Rgba::rgb(10, 20, 30)));
}

#[test]
fn test_braille_resize_clears_dots() {
    let mut canvas = BrailleCanvas::with_cells(2, 1);
    canvas.set_fill(solid(255, 255, 255));
    canvas.begin_path();
    canvas.move_to(0.0, 0.0);
    canvas.line_to(4.0, 0.0);
    canvas.line_to(4.0, 4.0);
    canvas.line_to(0.0, 4.0);
    canvas.close_path();
    canvas.fill();
    assert!(canvas.lit_dots() > 0);

    canvas.set_backing_size(8, 8);
    assert_eq!(canvas.lit_dots(), 0);
    assert_eq!(canvas.cells(), (4, 2));
}

#[test]
fn test_braille_widget_renders_full_cell() {
    let mut canvas = BrailleCanvas::with_cells(1, 1);
    canvas.set_fill(solid(200, 100, 50));
    canvas.begin_path();
    canvas.move_to(0.0, 0.0);
    canvas.line_to(2.0, 0.0);
    canvas.line_to(2.0, 4.0);
    canvas.line_to(0.0, 4.0);
    canvas.close_path();
    canvas.fill();

    let area = Rect::new(0, 0, 1, 1);
    let mut buf = Buffer::empty(area);
    (&canvas).render(area, &mut buf);
    assert_eq!(buf[(0, 0)].symbol(), "⣿");
}

#[test]
fn test_braille_stroke_marks_line() {
    let mut canvas = BrailleCanvas::with_cells(8, 1);
    canvas.set_stroke(solid(255, 255, 255));
    canvas.set_line_width(1.0);
    canvas.begin_path();
    canvas.move_to(0.0, 2.0);
    canvas.line_to(16.0, 2.0);
    canvas.stroke();
    assert!(canvas.dot_level(8, 2) > 0.0);
    assert_eq!(canvas.dot_level(8, 0), 0.0);
}
