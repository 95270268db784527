//! Braille-canvas rendering of the particle field.

use ratatui::{
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::canvas::{Canvas, Circle, Line as CanvasLine, Points},
    Frame,
};

use crate::core::background::Background;
use crate::utils::color::{blend, hsl_to_rgb, quantize_rgb, ColorDepth};

/// Virtual pixels per terminal cell; roughly what a browser canvas would use.
pub const CELL_WIDTH: f64 = 8.0;
pub const CELL_HEIGHT: f64 = 16.0;

const BACKGROUND_RGB: (u8, u8, u8) = (0, 0, 0);
/// Connection lines are barely visible at their real opacity once quantized.
const LINE_GAIN: f64 = 3.0;

/// World size (in background units) for a terminal area.
pub fn world_size(area: Rect) -> (f64, f64) {
    (
        f64::from(area.width) * CELL_WIDTH,
        f64::from(area.height) * CELL_HEIGHT,
    )
}

/// Centre glow and pulse rings: hsl(200, 100%, 70%).
fn glow_rgb() -> (u8, u8, u8) {
    hsl_to_rgb(200.0, 1.0, 0.7)
}

fn shade(rgb: (u8, u8, u8), alpha: f64, depth: ColorDepth) -> Color {
    quantize_rgb(blend(rgb, BACKGROUND_RGB, alpha.clamp(0.0, 1.0)), depth)
}

pub fn draw(f: &mut Frame, area: Rect, background: &Background, depth: ColorDepth) {
    let (width, height) = background.size();
    if width <= 0.0 || height <= 0.0 {
        return;
    }
    let (cx, cy) = background.center();
    let pulse = background.pulse();
    let connections = background.connections();
    let glow = glow_rgb();

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .background_color(quantize_rgb(BACKGROUND_RGB, depth))
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            // Canvas y grows upwards; the simulation's grows downwards.
            let flip = |y: f64| height - y;

            for radius in [24.0, 12.0] {
                ctx.draw(&Circle {
                    x: cx,
                    y: flip(cy),
                    radius,
                    color: shade(glow, 0.25, depth),
                });
            }

            for connection in &connections {
                ctx.draw(&CanvasLine {
                    x1: connection.from.0,
                    y1: flip(connection.from.1),
                    x2: connection.to.0,
                    y2: flip(connection.to.1),
                    color: shade(connection.color, connection.opacity * LINE_GAIN, depth),
                });
            }

            ctx.layer();

            for particle in background.particles() {
                let coords = [(particle.x, flip(particle.y))];
                ctx.draw(&Points {
                    coords: &coords,
                    color: quantize_rgb(particle.color, depth),
                });
            }

            if pulse.is_active() && pulse.radius > 0.0 {
                ctx.draw(&Circle {
                    x: cx,
                    y: flip(cy),
                    radius: pulse.radius,
                    color: shade(glow, pulse.alpha, depth),
                });
            }
        });

    f.render_widget(canvas, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::background::BackgroundConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn world_size_scales_cells() {
        assert_eq!(world_size(Rect::new(0, 0, 100, 30)), (800.0, 480.0));
    }

    #[test]
    fn draws_particles_onto_canvas() {
        let area = Rect::new(0, 0, 60, 20);
        let (w, h) = world_size(area);
        let mut background = Background::with_rng(
            BackgroundConfig::default(),
            w,
            h,
            StdRng::seed_from_u64(7),
        );
        background.step();

        let backend = TestBackend::new(area.width, area.height);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal
            .draw(|f| draw(f, area, &background, ColorDepth::Truecolor))
            .expect("draw");

        let buffer = terminal.backend().buffer();
        let braille = buffer
            .content
            .iter()
            .filter(|cell| {
                cell.symbol()
                    .chars()
                    .next()
                    .is_some_and(|ch| ('\u{2801}'..='\u{28FF}').contains(&ch))
            })
            .count();
        assert!(braille > 0);
    }

    #[test]
    fn glow_and_pulse_are_drawn_in_sky_blue() {
        let area = Rect::new(0, 0, 40, 12);
        let (w, h) = world_size(area);
        let config = BackgroundConfig {
            particle_count: 0,
            ..Default::default()
        };
        let mut background = Background::with_rng(config, w, h, StdRng::seed_from_u64(3));
        background.create_pulse();
        background.step();

        let backend = TestBackend::new(area.width, area.height);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal
            .draw(|f| draw(f, area, &background, ColorDepth::Truecolor))
            .expect("draw");

        let colors: Vec<(u8, u8, u8)> = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .filter(|cell| cell.symbol() != " ")
            .filter_map(|cell| match cell.fg {
                Color::Rgb(r, g, b) => Some((r, g, b)),
                _ => None,
            })
            .collect();
        assert!(!colors.is_empty());
        assert!(colors.iter().all(|&(r, g, b)| b > r && g > r));
    }

    #[test]
    fn empty_world_draws_nothing() {
        let area = Rect::new(0, 0, 10, 4);
        let background = Background::with_rng(
            BackgroundConfig::default(),
            0.0,
            0.0,
            StdRng::seed_from_u64(1),
        );
        let backend = TestBackend::new(area.width, area.height);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal
            .draw(|f| draw(f, area, &background, ColorDepth::X16))
            .expect("draw");
        assert!(terminal
            .backend()
            .buffer()
            .content
            .iter()
            .all(|cell| cell.symbol() == " "));
    }
}
