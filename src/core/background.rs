//! Orbiting particle field behind the chat panel.
//!
//! Positions are a closed-form function of each particle's angle, so a frame
//! is just "advance every angle, recompute x/y". World units are virtual
//! pixels; the renderer maps them onto the terminal canvas.

use std::f64::consts::TAU;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::utils::color::hsl_to_rgb;

/// Animation time advanced per frame.
pub const TIME_STEP: f64 = 0.01;
const PULSE_START_ALPHA: f64 = 0.6;
const PULSE_GROWTH: f64 = 3.0;
const PULSE_DECAY: f64 = 0.008;
const CONNECTION_MAX_OPACITY: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct BackgroundConfig {
    pub particle_count: usize,
    pub base_speed: f64,
    /// In animation-time units, not wall-clock seconds.
    pub pulse_interval: f64,
    pub connection_distance: f64,
    pub palette: Vec<(u8, u8, u8)>,
    pub random_pulse_every: Duration,
    pub random_pulse_chance: f64,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            particle_count: 120,
            base_speed: 0.04,
            pulse_interval: 5.0,
            connection_distance: 180.0,
            palette: vec![
                hsl_to_rgb(180.0, 1.0, 0.7),
                hsl_to_rgb(240.0, 1.0, 0.7),
                hsl_to_rgb(300.0, 1.0, 0.7),
            ],
            random_pulse_every: Duration::from_secs(8),
            random_pulse_chance: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub speed: f64,
    pub angle: f64,
    pub color: (u8, u8, u8),
    pub orbit_radius: f64,
    pub angle_offset: f64,
}

impl Particle {
    fn orbit(&mut self, center_x: f64, center_y: f64) {
        self.angle = (self.angle + self.speed) % TAU;
        self.x = center_x + (self.angle + self.angle_offset).cos() * self.orbit_radius;
        self.y = center_y + (self.angle * 1.5 + self.angle_offset).sin() * (self.orbit_radius * 0.8);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pulse {
    pub radius: f64,
    pub alpha: f64,
}

impl Pulse {
    pub fn is_active(&self) -> bool {
        self.alpha > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub color: (u8, u8, u8),
    pub opacity: f64,
}

pub struct Background {
    config: BackgroundConfig,
    width: f64,
    height: f64,
    t: f64,
    last_pulse: f64,
    pulse: Pulse,
    particles: Vec<Particle>,
    rng: StdRng,
}

impl Background {
    pub fn new(config: BackgroundConfig, width: f64, height: f64) -> Self {
        Self::with_rng(config, width, height, StdRng::from_entropy())
    }

    pub fn with_rng(config: BackgroundConfig, width: f64, height: f64, rng: StdRng) -> Self {
        let mut background = Self {
            config,
            width,
            height,
            t: 0.0,
            last_pulse: 0.0,
            pulse: Pulse::default(),
            particles: Vec::new(),
            rng,
        };
        background.populate();
        background
    }

    fn populate(&mut self) {
        let (w, h) = (self.width, self.height);
        let min_side = w.min(h);
        let count = self.config.particle_count;
        let mut particles = Vec::with_capacity(count);

        for _ in 0..count {
            let color = if self.config.palette.is_empty() {
                (255, 255, 255)
            } else {
                self.config.palette[self.rng.gen_range(0..self.config.palette.len())]
            };
            particles.push(Particle {
                x: self.rng.gen::<f64>() * w,
                y: self.rng.gen::<f64>() * h,
                size: self.rng.gen::<f64>() * 1.5 + 0.5,
                speed: (self.rng.gen::<f64>() * 0.02 + 0.01) * self.config.base_speed,
                angle: self.rng.gen::<f64>() * TAU,
                color,
                orbit_radius: self.rng.gen::<f64>() * min_side * 0.3 + 50.0,
                angle_offset: self.rng.gen::<f64>() * TAU,
            });
        }
        self.particles = particles;
    }

    /// Re-create every particle for the new viewport.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.populate();
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn pulse(&self) -> Pulse {
        self.pulse
    }

    pub fn config(&self) -> &BackgroundConfig {
        &self.config
    }

    pub fn create_pulse(&mut self) {
        self.pulse = Pulse {
            radius: 0.0,
            alpha: PULSE_START_ALPHA,
        };
        self.last_pulse = self.t;
    }

    /// The periodic random roll; fires a pulse with the configured chance.
    pub fn roll_random_pulse(&mut self) -> bool {
        let fire = self.rng.gen::<f64>() < self.config.random_pulse_chance;
        if fire {
            self.create_pulse();
        }
        fire
    }

    /// Advance one animation frame.
    pub fn step(&mut self) {
        self.t += TIME_STEP;

        if self.pulse.is_active() {
            self.pulse.radius += PULSE_GROWTH;
            self.pulse.alpha = (self.pulse.alpha - PULSE_DECAY).max(0.0);
        }

        if self.t - self.last_pulse > self.config.pulse_interval {
            self.create_pulse();
        }

        let (cx, cy) = self.center();
        for particle in &mut self.particles {
            particle.orbit(cx, cy);
        }
    }

    /// Pairs of particles closer than the connection distance, fading with distance.
    pub fn connections(&self) -> Vec<Connection> {
        let max = self.config.connection_distance;
        let mut connections = Vec::new();

        for (i, a) in self.particles.iter().enumerate() {
            for b in &self.particles[i + 1..] {
                let distance = (a.x - b.x).hypot(a.y - b.y);
                if distance < max {
                    connections.push(Connection {
                        from: (a.x, a.y),
                        to: (b.x, b.y),
                        color: a.color,
                        opacity: CONNECTION_MAX_OPACITY * (1.0 - distance / max),
                    });
                }
            }
        }
        connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(config: BackgroundConfig, width: f64, height: f64) -> Background {
        Background::with_rng(config, width, height, StdRng::seed_from_u64(0x5eed))
    }

    #[test]
    fn init_and_resize_keep_configured_count() {
        let mut bg = seeded(BackgroundConfig::default(), 1280.0, 720.0);
        assert_eq!(bg.particles().len(), 120);

        bg.resize(640.0, 480.0);
        assert_eq!(bg.particles().len(), 120);
        assert_eq!(bg.size(), (640.0, 480.0));

        let config = BackgroundConfig {
            particle_count: 7,
            ..BackgroundConfig::default()
        };
        let mut small = seeded(config, 100.0, 100.0);
        assert_eq!(small.particles().len(), 7);
        small.resize(300.0, 200.0);
        assert_eq!(small.particles().len(), 7);
    }

    #[test]
    fn particles_start_within_documented_ranges() {
        let bg = seeded(BackgroundConfig::default(), 800.0, 600.0);
        let palette = BackgroundConfig::default().palette;
        for p in bg.particles() {
            assert!((0.0..800.0).contains(&p.x));
            assert!((0.0..600.0).contains(&p.y));
            assert!((0.5..2.0).contains(&p.size));
            assert!(p.speed >= 0.01 * 0.04 && p.speed < 0.03 * 0.04);
            assert!((50.0..50.0 + 600.0 * 0.3).contains(&p.orbit_radius));
            assert!(palette.contains(&p.color));
        }
    }

    #[test]
    fn step_follows_orbit_formula() {
        let mut bg = seeded(BackgroundConfig::default(), 1000.0, 500.0);
        let before = bg.particles()[0].clone();
        bg.step();
        let after = &bg.particles()[0];

        let angle = (before.angle + before.speed) % TAU;
        let expected_x = 500.0 + (angle + before.angle_offset).cos() * before.orbit_radius;
        let expected_y =
            250.0 + (angle * 1.5 + before.angle_offset).sin() * before.orbit_radius * 0.8;
        assert!((after.angle - angle).abs() < 1e-12);
        assert!((after.x - expected_x).abs() < 1e-9);
        assert!((after.y - expected_y).abs() < 1e-9);
    }

    #[test]
    fn pulse_grows_and_fades_to_zero() {
        let mut bg = seeded(BackgroundConfig::default(), 400.0, 400.0);
        assert!(!bg.pulse().is_active());

        bg.create_pulse();
        bg.step();
        assert_eq!(bg.pulse().radius, 3.0);
        assert!((bg.pulse().alpha - 0.592).abs() < 1e-9);

        for _ in 0..100 {
            bg.step();
        }
        assert_eq!(bg.pulse().alpha, 0.0);
        let frozen = bg.pulse().radius;
        bg.step();
        assert_eq!(bg.pulse().radius, frozen);
    }

    #[test]
    fn pulse_fires_after_interval_elapses() {
        let config = BackgroundConfig {
            pulse_interval: 0.045,
            ..BackgroundConfig::default()
        };
        let mut bg = seeded(config, 400.0, 400.0);
        for _ in 0..4 {
            bg.step();
        }
        assert!(!bg.pulse().is_active());
        bg.step();
        assert!(bg.pulse().is_active());
        assert_eq!(bg.pulse().radius, 0.0);
    }

    #[test]
    fn random_pulse_respects_chance() {
        let never = BackgroundConfig {
            random_pulse_chance: 0.0,
            ..BackgroundConfig::default()
        };
        let mut bg = seeded(never, 400.0, 400.0);
        assert!(!bg.roll_random_pulse());
        assert!(!bg.pulse().is_active());

        let always = BackgroundConfig {
            random_pulse_chance: 1.0,
            ..BackgroundConfig::default()
        };
        let mut bg = seeded(always, 400.0, 400.0);
        assert!(bg.roll_random_pulse());
        assert!(bg.pulse().is_active());
    }

    #[test]
    fn connection_opacity_decays_with_distance() {
        let config = BackgroundConfig {
            particle_count: 40,
            ..BackgroundConfig::default()
        };
        let mut bg = seeded(config, 600.0, 600.0);
        bg.step();

        let connections = bg.connections();
        assert!(!connections.is_empty());
        for c in &connections {
            let d = (c.from.0 - c.to.0).hypot(c.from.1 - c.to.1);
            assert!(d < 180.0);
            assert!(c.opacity > 0.0 && c.opacity <= 0.2);
            assert!((c.opacity - 0.2 * (1.0 - d / 180.0)).abs() < 1e-12);
        }
    }
}
