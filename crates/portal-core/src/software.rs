//! CPU particle simulator: sequential per-particle update of the portal
//! force field, plus the draw parameters the software renderer needs.
//!
//! Every particle's state transition is self-contained (no particle reads
//! another particle's state), which is what lets the compute backend run the
//! identical model in parallel.

use crate::constants::*;
use crate::drivers::FieldDrivers;
use glam::Vec2;
use rand::prelude::*;

/// One particle of the field. Owned exclusively by its simulator; the count
/// is fixed for the simulator's lifetime.
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub base_radius: f32,
    pub hue_seed: f32,
}

/// Force-model coefficients, fixed per simulator instance.
#[derive(Clone, Copy, Debug)]
pub struct SimulationConfig {
    pub damping: f32,
    pub attraction_constant: f32,
    pub force_cap: f32,
    pub base_gain: f32,
    pub audio_gain: f32,
    pub swirl_base: f32,
    pub swirl_audio: f32,
    pub boundary_fraction: f32,
    pub boundary_spring: f32,
    pub distance_epsilon: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            damping: DAMPING,
            attraction_constant: ATTRACTION_CONSTANT,
            force_cap: ATTRACTION_FORCE_CAP,
            base_gain: ATTRACTION_BASE_GAIN,
            audio_gain: ATTRACTION_AUDIO_GAIN,
            swirl_base: SWIRL_BASE,
            swirl_audio: SWIRL_AUDIO,
            boundary_fraction: BOUNDARY_FRACTION,
            boundary_spring: BOUNDARY_SPRING,
            distance_epsilon: DISTANCE_EPSILON,
        }
    }
}

/// Attraction magnitude at a given distance: inverse falloff under a hard cap.
#[inline]
pub fn attraction_force(distance: f32, config: &SimulationConfig) -> f32 {
    (config.attraction_constant / distance.max(config.distance_epsilon)).min(config.force_cap)
}

/// Audio scaling of the attraction term; reduces to `base_gain` at zero energy.
#[inline]
pub fn attraction_scale(energy: f32, config: &SimulationConfig) -> f32 {
    config.base_gain + energy * config.audio_gain
}

/// Swirl coefficient; reduces to `swirl_base` at zero energy.
#[inline]
pub fn swirl_coefficient(energy: f32, config: &SimulationConfig) -> f32 {
    config.swirl_base + energy * config.swirl_audio
}

/// Derives the particle population from viewport area under a backend cap.
#[inline]
pub fn particle_count_for_area(width: f32, height: f32, area_per_particle: f32, cap: u32) -> u32 {
    ((width * height / area_per_particle) as u32).clamp(1, cap)
}

/// Draw parameters for one particle at a given elapsed time and energy level.
#[derive(Clone, Copy, Debug)]
pub struct SpriteParams {
    pub position: Vec2,
    pub radius: f32,
    pub hue: f32,
    pub lightness: f32,
    pub alpha: f32,
}

/// Draw parameters for the decorative portal ring.
#[derive(Clone, Copy, Debug)]
pub struct RingParams {
    pub center: Vec2,
    pub radius: f32,
    pub stroke_width: f32,
    pub glow: f32,
    pub alpha: f32,
}

pub fn ring_params(width: f32, height: f32, energy: f32) -> RingParams {
    RingParams {
        center: Vec2::new(width * 0.5, height * 0.5),
        radius: width.min(height) * (RING_RADIUS_FRACTION + energy * RING_RADIUS_AUDIO),
        stroke_width: RING_STROKE_BASE + energy * RING_STROKE_AUDIO,
        glow: RING_GLOW_BASE + energy * RING_GLOW_AUDIO,
        alpha: RING_ALPHA_BASE + energy * RING_ALPHA_AUDIO,
    }
}

/// Sequential CPU backend. Particles spawn on a random annulus around the
/// viewport center (radius sqrt-weighted toward the middle so the rim does
/// not cluster) with zero velocity.
pub struct SoftwareParticleSimulator {
    pub particles: Vec<Particle>,
    config: SimulationConfig,
    width: f32,
    height: f32,
}

impl SoftwareParticleSimulator {
    pub fn new(width: f32, height: f32, seed: u64) -> Self {
        Self::with_config(width, height, seed, SimulationConfig::default())
    }

    pub fn with_config(width: f32, height: f32, seed: u64, config: SimulationConfig) -> Self {
        let count = particle_count_for_area(
            width,
            height,
            SOFTWARE_AREA_PER_PARTICLE,
            SOFTWARE_PARTICLE_CAP,
        );
        let center = Vec2::new(width * 0.5, height * 0.5);
        let spawn_radius = width.min(height) * SPAWN_RADIUS_FRACTION;
        let mut rng = StdRng::seed_from_u64(seed);
        let particles = (0..count)
            .map(|_| {
                let angle = rng.gen::<f32>() * std::f32::consts::TAU;
                let dist = rng.gen::<f32>().sqrt() * spawn_radius;
                Particle {
                    position: center + Vec2::new(angle.cos(), angle.sin()) * dist,
                    velocity: Vec2::ZERO,
                    base_radius: BASE_RADIUS_MIN + rng.gen::<f32>() * BASE_RADIUS_SPAN,
                    hue_seed: HUE_MIN + rng.gen::<f32>() * HUE_SPAN,
                }
            })
            .collect();
        Self {
            particles,
            config,
            width,
            height,
        }
    }

    pub fn particle_count(&self) -> u32 {
        self.particles.len() as u32
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Resize only moves the boundary and center; the particle array is
    /// never reallocated.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Advances every particle by one frame of the force model.
    pub fn step(&mut self, drivers: &FieldDrivers) {
        let steer = drivers.steer_point();
        let gain = attraction_scale(drivers.energy, &self.config);
        let swirl = swirl_coefficient(drivers.energy, &self.config);
        let center = Vec2::new(self.width * 0.5, self.height * 0.5);
        let boundary = self.width.min(self.height) * self.config.boundary_fraction;

        for p in &mut self.particles {
            let delta = steer - p.position;
            let dist = delta.length().max(self.config.distance_epsilon);

            // Attraction toward the steer point with inverse falloff
            let force = attraction_force(dist, &self.config);
            p.velocity += delta * (force * gain);

            // Swirl: perpendicular to the displacement
            p.velocity += Vec2::new(-delta.y, delta.x) * swirl;

            // Frictional decay
            p.velocity *= self.config.damping;

            p.position += p.velocity * drivers.dt;

            // Soft boundary: velocity spring proportional to the excess
            // beyond the rim, position untouched. Same form as the compute
            // kernel.
            let offset = p.position - center;
            let center_dist = offset.length();
            if center_dist > boundary {
                p.velocity -=
                    (offset / center_dist) * ((center_dist - boundary) * self.config.boundary_spring);
            }
        }
    }

    /// Draw parameters for particle `index`. Hue and lightness oscillate as a
    /// deterministic function of elapsed time and index, so the same time
    /// value always reproduces the same colors.
    pub fn sprite(&self, index: usize, time: f32, energy: f32) -> SpriteParams {
        let p = &self.particles[index];
        let glow = GLOW_BASE + energy * GLOW_AUDIO;
        SpriteParams {
            position: p.position,
            radius: p.base_radius + glow * 1.8,
            hue: p.hue_seed + (time * 0.6 + index as f32 * 0.002).sin() * 10.0,
            lightness: 70.0 + (index as f32).sin() * 10.0,
            alpha: ALPHA_BASE + energy * ALPHA_AUDIO,
        }
    }

    pub fn ring(&self, energy: f32) -> RingParams {
        ring_params(self.width, self.height, energy)
    }
}
