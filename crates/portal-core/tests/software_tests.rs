use glam::Vec2;
use portal_core::{
    attraction_scale, swirl_coefficient, FieldDrivers, SimulationConfig,
    SoftwareParticleSimulator,
};

fn drivers(target: Vec2, energy: f32, dt: f32) -> FieldDrivers {
    FieldDrivers {
        target,
        tilt: Vec2::ZERO,
        energy,
        dt,
    }
}

/// Config where only damping acts, to observe the decay stage in isolation.
fn damping_only() -> SimulationConfig {
    SimulationConfig {
        base_gain: 0.0,
        audio_gain: 0.0,
        swirl_base: 0.0,
        swirl_audio: 0.0,
        boundary_spring: 0.0,
        ..SimulationConfig::default()
    }
}

#[test]
fn zero_dt_step_leaves_positions_unchanged() {
    let mut sim = SoftwareParticleSimulator::new(800.0, 600.0, 7);
    let before: Vec<Vec2> = sim.particles.iter().map(|p| p.position).collect();
    sim.step(&drivers(Vec2::new(120.0, 90.0), 0.8, 0.0));
    for (p, prev) in sim.particles.iter().zip(&before) {
        assert_eq!(p.position, *prev, "dt = 0 must be a positional no-op");
    }
}

#[test]
fn damping_never_increases_speed() {
    let mut sim = SoftwareParticleSimulator::with_config(800.0, 600.0, 7, damping_only());
    for (i, p) in sim.particles.iter_mut().enumerate() {
        p.velocity = Vec2::new(3.0 + i as f32, -2.0 * i as f32);
    }
    let before: Vec<f32> = sim.particles.iter().map(|p| p.velocity.length()).collect();
    sim.step(&drivers(Vec2::new(400.0, 300.0), 0.0, 1.0 / 60.0));
    let damping = sim.config().damping;
    for (p, prev) in sim.particles.iter().zip(&before) {
        let speed = p.velocity.length();
        assert!(speed <= *prev, "damping increased speed: {speed} > {prev}");
        assert!((speed - prev * damping).abs() < 1e-3);
    }
}

#[test]
fn zero_energy_reduces_scales_to_base_constants() {
    let config = SimulationConfig::default();
    assert_eq!(attraction_scale(0.0, &config), config.base_gain);
    assert_eq!(swirl_coefficient(0.0, &config), config.swirl_base);

    // Behavioral check: with the audio terms zeroed out, the energy level
    // must not influence the motion at all.
    let muted = SimulationConfig {
        audio_gain: 0.0,
        swirl_audio: 0.0,
        ..SimulationConfig::default()
    };
    let mut quiet = SoftwareParticleSimulator::with_config(640.0, 480.0, 11, muted);
    let mut loud = SoftwareParticleSimulator::with_config(640.0, 480.0, 11, muted);
    let target = Vec2::new(100.0, 200.0);
    for _ in 0..10 {
        quiet.step(&drivers(target, 0.0, 1.0 / 60.0));
        loud.step(&drivers(target, 0.9, 1.0 / 60.0));
    }
    for (a, b) in quiet.particles.iter().zip(&loud.particles) {
        assert_eq!(a.position, b.position);
        assert_eq!(a.velocity, b.velocity);
    }
}

#[test]
fn coincident_particle_sees_finite_force() {
    let mut sim = SoftwareParticleSimulator::new(800.0, 600.0, 3);
    let target = sim.particles[0].position;
    sim.step(&drivers(target, 1.0, 1.0 / 60.0));
    let p = &sim.particles[0];
    assert!(p.velocity.x.is_finite() && p.velocity.y.is_finite());
    assert!(p.position.x.is_finite() && p.position.y.is_finite());
}

#[test]
fn far_outlier_is_pulled_back_toward_center() {
    let width = 800.0_f32;
    let height = 600.0_f32;
    let mut sim = SoftwareParticleSimulator::new(width, height, 5);
    let center = Vec2::new(width * 0.5, height * 0.5);
    let boundary = width.min(height) * sim.config().boundary_fraction;
    sim.particles[0].position = center + Vec2::new(boundary * 10.0, 0.0);
    sim.particles[0].velocity = Vec2::ZERO;
    sim.step(&drivers(center, 0.0, 1.0 / 60.0));
    let v = sim.particles[0].velocity;
    assert!(
        v.x < 0.0,
        "outlier velocity must point strictly toward center, got {v:?}"
    );
}

#[test]
fn boundary_spring_scales_with_excess_distance() {
    // The pull must be proportional to how far past the rim a particle sits,
    // not to its full distance from center, matching the compute kernel.
    let width = 800.0_f32;
    let height = 600.0_f32;
    let spring_only = SimulationConfig {
        base_gain: 0.0,
        audio_gain: 0.0,
        swirl_base: 0.0,
        swirl_audio: 0.0,
        ..SimulationConfig::default()
    };
    let mut sim = SoftwareParticleSimulator::with_config(width, height, 17, spring_only);
    let center = Vec2::new(width * 0.5, height * 0.5);
    let boundary = width.min(height) * sim.config().boundary_fraction;
    let spring = sim.config().boundary_spring;
    sim.particles[0].position = center + Vec2::new(boundary + 120.0, 0.0);
    sim.particles[0].velocity = Vec2::ZERO;
    sim.particles[1].position = center + Vec2::new(boundary + 240.0, 0.0);
    sim.particles[1].velocity = Vec2::ZERO;

    sim.step(&drivers(center, 0.0, 1.0 / 60.0));

    let near = sim.particles[0].velocity;
    let far = sim.particles[1].velocity;
    assert!((near.x - (-120.0 * spring)).abs() < 1e-4, "got {near:?}");
    assert!((far.x - (-240.0 * spring)).abs() < 1e-4, "got {far:?}");
    assert_eq!(near.y, 0.0);
    // Doubling the excess doubles the pull.
    assert!((far.x / near.x - 2.0).abs() < 1e-4);
}

#[test]
fn centered_pointer_keeps_mean_distance_bounded() {
    // Viewport 1920x1080, pointer at center, zero energy: over one second of
    // frames the attraction must dominate the swirl.
    let width = 1920.0_f32;
    let height = 1080.0_f32;
    let center = Vec2::new(width * 0.5, height * 0.5);
    let mut sim = SoftwareParticleSimulator::new(width, height, 42);

    let mean_dist = |sim: &SoftwareParticleSimulator| {
        sim.particles
            .iter()
            .map(|p| (p.position - center).length())
            .sum::<f32>()
            / sim.particle_count() as f32
    };
    let initial = mean_dist(&sim);
    for _ in 0..60 {
        sim.step(&drivers(center, 0.0, 1.0 / 60.0));
    }
    let after = mean_dist(&sim);
    assert!(
        after <= initial * 1.05,
        "field drifted outward: {after} > 1.05 * {initial}"
    );
}

#[test]
fn particle_count_is_area_derived_and_capped() {
    let small = SoftwareParticleSimulator::new(300.0, 200.0, 1);
    assert_eq!(small.particle_count(), 300 * 200 / 1200);
    let huge = SoftwareParticleSimulator::new(4000.0, 4000.0, 1);
    assert_eq!(
        huge.particle_count(),
        portal_core::constants::SOFTWARE_PARTICLE_CAP
    );
}

#[test]
fn resize_never_changes_particle_count() {
    let mut sim = SoftwareParticleSimulator::new(800.0, 600.0, 9);
    let count = sim.particle_count();
    sim.resize(2560.0, 1440.0);
    assert_eq!(sim.particle_count(), count);
    sim.resize(320.0, 240.0);
    assert_eq!(sim.particle_count(), count);
}

#[test]
fn sprite_colors_are_deterministic_in_time() {
    let sim = SoftwareParticleSimulator::new(800.0, 600.0, 13);
    let a = sim.sprite(5, 2.75, 0.3);
    let b = sim.sprite(5, 2.75, 0.3);
    assert_eq!(a.hue, b.hue);
    assert_eq!(a.lightness, b.lightness);
    assert_eq!(a.radius, b.radius);
}

#[test]
fn sprite_and_ring_grow_with_energy() {
    let sim = SoftwareParticleSimulator::new(800.0, 600.0, 13);
    let quiet = sim.sprite(0, 1.0, 0.0);
    let loud = sim.sprite(0, 1.0, 1.0);
    assert!(loud.radius > quiet.radius);
    assert!(loud.alpha > quiet.alpha);
    let ring_quiet = sim.ring(0.0);
    let ring_loud = sim.ring(1.0);
    assert!(ring_loud.radius > ring_quiet.radius);
    assert!(ring_loud.stroke_width > ring_quiet.stroke_width);
    assert!(ring_loud.glow > ring_quiet.glow);
}
