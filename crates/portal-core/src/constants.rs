// Shared simulation/visual tuning constants used by both web and native frontends.

// Particle population
pub const SOFTWARE_PARTICLE_CAP: u32 = 1_600; // CPU path: one sequential loop per frame
pub const SOFTWARE_AREA_PER_PARTICLE: f32 = 1_200.0;
pub const COMPUTE_PARTICLE_CAP: u32 = 200_000; // GPU path scales far higher by design
pub const COMPUTE_AREA_PER_PARTICLE: f32 = 4.0;

// Field forces (screen-space units; the compute shader works in NDC)
pub const ATTRACTION_CONSTANT: f32 = 12.0;
pub const ATTRACTION_FORCE_CAP: f32 = 0.12;
pub const ATTRACTION_BASE_GAIN: f32 = 0.6;
pub const ATTRACTION_AUDIO_GAIN: f32 = 1.8;
pub const SWIRL_BASE: f32 = 0.002;
pub const SWIRL_AUDIO: f32 = 0.01;
pub const DAMPING: f32 = 0.92;
pub const DISTANCE_EPSILON: f32 = 1e-4;

// Tilt steering
pub const TILT_DEGREES_FULL_SCALE: f64 = 45.0; // degrees mapping to |tilt| = 1
pub const TILT_OFFSET_SCALE: f32 = 120.0; // pixels of target offset at full tilt

// Soft boundary: spring pull back toward center, never a positional clamp
pub const BOUNDARY_FRACTION: f32 = 0.48;
pub const BOUNDARY_SPRING: f32 = 0.001;

// Audio energy reduction
pub const ENERGY_BIN_COUNT: usize = 64; // low/mid bins of a 1024-point FFT
pub const MAX_BYTE_MAGNITUDE: f32 = 255.0;

// Particle sprite appearance
pub const BASE_RADIUS_MIN: f32 = 1.0;
pub const BASE_RADIUS_SPAN: f32 = 1.5;
pub const HUE_MIN: f32 = 260.0; // violet band
pub const HUE_SPAN: f32 = 60.0;
pub const GLOW_BASE: f32 = 0.4;
pub const GLOW_AUDIO: f32 = 0.9;
pub const ALPHA_BASE: f32 = 0.45;
pub const ALPHA_AUDIO: f32 = 0.4;

// Portal ring geometry
pub const RING_RADIUS_FRACTION: f32 = 0.18;
pub const RING_RADIUS_AUDIO: f32 = 0.05;
pub const RING_STROKE_BASE: f32 = 2.0;
pub const RING_STROKE_AUDIO: f32 = 3.0;
pub const RING_GLOW_BASE: f32 = 20.0;
pub const RING_GLOW_AUDIO: f32 = 40.0;
pub const RING_ALPHA_BASE: f32 = 0.45;
pub const RING_ALPHA_AUDIO: f32 = 0.4;

// Frame pacing
pub const MAX_FRAME_DT: f32 = 0.033; // clamp stalls so forces stay stable
pub const DEVICE_PIXEL_RATIO_CAP: f64 = 2.0;

// Seeding: annulus around viewport center, sqrt-weighted toward the middle
pub const SPAWN_RADIUS_FRACTION: f32 = 0.45;
pub const COMPUTE_SPAWN_RADIUS_NDC: f32 = 0.9;
pub const COMPUTE_BOUNDARY_NDC: f32 = 0.98;

// Compute dispatch
pub const COMPUTE_WORKGROUP_SIZE: u32 = 256;
pub const HUE_BUCKETS: u32 = 1024;
