//! Reduction of a frequency spectrum to one normalized energy scalar.

use crate::constants::{ENERGY_BIN_COUNT, MAX_BYTE_MAGNITUDE};

/// Per-frame provider of the normalized audio energy level.
///
/// Implementations hold whatever capture handle they need (an `AnalyserNode`
/// on web, a cpal input stream natively) and release it on drop.
pub trait EnergySource {
    fn energy_level(&mut self) -> f32;
}

/// Permanent stand-in when microphone access was denied or is unavailable.
/// The session never retries; energy stays at zero.
#[derive(Default)]
pub struct SilentEnergy;

impl EnergySource for SilentEnergy {
    fn energy_level(&mut self) -> f32 {
        0.0
    }
}

/// Averages the leading low/mid bins of a byte spectrum (as produced by
/// `AnalyserNode::getByteFrequencyData`) and normalizes by the maximum
/// per-bin magnitude.
pub fn energy_from_byte_spectrum(bins: &[u8]) -> f32 {
    let n = bins.len().min(ENERGY_BIN_COUNT);
    if n == 0 {
        return 0.0;
    }
    let sum: u32 = bins[..n].iter().map(|&b| b as u32).sum();
    sum as f32 / (n as f32 * MAX_BYTE_MAGNITUDE)
}

/// Same reduction for magnitudes already normalized to \[0, 1\] per bin
/// (the native FFT path).
pub fn energy_from_magnitudes(bins: &[f32]) -> f32 {
    let n = bins.len().min(ENERGY_BIN_COUNT);
    if n == 0 {
        return 0.0;
    }
    let sum: f32 = bins[..n].iter().map(|&m| m.clamp(0.0, 1.0)).sum();
    sum / n as f32
}
