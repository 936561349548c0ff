use portal_core::{
    energy_from_byte_spectrum, energy_from_magnitudes, EnergySource, SilentEnergy,
};

#[test]
fn empty_spectrum_is_zero_energy() {
    assert_eq!(energy_from_byte_spectrum(&[]), 0.0);
    assert_eq!(energy_from_magnitudes(&[]), 0.0);
}

#[test]
fn saturated_spectrum_is_full_energy() {
    let bins = [255u8; 64];
    assert!((energy_from_byte_spectrum(&bins) - 1.0).abs() < 1e-6);
    let mags = [1.0f32; 64];
    assert!((energy_from_magnitudes(&mags) - 1.0).abs() < 1e-6);
}

#[test]
fn only_leading_low_mid_bins_contribute() {
    // 64 saturated bins followed by silence: trailing bins must not dilute.
    let mut bins = vec![255u8; 64];
    bins.extend(std::iter::repeat(0u8).take(448));
    assert!((energy_from_byte_spectrum(&bins) - 1.0).abs() < 1e-6);
}

#[test]
fn short_spectrum_averages_over_what_exists() {
    let bins = [255u8; 16];
    assert!((energy_from_byte_spectrum(&bins) - 1.0).abs() < 1e-6);
    let half = [128u8; 16];
    let e = energy_from_byte_spectrum(&half);
    assert!(e > 0.49 && e < 0.51);
}

#[test]
fn magnitudes_are_clamped_per_bin() {
    let mags = [2.0f32, -1.0, 1.0, 1.0];
    let e = energy_from_magnitudes(&mags);
    assert!((e - 0.75).abs() < 1e-6);
}

#[test]
fn silent_source_always_reports_zero() {
    let mut silent = SilentEnergy;
    for _ in 0..3 {
        assert_eq!(silent.energy_level(), 0.0);
    }
}
