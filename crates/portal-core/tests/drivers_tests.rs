use glam::Vec2;
use portal_core::constants::TILT_OFFSET_SCALE;
use portal_core::{normalize_tilt, InputAggregator};

#[test]
fn defaults_are_viewport_center_and_zero_tilt() {
    let agg = InputAggregator::new(1920.0, 1080.0);
    let snap = agg.snapshot(1.0 / 60.0, 0.0);
    assert_eq!(snap.target, Vec2::new(960.0, 540.0));
    assert_eq!(snap.tilt, Vec2::ZERO);
}

#[test]
fn pointer_and_touch_share_the_last_value_cell() {
    let mut agg = InputAggregator::new(800.0, 600.0);
    agg.record_pointer(10.0, 20.0);
    agg.record_touch(30.0, 40.0);
    assert_eq!(agg.snapshot(0.0, 0.0).target, Vec2::new(30.0, 40.0));
    agg.record_pointer(50.0, 60.0);
    assert_eq!(agg.snapshot(0.0, 0.0).target, Vec2::new(50.0, 60.0));
}

#[test]
fn tilt_normalizes_degrees_and_clamps() {
    assert_eq!(normalize_tilt(45.0), 1.0);
    assert_eq!(normalize_tilt(-45.0), -1.0);
    assert_eq!(normalize_tilt(22.5), 0.5);
    assert_eq!(normalize_tilt(90.0), 1.0);
    assert_eq!(normalize_tilt(-200.0), -1.0);

    let mut agg = InputAggregator::new(800.0, 600.0);
    agg.record_tilt(Some(22.5), Some(-45.0));
    let snap = agg.snapshot(0.0, 0.0);
    // gamma steers x, beta steers y
    assert_eq!(snap.tilt, Vec2::new(-1.0, 0.5));
}

#[test]
fn malformed_tilt_retains_previous_value() {
    let mut agg = InputAggregator::new(800.0, 600.0);
    agg.record_tilt(Some(45.0), Some(45.0));
    agg.record_tilt(None, Some(10.0));
    assert_eq!(agg.snapshot(0.0, 0.0).tilt, Vec2::new(1.0, 1.0));
    agg.record_tilt(Some(10.0), None);
    assert_eq!(agg.snapshot(0.0, 0.0).tilt, Vec2::new(1.0, 1.0));
}

#[test]
fn resize_moves_default_center_but_not_recorded_target() {
    let mut agg = InputAggregator::new(800.0, 600.0);
    agg.set_viewport(400.0, 300.0);
    assert_eq!(agg.snapshot(0.0, 0.0).target, Vec2::new(200.0, 150.0));

    agg.record_pointer(13.0, 37.0);
    agg.set_viewport(1600.0, 1200.0);
    assert_eq!(agg.snapshot(0.0, 0.0).target, Vec2::new(13.0, 37.0));
}

#[test]
fn steer_point_offsets_target_by_tilt() {
    let mut agg = InputAggregator::new(800.0, 600.0);
    agg.record_pointer(100.0, 100.0);
    agg.record_tilt(Some(45.0), Some(-45.0));
    let snap = agg.snapshot(0.0, 0.0);
    let steer = snap.steer_point();
    assert_eq!(steer.x, 100.0 - TILT_OFFSET_SCALE);
    assert_eq!(steer.y, 100.0 + TILT_OFFSET_SCALE);
}
