// Unit tests for business rules

use crate::domain::rules::*;

#[test]
fn test_bitrate_target_for_ten_seconds() {
    let policy = BitratePolicy::default();
    let target = policy.target_bitrate(10.0).unwrap();
    assert!((target - 6_710_886.4).abs() < 1e-6);
}

#[test]
fn test_bitrate_applies_safety_margin() {
    let policy = BitratePolicy::default();
    // floor(6710886.4 * 0.95) = floor(6375342.08)
    assert_eq!(policy.encode_bitrate(10.0).unwrap(), 6_375_342);
    assert_eq!(policy.encode_bitrate(9.0).unwrap(), 7_083_713);
}

#[test]
fn test_bitrate_rejects_empty_cut() {
    let policy = BitratePolicy::default();
    assert!(policy.encode_bitrate(0.0).is_err());
    assert!(policy.encode_bitrate(-1.0).is_err());
}

#[test]
fn test_bitrate_policy_validation() {
    assert!(BitratePolicy::new(0, 0.95).is_err());
    assert!(BitratePolicy::new(1024, 0.0).is_err());
    assert!(BitratePolicy::new(1024, 1.5).is_err());
    assert!(BitratePolicy::new(1024, 1.0).is_ok());
}

#[test]
fn test_trimmed_duration() {
    assert_eq!(trimmed_duration(60, 600, 60.0), 9.0);
    assert_eq!(trimmed_duration(600, 60, 60.0), 0.0);
}

#[test]
fn test_keyframe_window_clamps_to_start() {
    let window = KeyframeSearchPlanner::window(0.2, 1.6, 10.0);
    assert_eq!(window.start, 0.0);
    assert_eq!(window.length, 1.6);
}

#[test]
fn test_keyframe_window_centered() {
    let window = KeyframeSearchPlanner::window(5.0, 1.6, 10.0);
    assert!((window.start - 4.2).abs() < 1e-9);
}

#[test]
fn test_keyframe_window_clamps_to_end() {
    let window = KeyframeSearchPlanner::window(12.0, 1.0, 12.0);
    assert_eq!(window.start, 11.0);
    assert_eq!(window.length, 1.0);
}

#[test]
fn test_keyframe_window_longer_than_media() {
    let window = KeyframeSearchPlanner::window(0.5, 4.0, 1.5);
    assert_eq!(window.start, 0.0);
    assert_eq!(window.length, 1.5);
}

#[test]
fn test_slider_to_volume() {
    assert_eq!(slider_to_volume(50.0), 0.5);
    assert_eq!(slider_to_volume(100.0), 1.0);
    assert_eq!(slider_to_volume(150.0), 1.0);
    assert_eq!(slider_to_volume(-5.0), 0.0);
}
