//! Animation data tests
//!
//! Tests for:
//! - KeyframeTrack linear/step/cubic interpolation
//! - KeyframeCursor sequential access and binary search fallback
//! - AnimationClip duration and validation

use std::f32::consts::PI;

use glam::{Quat, Vec3};

use rigmotion::animation::{
    AnimationClip, InterpolationMode, KeyframeCursor, KeyframeTrack, SourceClip, Track,
};
use rigmotion::errors::ClipError;

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn sample(track: &KeyframeTrack<f32>, time: f32) -> f32 {
    track.sample(time).unwrap_or(f32::NAN)
}

// ============================================================================
// KeyframeTrack: Linear Interpolation
// ============================================================================

#[test]
fn track_linear_f32_midpoint() {
    let track = KeyframeTrack::linear(vec![0.0, 1.0], vec![0.0_f32, 10.0]);

    let mut cursor = KeyframeCursor::default();
    let val = track.sample_with_cursor(0.5, &mut cursor).unwrap();
    assert!(approx(val, 5.0), "Expected 5.0, got {val}");
}

#[test]
fn track_exact_keyframes_are_exact() {
    let track = KeyframeTrack::linear(vec![0.0, 1.0 / 3.0, 2.0 / 3.0], vec![0.1_f32, 0.7, 0.3]);

    let mut cursor = KeyframeCursor::default();
    for (i, &t) in track.times.iter().enumerate() {
        assert_eq!(track.sample_with_cursor(t, &mut cursor), Some(track.values[i]));
        assert_eq!(track.sample(t), Some(track.values[i]));
    }
}

#[test]
fn track_linear_clamps_outside_range() {
    let track = KeyframeTrack::linear(vec![1.0, 2.0], vec![10.0_f32, 20.0]);

    let mut cursor = KeyframeCursor::default();
    assert_eq!(track.sample_with_cursor(0.5, &mut cursor), Some(10.0));
    assert_eq!(track.sample_with_cursor(5.0, &mut cursor), Some(20.0));
    assert_eq!(track.sample(-1.0), Some(10.0));
}

#[test]
fn track_linear_vec3() {
    let track = KeyframeTrack::linear(vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::new(10.0, 20.0, 30.0)]);

    let val = track.sample(0.5).unwrap();
    assert!(approx(val.x, 5.0));
    assert!(approx(val.y, 10.0));
    assert!(approx(val.z, 15.0));
}

#[test]
fn track_linear_quat_slerp() {
    let q0 = Quat::IDENTITY;
    let q1 = Quat::from_rotation_y(PI * 0.5);

    let track = KeyframeTrack::linear(vec![0.0, 1.0], vec![q0, q1]);

    let val = track.sample(0.5).unwrap();
    let angle = val.angle_between(Quat::from_rotation_y(PI * 0.25));
    assert!(angle < 1e-4, "Quaternion slerp mismatch: angle={angle}");
    assert!(approx(val.length(), 1.0));
}

#[test]
fn empty_track_samples_nothing() {
    let track: KeyframeTrack<f32> = KeyframeTrack::linear(Vec::new(), Vec::new());
    assert!(track.is_empty());
    assert_eq!(track.sample(0.0), None);
    assert_eq!(track.sample_with_cursor(0.0, &mut KeyframeCursor::default()), None);
}

#[test]
fn constant_track_holds_forever() {
    let track = KeyframeTrack::constant(Quat::from_rotation_x(0.3));
    assert_eq!(track.sample(0.0), Some(Quat::from_rotation_x(0.3)));
    assert_eq!(track.sample(100.0), Some(Quat::from_rotation_x(0.3)));
    assert!(approx(track.duration(), 0.0));
}

// ============================================================================
// KeyframeTrack: Step / Cubic
// ============================================================================

#[test]
fn track_step_holds_value() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0],
        vec![0.0_f32, 100.0, 200.0],
        InterpolationMode::Step,
    );

    let mut cursor = KeyframeCursor::default();
    assert_eq!(track.sample_with_cursor(0.0, &mut cursor), Some(0.0));
    assert_eq!(track.sample_with_cursor(0.99, &mut cursor), Some(0.0));
    assert_eq!(track.sample_with_cursor(1.0, &mut cursor), Some(100.0));
    assert_eq!(track.sample_with_cursor(1.5, &mut cursor), Some(100.0));
    assert_eq!(track.sample_with_cursor(2.0, &mut cursor), Some(200.0));
}

#[test]
fn track_cubic_f32_endpoints() {
    // values = [in0, v0, out0, in1, v1, out1]
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 0.0, 1.0, 1.0, 10.0, 0.0],
        InterpolationMode::CubicSpline,
    );

    assert!(approx(sample(&track, 0.0), 0.0));
    assert!(approx(sample(&track, 1.0), 10.0));
}

#[test]
fn track_cubic_f32_zero_tangents_midpoint() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 0.0, 0.0, 0.0, 10.0, 0.0],
        InterpolationMode::CubicSpline,
    );

    // Hermite with zero tangents is symmetric around the midpoint.
    assert!(approx(sample(&track, 0.5), 5.0), "got {}", sample(&track, 0.5));
    assert!(sample(&track, 0.25) < 2.5);
}

// ============================================================================
// KeyframeCursor
// ============================================================================

#[test]
fn sample_matches_cursor_across_all_times() {
    let track = KeyframeTrack::linear(
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
        vec![0.0_f32, 10.0, 5.0, 20.0, 15.0],
    );
    let mut cursor = KeyframeCursor::default();
    for i in 0..=40 {
        let t = i as f32 * 0.1;
        let with_cursor = track.sample_with_cursor(t, &mut cursor).unwrap();
        let stateless = sample(&track, t);
        assert!(
            approx(with_cursor, stateless),
            "t={t}: sample()={stateless} != sample_with_cursor()={with_cursor}"
        );
    }
}

#[test]
fn cursor_sequential_forward() {
    let track = KeyframeTrack::linear(
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
        vec![0.0_f32, 10.0, 20.0, 30.0, 40.0],
    );

    let mut cursor = KeyframeCursor::default();
    for i in 0..40 {
        let t = i as f32 * 0.1;
        let val = track.sample_with_cursor(t, &mut cursor).unwrap();
        assert!(approx(val, t * 10.0), "t={t}: got {val}");
    }
    assert_eq!(cursor.last_index, 3);
}

#[test]
fn cursor_large_jump_falls_back_to_search() {
    let times: Vec<f32> = (0..100).map(|i| i as f32).collect();
    let values: Vec<f32> = times.iter().map(|t| t * 2.0).collect();
    let track = KeyframeTrack::linear(times, values);

    let mut cursor = KeyframeCursor::default();
    assert_eq!(track.sample_with_cursor(90.0, &mut cursor), Some(180.0));
    assert_eq!(cursor.last_index, 90);
    // Loop wrap back to the start.
    assert_eq!(track.sample_with_cursor(1.0, &mut cursor), Some(2.0));
    assert_eq!(cursor.last_index, 1);
}

// ============================================================================
// AnimationClip
// ============================================================================

#[test]
fn clip_duration_is_longest_track() {
    let clip: SourceClip = AnimationClip::new(
        "walk",
        vec![
            Track::new(
                "Hips".to_string(),
                KeyframeTrack::linear(vec![0.0, 1.0], vec![Quat::IDENTITY; 2]),
            )
            .with_translation(KeyframeTrack::linear(vec![0.0, 1.5], vec![Vec3::ZERO; 2])),
            Track::new(
                "Spine".to_string(),
                KeyframeTrack::linear(vec![0.0, 0.5], vec![Quat::IDENTITY; 2]),
            ),
        ],
    );

    assert!(approx(clip.duration, 1.5));
    assert!(clip.track("Spine").is_some());
    assert!(clip.track("Head").is_none());
    assert_eq!(clip.validate(), Ok(()));
}

#[test]
fn clip_validate_names_the_track() {
    let clip: SourceClip = AnimationClip::new(
        "bad",
        vec![Track::new(
            "Spine".to_string(),
            KeyframeTrack::linear(vec![0.0, 1.0, 0.5], vec![Quat::IDENTITY; 3]),
        )],
    );

    assert_eq!(
        clip.validate(),
        Err(ClipError::NonIncreasingTimes {
            track: "Spine".into(),
            index: 2
        })
    );
}
