//! Playback tests
//!
//! Tests for:
//! - Transport (Idle / Playing / Paused) transitions
//! - Loop modes and time scale
//! - Pose application onto the scene graph through a HumanoidRig

use std::sync::Arc;

use glam::{Quat, Vec3};

use rigmotion::animation::{AnimationClip, HumanoidClip, KeyframeTrack, Track};
use rigmotion::humanoid::{HumanoidBone, HumanoidRig, HumanoidSchema, canonical_skeleton};
use rigmotion::playback::{LoopMode, PlaybackDriver, PlaybackStatus};
use rigmotion::retarget::{RetargetBinding, RigConvention};
use rigmotion::scene::{Node, NodeHandle, SceneGraph, Transform};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

struct Fixture {
    scene: SceneGraph,
    rig: HumanoidRig,
    hips: NodeHandle,
    spine: NodeHandle,
}

fn fixture() -> Fixture {
    let mut scene = SceneGraph::new();
    let hips = scene.add_node(
        Node::with_name("hips")
            .with_transform(Transform::from_trs(Vec3::new(0.0, 0.95, 0.0), Quat::IDENTITY, Vec3::ONE)),
    );
    let spine = scene.add_to_parent(
        Node::with_name("spine")
            .with_transform(Transform::from_trs(Vec3::new(0.0, 0.1, 0.0), Quat::IDENTITY, Vec3::ONE)),
        hips,
    );
    let rig = HumanoidRig::from_names(
        &scene,
        [(HumanoidBone::Hips, "hips"), (HumanoidBone::Spine, "spine")],
    );
    Fixture {
        scene,
        rig,
        hips,
        spine,
    }
}

fn keys() -> [Quat; 3] {
    [
        Quat::IDENTITY,
        Quat::from_rotation_x(0.5),
        Quat::from_rotation_x(1.0),
    ]
}

/// Spine rotates over 2 s; hips walk forward 1 m over the same time.
fn clip() -> Arc<HumanoidClip> {
    let times = vec![0.0, 1.0, 2.0];
    let clip = AnimationClip::new(
        "test",
        vec![
            Track::new(
                HumanoidBone::Hips,
                KeyframeTrack::constant(Quat::IDENTITY),
            )
            .with_translation(KeyframeTrack::linear(
                vec![0.0, 2.0],
                vec![Vec3::new(0.0, 0.95, 0.0), Vec3::new(0.0, 0.95, 1.0)],
            )),
            Track::new(HumanoidBone::Spine, KeyframeTrack::linear(times, keys().to_vec())),
        ],
    );
    Arc::new(clip)
}

fn binding() -> Arc<RetargetBinding> {
    let binding = RetargetBinding::build(
        &canonical_skeleton(),
        &HumanoidSchema::normalized(),
        &RigConvention::Humanoid,
    )
    .unwrap();
    Arc::new(binding)
}

fn loaded(loop_mode: LoopMode) -> PlaybackDriver {
    let mut driver = PlaybackDriver::new().with_loop_mode(loop_mode);
    driver.load_clip(clip(), binding());
    driver
}

fn spine_rotation(f: &Fixture) -> Quat {
    f.scene.get_node(f.spine).unwrap().transform.rotation
}

// ============================================================================
// Transport
// ============================================================================

#[test]
fn load_clip_waits_idle_at_zero() {
    let mut f = fixture();
    let mut driver = loaded(LoopMode::Once);

    assert_eq!(driver.status(), PlaybackStatus::Idle);
    assert!(approx(driver.elapsed(), 0.0));

    driver.advance(0.5, &mut f.scene, &f.rig);
    assert!(approx(driver.elapsed(), 0.0));
    assert_eq!(spine_rotation(&f), Quat::IDENTITY);
}

#[test]
fn play_pause_stop() {
    let mut f = fixture();
    let mut driver = loaded(LoopMode::Once);

    driver.play();
    driver.advance(0.25, &mut f.scene, &f.rig);
    assert!(driver.is_playing());
    assert!(approx(driver.elapsed(), 0.25));

    driver.pause();
    assert_eq!(driver.status(), PlaybackStatus::Paused);
    driver.advance(0.25, &mut f.scene, &f.rig);
    assert!(approx(driver.elapsed(), 0.25));

    driver.play();
    driver.advance(0.25, &mut f.scene, &f.rig);
    assert!(approx(driver.elapsed(), 0.5));

    driver.stop();
    assert_eq!(driver.status(), PlaybackStatus::Idle);
    assert!(approx(driver.elapsed(), 0.0));
    assert!(driver.clip().is_some());
}

#[test]
fn play_without_clip_is_ignored() {
    let mut driver = PlaybackDriver::new();
    driver.play();
    assert_eq!(driver.status(), PlaybackStatus::Idle);
    assert!(driver.state().is_none());
}

#[test]
fn clear_drops_the_clip() {
    let mut driver = loaded(LoopMode::Loop);
    driver.play();
    driver.clear();
    assert!(driver.clip().is_none());
    assert_eq!(driver.status(), PlaybackStatus::Idle);
}

// ============================================================================
// Sampling
// ============================================================================

#[test]
fn pose_at_keyframe_is_exact() {
    let mut f = fixture();
    let mut driver = loaded(LoopMode::Once);

    driver.play();
    driver.advance(0.5, &mut f.scene, &f.rig);
    driver.advance(0.5, &mut f.scene, &f.rig);

    assert_eq!(driver.elapsed(), 1.0);
    assert_eq!(spine_rotation(&f), keys()[1]);
}

#[test]
fn pose_between_keyframes_is_interpolated() {
    let mut f = fixture();
    let mut driver = loaded(LoopMode::Once);

    driver.play();
    driver.advance(0.5, &mut f.scene, &f.rig);

    let expected = Quat::from_rotation_x(0.25);
    assert!(spine_rotation(&f).angle_between(expected) < 1e-4);

    let hips = f.scene.get_node(f.hips).unwrap().transform.position;
    assert!(approx(hips.z, 0.25));
    assert!(approx(hips.y, 0.95));
}

#[test]
fn once_clamps_and_pauses_at_end() {
    let mut f = fixture();
    let mut driver = loaded(LoopMode::Once);

    driver.play();
    driver.advance(10.0, &mut f.scene, &f.rig);

    assert!(approx(driver.elapsed(), 2.0));
    assert_eq!(driver.status(), PlaybackStatus::Paused);
    assert_eq!(spine_rotation(&f), keys()[2]);

    // Playing a finished clip starts it over.
    driver.play();
    assert!(approx(driver.elapsed(), 0.0));
    assert!(driver.is_playing());
}

#[test]
fn loop_wraps_around() {
    let mut f = fixture();
    let mut driver = loaded(LoopMode::Loop);

    driver.play();
    driver.advance(1.5, &mut f.scene, &f.rig);
    driver.advance(1.0, &mut f.scene, &f.rig);

    assert!(approx(driver.elapsed(), 0.5));
    assert!(driver.is_playing());
    assert!(spine_rotation(&f).angle_between(Quat::from_rotation_x(0.25)) < 1e-4);
}

#[test]
fn ping_pong_reverses() {
    let mut f = fixture();
    let mut driver = loaded(LoopMode::PingPong);

    driver.play();
    driver.advance(2.5, &mut f.scene, &f.rig);
    assert!(approx(driver.elapsed(), 1.5));

    driver.advance(2.0, &mut f.scene, &f.rig);
    assert!(approx(driver.elapsed(), 0.5));
}

#[test]
fn time_scale_speeds_up_the_clock() {
    let mut f = fixture();
    let mut driver = loaded(LoopMode::Once);
    driver.time_scale = 2.0;

    driver.play();
    driver.advance(0.25, &mut f.scene, &f.rig);
    assert!(approx(driver.elapsed(), 0.5));
}

#[test]
fn seek_then_apply_current_pose() {
    let mut f = fixture();
    let mut driver = loaded(LoopMode::Once);

    driver.seek(2.0);
    assert_eq!(driver.status(), PlaybackStatus::Idle);
    driver.apply_current_pose(&mut f.scene, &f.rig);
    assert_eq!(spine_rotation(&f), keys()[2]);

    f.rig.reset_to_rest(&mut f.scene);
    assert_eq!(spine_rotation(&f), Quat::IDENTITY);
    let hips = f.scene.get_node(f.hips).unwrap().transform.position;
    assert_eq!(hips, Vec3::new(0.0, 0.95, 0.0));
}

#[test]
fn rebind_preserving_time_keeps_clock() {
    let mut f = fixture();
    let mut driver = loaded(LoopMode::Once);

    driver.play();
    driver.advance(0.75, &mut f.scene, &f.rig);
    driver.rebind_preserving_time(clip(), binding());

    assert!(approx(driver.elapsed(), 0.75));
    assert!(driver.is_playing());

    driver.load_clip(clip(), binding());
    assert!(approx(driver.elapsed(), 0.0));
    assert_eq!(driver.status(), PlaybackStatus::Idle);
}

#[test]
fn bones_missing_from_rig_are_skipped() {
    let mut scene = SceneGraph::new();
    let hips = scene.add_node(Node::with_name("hips"));
    let rig = HumanoidRig::from_names(&scene, [(HumanoidBone::Hips, "hips"), (HumanoidBone::Spine, "spine")]);
    assert_eq!(rig.len(), 1);

    let mut driver = loaded(LoopMode::Once);
    driver.play();
    driver.advance(1.0, &mut scene, &rig);

    let position = scene.get_node(hips).unwrap().transform.position;
    assert!(approx(position.z, 0.5));
}
