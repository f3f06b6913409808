//! Retargeting tests
//!
//! Tests for:
//! - Bone name mappers and convention detection
//! - RetargetBinding corrections, facing alignment and unit scale
//! - retarget_clip over whole clips

use glam::{Quat, Vec3};

use rigmotion::animation::{AnimationClip, KeyframeTrack, SourceClip, Track};
use rigmotion::errors::RetargetError;
use rigmotion::humanoid::{HumanoidBone, HumanoidSchema, canonical_skeleton, canonical_skeleton_scaled};
use rigmotion::retarget::{
    BVH_RIG_MAP, BoneNameMapper, MIXAMO_RIG_MAP, RetargetBinding, RigConvention, TableMapper,
    retarget_clip,
};
use rigmotion::scene::{Bone, RestPose, Skeleton};

const EPSILON: f32 = 1e-5;

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn quat_approx(a: Quat, b: Quat) -> bool {
    a.angle_between(b) < 1e-4
}

fn skeleton(bones: &[(&str, Option<usize>, Vec3)]) -> Skeleton {
    let bones = bones
        .iter()
        .map(|&(name, parent, offset)| Bone::new(name, parent, RestPose::from_translation(offset)))
        .collect();
    Skeleton::new("source", bones).unwrap()
}

fn rotation_track(name: &str, values: Vec<Quat>) -> Track<String> {
    let times = (0..values.len()).map(|i| i as f32 / 30.0).collect();
    Track::new(name.to_string(), KeyframeTrack::linear(times, values))
}

// ============================================================================
// Mappers
// ============================================================================

#[test]
fn built_in_tables() {
    assert_eq!(MIXAMO_RIG_MAP.map("mixamorigLeftUpLeg"), Some(HumanoidBone::LeftUpperLeg));
    assert_eq!(MIXAMO_RIG_MAP.map("mixamorigSpine2"), Some(HumanoidBone::UpperChest));
    assert_eq!(BVH_RIG_MAP.map("RightForeArm"), Some(HumanoidBone::RightLowerArm));
    assert_eq!(BVH_RIG_MAP.map("mixamorigHips"), None);
    assert_eq!(RigConvention::Humanoid.map("leftUpperArm"), Some(HumanoidBone::LeftUpperArm));
}

#[test]
fn table_mapper_overrides() {
    let mut mapper = TableMapper::from_table(&[("pelvis", HumanoidBone::Hips)]);
    mapper.insert("spine_01", HumanoidBone::Spine);
    mapper.insert("pelvis", HumanoidBone::Chest);

    assert_eq!(mapper.len(), 2);
    assert_eq!(mapper.map("pelvis"), Some(HumanoidBone::Chest));
    assert_eq!(mapper.map("Pelvis"), None);
}

#[test]
fn convention_detection() {
    assert_eq!(
        RigConvention::detect_names(["mixamorigHips", "mixamorigSpine", "Armature"]),
        Some(RigConvention::Mixamo)
    );
    assert_eq!(
        RigConvention::detect_names(["Hips", "LeftUpLeg", "LeftLeg"]),
        Some(RigConvention::Bvh)
    );
    assert_eq!(
        RigConvention::detect(&canonical_skeleton()),
        Some(RigConvention::Humanoid)
    );
    assert_eq!(RigConvention::detect_names(["pelvis", "thigh_l"]), None);
}

#[test]
fn coverage_counts_recognized_bones() {
    let source = skeleton(&[
        ("mixamorigHips", None, Vec3::Y),
        ("mixamorigSpine", Some(0), Vec3::Y),
        ("mixamorigHeadTop_End", Some(1), Vec3::Y),
    ]);
    assert_eq!(RigConvention::Mixamo.coverage(&source), 2);
    assert_eq!(RigConvention::Bvh.coverage(&source), 0);
}

// ============================================================================
// RetargetBinding
// ============================================================================

#[test]
fn canonical_source_round_trips_exactly() {
    let source = canonical_skeleton();
    let schema = HumanoidSchema::normalized();
    let binding = RetargetBinding::build(&source, &schema, &RigConvention::Humanoid).unwrap();

    assert_eq!(binding.len(), HumanoidBone::ALL.len());
    assert!(binding.unmapped().is_empty());
    assert_eq!(binding.facing(), Quat::IDENTITY);
    for (_, bound) in binding.iter() {
        assert!(bound.correction.is_identity(), "{:?}", bound.humanoid);
    }

    let values = vec![
        Quat::from_rotation_x(0.3),
        Quat::from_euler(glam::EulerRot::YXZ, 0.2, -0.4, 1.1),
        Quat::from_xyzw(0.1, 0.2, 0.3, 0.9).normalize(),
    ];
    let clip: SourceClip = AnimationClip::new(
        "pose",
        vec![rotation_track("leftLowerArm", values.clone())],
    );
    let retargeted = retarget_clip(&clip, &binding);

    let track = retargeted.track(&HumanoidBone::LeftLowerArm).unwrap();
    assert_eq!(track.rotation.values, values);
    assert_eq!(track.rotation.times, clip.tracks[0].rotation.times);
}

#[test]
fn centimeter_rig_is_scaled_to_meters() {
    let source = canonical_skeleton_scaled(100.0);
    let schema = HumanoidSchema::normalized();
    let binding = RetargetBinding::build(&source, &schema, &RigConvention::Humanoid).unwrap();

    assert!((binding.unit_scale() - 0.01).abs() < 1e-6);

    let clip: SourceClip = AnimationClip::new(
        "walk",
        vec![
            rotation_track("hips", vec![Quat::IDENTITY; 2]).with_translation(KeyframeTrack::linear(
                vec![0.0, 1.0],
                vec![Vec3::new(0.0, 95.0, 0.0), Vec3::new(10.0, 95.0, 50.0)],
            )),
        ],
    );
    let retargeted = retarget_clip(&clip, &binding);
    let hips = retargeted.track(&HumanoidBone::Hips).unwrap();
    let translation = hips.translation.as_ref().unwrap();
    assert!(vec3_approx(translation.values[0], Vec3::new(0.0, 0.95, 0.0)));
    assert!(vec3_approx(translation.values[1], Vec3::new(0.1, 0.95, 0.5)));
}

#[test]
fn non_hips_root_keeps_unit_scale() {
    let source = skeleton(&[
        ("Armature", None, Vec3::ZERO),
        ("hips", Some(0), Vec3::new(0.0, 95.0, 0.0)),
    ]);
    let binding =
        RetargetBinding::build(&source, &HumanoidSchema::normalized(), &RigConvention::Humanoid)
            .unwrap();
    assert!((binding.unit_scale() - 1.0).abs() < f32::EPSILON);
    assert_eq!(binding.unmapped(), &["Armature".to_string()]);
}

#[test]
fn mixamo_clip_keeps_bound_tracks_only() {
    let source = skeleton(&[
        ("mixamorigHips", None, Vec3::new(0.0, 1.0, 0.0)),
        ("mixamorigSpine", Some(0), Vec3::new(0.0, 0.1, 0.0)),
        ("mixamorigHeadTop_End", Some(1), Vec3::new(0.0, 0.5, 0.0)),
    ]);
    let schema = HumanoidSchema::normalized();
    let binding = RetargetBinding::build(&source, &schema, &RigConvention::Mixamo).unwrap();

    assert_eq!(binding.len(), 2);
    assert_eq!(binding.humanoid_for("mixamorigSpine"), Some(HumanoidBone::Spine));
    assert_eq!(binding.source_for(HumanoidBone::Hips), Some("mixamorigHips"));
    assert_eq!(binding.unmapped(), &["mixamorigHeadTop_End".to_string()]);

    let spin = Quat::from_rotation_y(0.5);
    let clip: SourceClip = AnimationClip::new(
        "idle",
        vec![
            rotation_track("mixamorigHips", vec![Quat::IDENTITY, spin]).with_translation(
                KeyframeTrack::linear(vec![0.0, 1.0 / 30.0], vec![Vec3::Y, Vec3::new(0.0, 1.0, 0.2)]),
            ),
            rotation_track("mixamorigSpine", vec![spin, Quat::IDENTITY]).with_translation(
                KeyframeTrack::linear(vec![0.0], vec![Vec3::new(0.0, 0.1, 0.0)]),
            ),
            rotation_track("mixamorigHeadTop_End", vec![spin]),
        ],
    );
    let retargeted = retarget_clip(&clip, &binding);

    assert_eq!(retargeted.tracks.len(), 2);
    assert_eq!(retargeted.name, "idle");
    assert!((retargeted.duration - clip.duration).abs() < f32::EPSILON);

    let hips = retargeted.track(&HumanoidBone::Hips).unwrap();
    let translation = hips.translation.as_ref().unwrap();
    // Source hips stand 1.0 high, the schema's 0.95.
    assert!(vec3_approx(translation.values[1], Vec3::new(0.0, 0.95, 0.19)));
    assert!(quat_approx(hips.rotation.values[1], spin));

    let spine = retargeted.track(&HumanoidBone::Spine).unwrap();
    assert!(spine.translation.is_none());
    assert!(quat_approx(spine.rotation.values[0], spin));
}

#[test]
fn unmappable_source_is_rejected() {
    let source = skeleton(&[("pelvis", None, Vec3::Y), ("thigh_l", Some(0), -Vec3::Y)]);
    let result = RetargetBinding::build(&source, &HumanoidSchema::normalized(), &RigConvention::Mixamo);
    assert_eq!(result.unwrap_err(), RetargetError::NoMappableBones);
}

#[test]
fn backwards_facing_source_is_turned_around() {
    // Left leg on -X: this rig faces -Z.
    let source = skeleton(&[
        ("hips", None, Vec3::new(0.0, 0.95, 0.0)),
        ("leftUpperLeg", Some(0), Vec3::new(-0.09, -0.05, 0.0)),
        ("rightUpperLeg", Some(0), Vec3::new(0.09, -0.05, 0.0)),
    ]);
    let schema = HumanoidSchema::normalized();
    let binding = RetargetBinding::build(&source, &schema, &RigConvention::Humanoid).unwrap();
    assert!(quat_approx(binding.facing(), Quat::from_rotation_y(std::f32::consts::PI)));

    let clip: SourceClip = AnimationClip::new(
        "forward",
        vec![
            rotation_track("hips", vec![Quat::from_rotation_x(0.3)]).with_translation(
                KeyframeTrack::linear(vec![0.0], vec![Vec3::new(0.0, 0.95, 1.0)]),
            ),
            rotation_track("leftUpperLeg", vec![Quat::from_rotation_x(0.3)]),
        ],
    );
    let retargeted = retarget_clip(&clip, &binding);

    let hips = retargeted.track(&HumanoidBone::Hips).unwrap();
    let moved = hips.translation.as_ref().unwrap().values[0];
    assert!(vec3_approx(moved, Vec3::new(0.0, 0.95, -1.0)), "got {moved:?}");
    // A pitch about the source's X is a pitch about the target's -X.
    assert!(quat_approx(hips.rotation.values[0], Quat::from_rotation_x(-0.3)));

    // The whole pose turns, so child bones pitch about -X too.
    let leg = retargeted.track(&HumanoidBone::LeftUpperLeg).unwrap();
    assert!(quat_approx(leg.rotation.values[0], Quat::from_rotation_x(-0.3)));
}

#[test]
fn facing_alignment_can_be_disabled() {
    let source = skeleton(&[
        ("hips", None, Vec3::new(0.0, 0.95, 0.0)),
        ("leftUpperLeg", Some(0), Vec3::new(-0.09, -0.05, 0.0)),
        ("rightUpperLeg", Some(0), Vec3::new(0.09, -0.05, 0.0)),
    ]);
    let binding = RetargetBinding::build_with(
        &source,
        &HumanoidSchema::normalized(),
        &RigConvention::Humanoid,
        false,
    )
    .unwrap();
    assert_eq!(binding.facing(), Quat::IDENTITY);
    assert!(binding.iter().all(|(_, b)| b.correction.is_identity()));
}

#[test]
fn rotated_rest_pose_is_compensated() {
    // Source upper arm rests rotated 90° about Z; the schema rests at identity.
    let rest = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
    let bones = vec![
        Bone::new("hips", None, RestPose::from_translation(Vec3::new(0.0, 0.95, 0.0))),
        Bone::new("leftUpperArm", Some(0), RestPose::from_translation_rotation(Vec3::X, rest)),
        Bone::new("leftLowerArm", Some(1), RestPose::from_translation(Vec3::X)),
    ];
    let source = Skeleton::new("rotated", bones).unwrap();
    let binding =
        RetargetBinding::build(&source, &HumanoidSchema::normalized(), &RigConvention::Humanoid)
            .unwrap();

    // The rest pose itself maps to the schema's rest pose.
    let arm = binding.get("leftUpperArm").unwrap().correction;
    assert!(quat_approx(arm.apply(rest), Quat::IDENTITY));

    // The child rests at identity locally but sits in a rotated parent.
    let forearm = binding.get("leftLowerArm").unwrap().correction;
    assert!(quat_approx(forearm.apply(Quat::IDENTITY), Quat::IDENTITY));
    let bend = Quat::from_rotation_y(0.4);
    let world_bend = rest * bend;
    assert!(quat_approx(forearm.apply(bend), rest * bend * rest.inverse()));
    assert!(quat_approx(arm.apply(rest) * forearm.apply(bend), world_bend * rest.inverse()));
}

#[test]
fn two_entry_table_drops_foreign_tracks() {
    let mapper = TableMapper::from_table(&[
        ("mixamorigHips", HumanoidBone::Hips),
        ("mixamorigSpine", HumanoidBone::Spine),
    ]);
    let source = skeleton(&[
        ("mixamorigHips", None, Vec3::new(0.0, 0.95, 0.0)),
        ("mixamorigSpine", Some(0), Vec3::new(0.0, 0.1, 0.0)),
        ("Foo", Some(1), Vec3::new(0.0, 0.1, 0.0)),
    ]);
    let binding = RetargetBinding::build(&source, &HumanoidSchema::normalized(), &mapper).unwrap();

    let clip: SourceClip = AnimationClip::new(
        "clip",
        vec![
            rotation_track("mixamorigHips", vec![Quat::IDENTITY]),
            rotation_track("mixamorigSpine", vec![Quat::IDENTITY]),
            rotation_track("Foo", vec![Quat::IDENTITY]),
        ],
    );
    let retargeted = retarget_clip(&clip, &binding);

    let targets: Vec<HumanoidBone> = retargeted.tracks.iter().map(|t| t.target).collect();
    assert_eq!(targets, vec![HumanoidBone::Hips, HumanoidBone::Spine]);
}
