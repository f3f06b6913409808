use crate::animation::{HumanoidClip, SourceClip, Track};
use crate::humanoid::HumanoidBone;
use crate::retarget::binding::RetargetBinding;

/// Re-expresses a source clip on the humanoid skeleton.
///
/// Tracks of unbound bones are dropped. Every rotation value, cubic tangents
/// included, goes through the bone's correction. Translation survives only on
/// the hips, rotated into the target frame and scaled by the binding's unit
/// scale. Keyframe times are copied unchanged, and so is the clip duration.
#[must_use]
pub fn retarget_clip(source: &SourceClip, binding: &RetargetBinding) -> HumanoidClip {
    let mut tracks = Vec::with_capacity(source.tracks.len());
    let mut dropped = 0usize;

    for track in &source.tracks {
        let Some(bound) = binding.get(&track.target) else {
            log::trace!("Track '{}' has no bound bone, dropped", track.target);
            dropped += 1;
            continue;
        };
        let correction = bound.correction;

        let rotation = if correction.is_identity() {
            track.rotation.clone()
        } else {
            track.rotation.map_values(|q| correction.apply(q))
        };

        let translation = if bound.humanoid == HumanoidBone::ROOT {
            let scale = binding.unit_scale();
            track
                .translation
                .as_ref()
                .map(|t| t.map_values(|p| correction.apply_translation(p) * scale))
        } else {
            None
        };

        tracks.push(Track {
            target: bound.humanoid,
            rotation,
            translation,
        });
    }

    log::debug!(
        "Retargeted clip '{}': {} tracks kept, {dropped} dropped",
        source.name,
        tracks.len()
    );

    HumanoidClip {
        name: source.name.clone(),
        duration: source.duration,
        tracks,
    }
}
