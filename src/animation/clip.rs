use std::fmt::Display;

use glam::{Quat, Vec3};

use crate::animation::tracks::KeyframeTrack;
use crate::errors::ClipError;
use crate::humanoid::HumanoidBone;

/// Animation of one bone: a rotation track and, optionally, a translation
/// track with its own time base.
#[derive(Debug, Clone, PartialEq)]
pub struct Track<K> {
    pub target: K,
    pub rotation: KeyframeTrack<Quat>,
    pub translation: Option<KeyframeTrack<Vec3>>,
}

impl<K> Track<K> {
    #[must_use]
    pub fn new(target: K, rotation: KeyframeTrack<Quat>) -> Self {
        Self {
            target,
            rotation,
            translation: None,
        }
    }

    #[must_use]
    pub fn with_translation(mut self, translation: KeyframeTrack<Vec3>) -> Self {
        self.translation = Some(translation);
        self
    }

    /// Time of the last keyframe on either channel.
    #[must_use]
    pub fn duration(&self) -> f32 {
        let rotation = self.rotation.duration();
        self.translation
            .as_ref()
            .map_or(rotation, |t| rotation.max(t.duration()))
    }
}

/// Named collection of bone tracks.
///
/// `K` is the track key: a source bone name for clips straight out of a
/// motion file ([`SourceClip`]), or a [`HumanoidBone`] once retargeted
/// ([`HumanoidClip`]).
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip<K> {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<Track<K>>,
}

/// A clip keyed by the motion file's own bone names.
pub type SourceClip = AnimationClip<String>;

/// A clip keyed by canonical humanoid bones.
pub type HumanoidClip = AnimationClip<HumanoidBone>;

impl<K> AnimationClip<K> {
    #[must_use]
    pub fn new(name: impl Into<String>, tracks: Vec<Track<K>>) -> Self {
        let duration = tracks.iter().map(Track::duration).fold(0.0_f32, f32::max);

        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl<K: PartialEq> AnimationClip<K> {
    #[must_use]
    pub fn track<Q>(&self, target: &Q) -> Option<&Track<K>>
    where
        K: PartialEq<Q>,
        Q: ?Sized,
    {
        self.tracks.iter().find(|t| t.target == *target)
    }
}

impl<K: Display> AnimationClip<K> {
    /// Checks every track's keyframe invariants.
    pub fn validate(&self) -> Result<(), ClipError> {
        for track in &self.tracks {
            let name = track.target.to_string();
            track.rotation.validate(&name)?;
            if let Some(translation) = &track.translation {
                translation.validate(&name)?;
            }
        }
        Ok(())
    }
}
