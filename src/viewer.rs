use std::path::Path;
use std::sync::Arc;

use crate::animation::{HumanoidClip, SourceClip};
use crate::assets::avatar::{AssetParser, AvatarAsset, MotionParser, ParsedAvatar, ParsedMotion};
use crate::assets::file_kind::FileKind;
use crate::assets::lifecycle::{AssetLifecycle, HeadlessBackend, RenderBackend, SwapOutcome};
use crate::assets::loader::{
    CompletedLoad, LoadKind, LoadPayload, LoadQueue, LoadTicket, file_name, read_avatar,
    read_motion,
};
use crate::assets::loaders::BvhParser;
use crate::errors::{Error, Result, RetargetError};
use crate::humanoid::HumanoidSchema;
use crate::playback::PlaybackDriver;
use crate::retarget::{RetargetBinding, RigConvention, retarget_clip};
use crate::scene::{SceneGraph, Skeleton};
use crate::settings::{SwapPolicy, ViewerSettings};

/// Something the host UI may want to show.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    AvatarLoaded {
        name: String,
        humanoid: bool,
    },
    MotionLoaded {
        name: String,
        /// Source bones bound to the current avatar (0 without an avatar).
        bound: usize,
        /// Source bones with no humanoid mapping.
        unmapped: Vec<String>,
    },
    /// The current motion could not be bound to a newly loaded avatar and
    /// playback was cleared.
    MotionUnbound {
        reason: RetargetError,
    },
    LoadFailed {
        ticket: LoadTicket,
        error: String,
    },
    /// A load finished after a newer one of the same kind had been applied.
    LoadDiscarded {
        ticket: LoadTicket,
    },
}

/// A motion as loaded, kept so it can be rebound when the avatar changes.
#[derive(Debug, Clone)]
struct LoadedMotion {
    skeleton: Skeleton,
    clip: SourceClip,
}

/// Avatar viewer without a window: loads avatars and motion, retargets and
/// plays it. Call [`update`](Self::update) once per frame, then render
/// [`active_scene`](Self::active_scene).
pub struct AvatarViewer<B: RenderBackend = HeadlessBackend> {
    settings: ViewerSettings,
    backend: B,
    lifecycle: AssetLifecycle,
    playback: PlaybackDriver,
    loads: LoadQueue,
    motion: Option<LoadedMotion>,
    avatar_parser: Option<Arc<dyn AssetParser>>,
    motion_parser: Arc<dyn MotionParser>,
    events: Vec<ViewerEvent>,
}

impl AvatarViewer<HeadlessBackend> {
    #[must_use]
    pub fn headless(settings: ViewerSettings) -> Self {
        Self::new(HeadlessBackend::new(), settings)
    }
}

impl<B: RenderBackend> AvatarViewer<B> {
    #[must_use]
    pub fn new(backend: B, settings: ViewerSettings) -> Self {
        let mut playback = PlaybackDriver::new();
        playback.loop_mode = settings.playback.loop_mode;
        playback.time_scale = settings.playback.time_scale;

        Self {
            settings,
            backend,
            lifecycle: AssetLifecycle::new(),
            playback,
            loads: LoadQueue::new(),
            motion: None,
            avatar_parser: default_avatar_parser(),
            motion_parser: Arc::new(BvhParser::new()),
            events: Vec::new(),
        }
    }

    pub fn set_avatar_parser(&mut self, parser: Arc<dyn AssetParser>) {
        self.avatar_parser = Some(parser);
    }

    pub fn set_motion_parser(&mut self, parser: Arc<dyn MotionParser>) {
        self.motion_parser = parser;
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Starts loading `path` in the background, dispatching on its extension.
    /// The result is applied by a later [`update`](Self::update).
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<LoadTicket> {
        let path = path.as_ref().to_path_buf();
        let name = file_name(&path);
        let ticket = match FileKind::from_path(&path)? {
            FileKind::Avatar => {
                let parser = self.avatar_parser()?;
                self.loads.spawn_avatar(name, read_avatar(path, parser))
            }
            FileKind::Motion => {
                let parser = Arc::clone(&self.motion_parser);
                self.loads.spawn_motion(name, read_motion(path, parser))
            }
        };
        log::info!("Loading {:?} '{}' (#{})", ticket.kind, ticket.name, ticket.generation);
        Ok(ticket)
    }

    /// Loads `path` on the calling thread and applies it immediately.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let kind = FileKind::from_path(path)?;
        let bytes = std::fs::read(path)?;
        self.load_bytes(kind, &file_name(path), &bytes)
    }

    /// Parses `bytes` as `kind` and applies the result immediately.
    ///
    /// On failure the previous avatar and motion stay active.
    pub fn load_bytes(&mut self, kind: FileKind, name: &str, bytes: &[u8]) -> Result<()> {
        match kind {
            FileKind::Avatar => {
                let ticket = self.loads.begin(LoadKind::Avatar, name);
                let parsed = self
                    .avatar_parser()
                    .and_then(|p| p.parse(bytes).map_err(Error::from));
                self.finish_avatar(ticket, parsed)
            }
            FileKind::Motion => {
                let ticket = self.loads.begin(LoadKind::Motion, name);
                let parsed = self.motion_parser.parse(bytes).map_err(Error::from);
                self.finish_motion(ticket, parsed)
            }
        }
    }

    /// Applies an already parsed avatar.
    pub fn load_avatar(&mut self, parsed: ParsedAvatar) -> Result<()> {
        let ticket = self.loads.begin(LoadKind::Avatar, parsed.name.clone());
        self.finish_avatar(ticket, Ok(parsed))
    }

    /// Applies an already parsed motion.
    pub fn load_motion(&mut self, parsed: ParsedMotion) -> Result<()> {
        let ticket = self.loads.begin(LoadKind::Motion, parsed.clip.name.clone());
        self.finish_motion(ticket, Ok(parsed))
    }

    /// The load queue, for hosts that produce their own load results.
    pub fn loads_mut(&mut self) -> &mut LoadQueue {
        &mut self.loads
    }

    fn avatar_parser(&self) -> Result<Arc<dyn AssetParser>> {
        self.avatar_parser
            .clone()
            .ok_or(Error::ParserMissing("avatar"))
    }

    fn apply_completed(&mut self, done: CompletedLoad) {
        let CompletedLoad { ticket, payload } = done;
        if self.loads.is_stale(&ticket) {
            log::debug!(
                "Discarding stale {:?} load '{}' (#{})",
                ticket.kind,
                ticket.name,
                ticket.generation
            );
            self.events.push(ViewerEvent::LoadDiscarded { ticket });
            return;
        }
        // Errors are already reported as events.
        let _ = match payload {
            LoadPayload::Avatar(result) => self.finish_avatar(ticket, result),
            LoadPayload::Motion(result) => self.finish_motion(ticket, result),
        };
    }

    fn fail(&mut self, ticket: LoadTicket, error: Error) -> Result<()> {
        log::warn!("Failed to load '{}': {error}", ticket.name);
        self.events.push(ViewerEvent::LoadFailed {
            ticket,
            error: error.to_string(),
        });
        Err(error)
    }

    fn finish_avatar(&mut self, ticket: LoadTicket, parsed: Result<ParsedAvatar>) -> Result<()> {
        let mut parsed = match parsed {
            Ok(parsed) => parsed,
            Err(err) => return self.fail(ticket, err),
        };
        if parsed.name.is_empty() {
            parsed.name.clone_from(&ticket.name);
        }

        let asset = AvatarAsset::from_parsed(parsed);
        let name = asset.name.clone();
        let handle = self.lifecycle.insert(asset);
        let humanoid = match self.lifecycle.swap_asset(handle, &mut self.backend) {
            Ok(SwapOutcome::Swapped { humanoid }) => humanoid,
            Ok(SwapOutcome::Unchanged) => return Ok(()),
            Err(err) => return self.fail(ticket, err),
        };
        self.loads.mark_applied(&ticket);
        self.events.push(ViewerEvent::AvatarLoaded { name, humanoid });

        self.rebind_after_swap();
        Ok(())
    }

    fn finish_motion(&mut self, ticket: LoadTicket, parsed: Result<ParsedMotion>) -> Result<()> {
        let ParsedMotion { skeleton, mut clip } = match parsed {
            Ok(parsed) => parsed,
            Err(err) => return self.fail(ticket, err),
        };
        if clip.name.is_empty() {
            clip.name.clone_from(&ticket.name);
        }
        let motion = LoadedMotion { skeleton, clip };

        let schema = self
            .lifecycle
            .active()
            .and_then(|asset| asset.schema().ok());
        let Some(schema) = schema else {
            // No humanoid avatar yet; bind once one arrives.
            log::info!("Motion '{}' loaded, waiting for an avatar", motion.clip.name);
            self.events.push(ViewerEvent::MotionLoaded {
                name: motion.clip.name.clone(),
                bound: 0,
                unmapped: Vec::new(),
            });
            self.motion = Some(motion);
            self.playback.clear();
            self.loads.mark_applied(&ticket);
            return Ok(());
        };

        // A motion that does not bind leaves the previous one playing.
        let (clip, binding) = match bind_motion(&motion, schema, &self.settings) {
            Ok(bound) => bound,
            Err(err) => return self.fail(ticket, err.into()),
        };

        self.loads.mark_applied(&ticket);
        self.events.push(ViewerEvent::MotionLoaded {
            name: clip.name.clone(),
            bound: binding.len(),
            unmapped: binding.unmapped().to_vec(),
        });
        log::info!(
            "Motion '{}': {} of {} bones bound",
            clip.name,
            binding.len(),
            motion.skeleton.len()
        );

        self.motion = Some(motion);
        self.playback.load_clip(clip, binding);
        if self.settings.playback.autoplay {
            self.playback.play();
        }
        self.refresh_pose();
        Ok(())
    }

    /// Rebinds the current motion to the newly active avatar.
    fn rebind_after_swap(&mut self) {
        let Some(motion) = &self.motion else {
            self.playback.clear();
            self.refresh_pose();
            return;
        };

        let bound = match self.lifecycle.active().map(AvatarAsset::schema) {
            Some(Ok(schema)) => {
                bind_motion(motion, schema, &self.settings).map_err(Some)
            }
            Some(Err(err)) => Err(Some(err)),
            None => Err(None),
        };

        match bound {
            Ok((clip, binding)) => match self.settings.playback.on_asset_swap {
                SwapPolicy::Restart => self.playback.load_clip(clip, binding),
                SwapPolicy::RestartPlaying => {
                    self.playback.load_clip(clip, binding);
                    self.playback.play();
                }
                SwapPolicy::PreserveTime => self.playback.rebind_preserving_time(clip, binding),
            },
            Err(reason) => {
                self.playback.clear();
                if let Some(reason) = reason {
                    log::warn!("Motion cannot drive the new avatar: {reason}");
                    self.events.push(ViewerEvent::MotionUnbound { reason });
                }
            }
        }
        self.refresh_pose();
    }

    /// Resets the avatar to its rest pose, then writes the current clip pose.
    fn refresh_pose(&mut self) {
        if let Some(asset) = self.lifecycle.active_mut() {
            asset.rig.reset_to_rest(&mut asset.scene);
            if self.playback.clip().is_some() {
                self.playback
                    .apply_current_pose(&mut asset.scene, &asset.rig);
            }
            asset.scene.update_world_matrices();
        }
    }

    // ========================================================================
    // Per-frame
    // ========================================================================

    /// Applies finished loads, advances playback by `dt` seconds and updates
    /// world matrices.
    pub fn update(&mut self, dt: f32) {
        for done in self.loads.drain() {
            self.apply_completed(done);
        }

        if let Some(asset) = self.lifecycle.active_mut() {
            self.playback.advance(dt, &mut asset.scene, &asset.rig);
            asset.scene.update_world_matrices();
        }
    }

    // ========================================================================
    // Transport
    // ========================================================================

    pub fn play(&mut self) {
        self.playback.play();
    }

    pub fn pause(&mut self) {
        self.playback.pause();
    }

    /// Stops at time 0 and returns the avatar to its rest pose.
    pub fn stop(&mut self) {
        self.playback.stop();
        if let Some(asset) = self.lifecycle.active_mut() {
            asset.rig.reset_to_rest(&mut asset.scene);
            asset.scene.update_world_matrices();
        }
    }

    pub fn seek(&mut self, time: f32) {
        self.playback.seek(time);
        self.refresh_pose();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    #[must_use]
    pub fn playback(&self) -> &PlaybackDriver {
        &self.playback
    }

    #[must_use]
    pub fn lifecycle(&self) -> &AssetLifecycle {
        &self.lifecycle
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn active_avatar(&self) -> Option<&AvatarAsset> {
        self.lifecycle.active()
    }

    #[must_use]
    pub fn active_scene(&self) -> Option<&SceneGraph> {
        self.lifecycle.active_scene()
    }

    /// The retargeted clip currently loaded into playback.
    #[must_use]
    pub fn current_clip(&self) -> Option<&Arc<HumanoidClip>> {
        self.playback.clip()
    }

    /// Events since the last call.
    pub fn drain_events(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.events)
    }
}

fn bind_motion(
    motion: &LoadedMotion,
    schema: &HumanoidSchema,
    settings: &ViewerSettings,
) -> std::result::Result<(Arc<HumanoidClip>, Arc<RetargetBinding>), RetargetError> {
    let convention = settings
        .retarget
        .convention
        .or_else(|| RigConvention::detect(&motion.skeleton))
        .ok_or(RetargetError::NoMappableBones)?;

    let binding = RetargetBinding::build_with(
        &motion.skeleton,
        schema,
        &convention,
        settings.retarget.align_facing,
    )?;
    let clip = retarget_clip(&motion.clip, &binding);
    Ok((Arc::new(clip), Arc::new(binding)))
}

#[cfg(feature = "gltf")]
fn default_avatar_parser() -> Option<Arc<dyn AssetParser>> {
    Some(Arc::new(crate::assets::loaders::GltfAvatarParser::new()))
}

#[cfg(not(feature = "gltf"))]
fn default_avatar_parser() -> Option<Arc<dyn AssetParser>> {
    None
}
