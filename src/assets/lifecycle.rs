use slotmap::{SlotMap, new_key_type};

use crate::assets::avatar::AvatarAsset;
use crate::errors::{Error, Result, RetargetError};
use crate::humanoid::HumanoidSchema;
use crate::scene::SceneGraph;

new_key_type! {
    pub struct AvatarHandle;
}

/// Hooks into the external render pipeline.
///
/// On a swap the old asset is always disposed before the new one is
/// attached, so a backend never holds two avatars at once.
pub trait RenderBackend {
    fn attach_asset(&mut self, handle: AvatarHandle, asset: &AvatarAsset);
    fn dispose_asset(&mut self, handle: AvatarHandle);
}

/// Backend without a renderer. Tracks the attached handle and logs.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    attached: Option<AvatarHandle>,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn attached(&self) -> Option<AvatarHandle> {
        self.attached
    }
}

impl RenderBackend for HeadlessBackend {
    fn attach_asset(&mut self, handle: AvatarHandle, asset: &AvatarAsset) {
        log::debug!(
            "Headless attach '{}' ({} nodes, {} meshes)",
            asset.name,
            asset.scene.len(),
            asset.resources.meshes
        );
        self.attached = Some(handle);
    }

    fn dispose_asset(&mut self, handle: AvatarHandle) {
        log::debug!("Headless dispose {handle:?}");
        if self.attached == Some(handle) {
            self.attached = None;
        }
    }
}

/// Result of [`AssetLifecycle::swap_asset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The handle was already active; nothing happened.
    Unchanged,
    /// A new avatar is active. `humanoid` tells whether it can play
    /// humanoid motion.
    Swapped { humanoid: bool },
}

/// Owns loaded avatars and decides which one is live.
///
/// At most one avatar is active. Swapping disposes and drops the previous
/// one, so memory does not grow with repeated loads.
#[derive(Debug, Default)]
pub struct AssetLifecycle {
    assets: SlotMap<AvatarHandle, AvatarAsset>,
    active: Option<AvatarHandle>,
}

impl AssetLifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a loaded avatar without activating it.
    pub fn insert(&mut self, asset: AvatarAsset) -> AvatarHandle {
        self.assets.insert(asset)
    }

    /// Makes `handle` the active avatar.
    ///
    /// Activating the already active handle is a no-op. An unknown handle is
    /// an error and leaves everything as it was.
    pub fn swap_asset(
        &mut self,
        handle: AvatarHandle,
        backend: &mut dyn RenderBackend,
    ) -> Result<SwapOutcome> {
        if self.active == Some(handle) {
            return Ok(SwapOutcome::Unchanged);
        }
        if !self.assets.contains_key(handle) {
            return Err(Error::AssetNotFound(format!("{handle:?}")));
        }

        if let Some(old) = self.active.take() {
            backend.dispose_asset(old);
            if let Some(asset) = self.assets.remove(old) {
                log::info!("Disposed avatar '{}'", asset.name);
            }
        }

        let asset = &self.assets[handle];
        backend.attach_asset(handle, asset);
        self.active = Some(handle);
        log::info!("Active avatar is now '{}'", asset.name);

        Ok(SwapOutcome::Swapped {
            humanoid: asset.is_humanoid(),
        })
    }

    /// Removes an avatar. Disposes it first when it is the active one.
    pub fn unload(&mut self, handle: AvatarHandle, backend: &mut dyn RenderBackend) -> bool {
        if self.active == Some(handle) {
            backend.dispose_asset(handle);
            self.active = None;
        }
        self.assets.remove(handle).is_some()
    }

    #[must_use]
    pub fn get(&self, handle: AvatarHandle) -> Option<&AvatarAsset> {
        self.assets.get(handle)
    }

    #[must_use]
    pub fn active_handle(&self) -> Option<AvatarHandle> {
        self.active
    }

    #[must_use]
    pub fn active(&self) -> Option<&AvatarAsset> {
        self.active.and_then(|h| self.assets.get(h))
    }

    pub fn active_mut(&mut self) -> Option<&mut AvatarAsset> {
        self.active.and_then(|h| self.assets.get_mut(h))
    }

    #[must_use]
    pub fn active_scene(&self) -> Option<&SceneGraph> {
        self.active().map(|a| &a.scene)
    }

    pub fn active_scene_mut(&mut self) -> Option<&mut SceneGraph> {
        self.active_mut().map(|a| &mut a.scene)
    }

    /// Schema of the active avatar. `None` when nothing is active.
    #[must_use]
    pub fn active_schema(&self) -> Option<std::result::Result<&HumanoidSchema, RetargetError>> {
        self.active().map(AvatarAsset::schema)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
