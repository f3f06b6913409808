//! Headless mocap player.
//!
//! Loads an avatar and a motion file in the background, plays the motion for
//! one pass and prints where the avatar's hips go.
//!
//! ```text
//! cargo run -p mocap_player -- avatar.vrm walk.bvh [settings.json]
//! RUST_LOG=rigmotion=debug cargo run -p mocap_player -- ...
//! ```

use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use glam::Vec3;
use rigmotion::{AvatarViewer, HumanoidBone, ViewerEvent, ViewerSettings};

const FRAME_TIME: f32 = 1.0 / 30.0;
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let (Some(avatar), Some(motion)) = (args.next(), args.next()) else {
        bail!("usage: mocap_player <avatar.vrm|.glb> <motion.bvh> [settings.json]");
    };
    let settings = match args.next() {
        Some(path) => ViewerSettings::from_file(&path)
            .with_context(|| format!("reading settings from {path}"))?,
        None => ViewerSettings::default(),
    };

    let mut viewer = AvatarViewer::headless(settings);
    viewer.load_file(&avatar).with_context(|| format!("loading {avatar}"))?;
    viewer.load_file(&motion).with_context(|| format!("loading {motion}"))?;

    wait_for_loads(&mut viewer)?;

    let Some(clip) = viewer.current_clip().cloned() else {
        bail!("motion did not bind to the avatar");
    };
    log::info!("Playing '{}' ({:.2}s)", clip.name, clip.duration);
    viewer.play();

    let frames = (clip.duration / FRAME_TIME).ceil() as usize;
    for frame in 0..=frames {
        viewer.update(FRAME_TIME);
        if frame % 30 == 0 {
            println!(
                "t={:6.2}s  hips={:?}",
                viewer.playback().elapsed(),
                hips_position(&viewer)
            );
        }
    }
    Ok(())
}

/// Ticks the viewer until both loads have landed (or one failed).
fn wait_for_loads(viewer: &mut AvatarViewer) -> anyhow::Result<()> {
    let started = Instant::now();
    let (mut avatar, mut motion) = (false, false);

    while !(avatar && motion) {
        if started.elapsed() > LOAD_TIMEOUT {
            bail!("timed out waiting for loads");
        }
        viewer.update(0.0);
        for event in viewer.drain_events() {
            match event {
                ViewerEvent::AvatarLoaded { name, humanoid } => {
                    log::info!("Avatar '{name}' loaded (humanoid: {humanoid})");
                    avatar = true;
                }
                ViewerEvent::MotionLoaded {
                    name,
                    bound,
                    unmapped,
                } => {
                    log::info!("Motion '{name}': {bound} bones bound");
                    if !unmapped.is_empty() {
                        log::warn!("Unmapped source bones: {}", unmapped.join(", "));
                    }
                    motion = true;
                }
                ViewerEvent::MotionUnbound { reason } => bail!("motion unbound: {reason}"),
                ViewerEvent::LoadFailed { ticket, error } => {
                    bail!("failed to load '{}': {error}", ticket.name)
                }
                ViewerEvent::LoadDiscarded { ticket } => {
                    log::debug!("Discarded stale load '{}'", ticket.name);
                }
            }
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    Ok(())
}

fn hips_position(viewer: &AvatarViewer) -> Option<Vec3> {
    let avatar = viewer.active_avatar()?;
    let node = avatar.rig.node(HumanoidBone::Hips)?;
    let world = avatar.scene.get_node(node)?.world_matrix().translation;
    Some(world.into())
}
