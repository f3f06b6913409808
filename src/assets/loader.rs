//! Asynchronous load queue.
//!
//! Every load request takes a ticket carrying the next generation number of
//! its kind. Work runs off-thread and reports back over a channel; the owner
//! drains the channel once per tick and applies results in arrival order.
//! A result whose generation is not newer than the last applied one of the
//! same kind is stale and must be discarded, so a slow early request can
//! never overwrite a newer one.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crate::assets::avatar::{AssetParser, MotionParser, ParsedAvatar, ParsedMotion};
use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadKind {
    Avatar,
    Motion,
}

impl LoadKind {
    const fn index(self) -> usize {
        match self {
            LoadKind::Avatar => 0,
            LoadKind::Motion => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub kind: LoadKind,
    pub generation: u64,
    /// Display name (usually the file name).
    pub name: String,
}

#[derive(Debug)]
pub enum LoadPayload {
    Avatar(Result<ParsedAvatar>),
    Motion(Result<ParsedMotion>),
}

#[derive(Debug)]
pub struct CompletedLoad {
    pub ticket: LoadTicket,
    pub payload: LoadPayload,
}

pub struct LoadQueue {
    tx: flume::Sender<CompletedLoad>,
    rx: flume::Receiver<CompletedLoad>,
    issued: [u64; 2],
    applied: [u64; 2],
}

impl Default for LoadQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            tx,
            rx,
            issued: [0; 2],
            applied: [0; 2],
        }
    }

    /// Issues the next ticket of `kind`.
    pub fn begin(&mut self, kind: LoadKind, name: impl Into<String>) -> LoadTicket {
        let slot = &mut self.issued[kind.index()];
        *slot += 1;
        LoadTicket {
            kind,
            generation: *slot,
            name: name.into(),
        }
    }

    /// Whether a newer (or the same) load of this kind was already applied.
    #[must_use]
    pub fn is_stale(&self, ticket: &LoadTicket) -> bool {
        ticket.generation <= self.applied[ticket.kind.index()]
    }

    /// Records that `ticket`'s result is now live. Older tickets of the same
    /// kind become stale.
    pub fn mark_applied(&mut self, ticket: &LoadTicket) {
        let slot = &mut self.applied[ticket.kind.index()];
        *slot = (*slot).max(ticket.generation);
    }

    /// Generation of the last applied load of `kind` (0 if none).
    #[must_use]
    pub fn applied_generation(&self, kind: LoadKind) -> u64 {
        self.applied[kind.index()]
    }

    /// A sender for custom producers. Results must carry a ticket from
    /// [`Self::begin`].
    #[must_use]
    pub fn sender(&self) -> flume::Sender<CompletedLoad> {
        self.tx.clone()
    }

    /// Completed loads received since the last call, in arrival order.
    /// Never blocks.
    pub fn drain(&self) -> Vec<CompletedLoad> {
        self.rx.try_iter().collect()
    }

    /// Runs `future` on a worker thread and queues its avatar result.
    pub fn spawn_avatar<F>(&mut self, name: impl Into<String>, future: F) -> LoadTicket
    where
        F: Future<Output = Result<ParsedAvatar>> + Send + 'static,
    {
        let ticket = self.begin(LoadKind::Avatar, name);
        self.spawn(ticket.clone(), async move { LoadPayload::Avatar(future.await) });
        ticket
    }

    /// Runs `future` on a worker thread and queues its motion result.
    pub fn spawn_motion<F>(&mut self, name: impl Into<String>, future: F) -> LoadTicket
    where
        F: Future<Output = Result<ParsedMotion>> + Send + 'static,
    {
        let ticket = self.begin(LoadKind::Motion, name);
        self.spawn(ticket.clone(), async move { LoadPayload::Motion(future.await) });
        ticket
    }

    fn spawn<F>(&self, ticket: LoadTicket, future: F)
    where
        F: Future<Output = LoadPayload> + Send + 'static,
    {
        let tx = self.tx.clone();
        let name = ticket.name.clone();
        let spawned = thread::Builder::new()
            .name(format!("load-{name}"))
            .spawn(move || {
                let payload = futures::executor::block_on(future);
                // The receiver only disappears with the queue itself.
                let _ = tx.send(CompletedLoad { ticket, payload });
            });
        if let Err(err) = spawned {
            log::error!("Failed to spawn loader thread for '{name}': {err}");
        }
    }
}

/// Reads and parses an avatar file; for use with [`LoadQueue::spawn_avatar`].
pub async fn read_avatar(path: PathBuf, parser: Arc<dyn AssetParser>) -> Result<ParsedAvatar> {
    let bytes = std::fs::read(&path)?;
    let mut parsed = parser.parse(&bytes)?;
    if parsed.name.is_empty() {
        parsed.name = file_name(&path);
    }
    Ok(parsed)
}

/// Reads and parses a motion file; for use with [`LoadQueue::spawn_motion`].
pub async fn read_motion(path: PathBuf, parser: Arc<dyn MotionParser>) -> Result<ParsedMotion> {
    let bytes = std::fs::read(&path)?;
    let mut parsed = parser.parse(&bytes)?;
    if parsed.clip.name.is_empty() {
        parsed.clip.name = file_name(&path);
    }
    Ok(parsed)
}

pub(crate) fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

impl std::fmt::Debug for LoadQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadQueue")
            .field("issued", &self.issued)
            .field("applied", &self.applied)
            .field("pending", &self.rx.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    #[test]
    fn generations_are_per_kind() {
        let mut queue = LoadQueue::new();
        let a1 = queue.begin(LoadKind::Avatar, "a");
        let m1 = queue.begin(LoadKind::Motion, "m");
        let a2 = queue.begin(LoadKind::Avatar, "b");
        assert_eq!((a1.generation, m1.generation, a2.generation), (1, 1, 2));

        queue.mark_applied(&a2);
        assert!(queue.is_stale(&a1));
        assert!(queue.is_stale(&a2));
        assert!(!queue.is_stale(&m1));
    }

    #[test]
    fn spawned_error_is_delivered() {
        let mut queue = LoadQueue::new();
        let ticket = queue.spawn_motion("missing.bvh", async {
            Err(Error::UnsupportedFileType("x".into()))
        });
        let done = queue.rx.recv().ok();
        let done = done.map(|c| (c.ticket, matches!(c.payload, LoadPayload::Motion(Err(_)))));
        assert_eq!(done, Some((ticket, true)));
    }
}
