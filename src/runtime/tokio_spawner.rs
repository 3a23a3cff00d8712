//! Tokio-backed cancellable worker spawning.

use std::future::Future;

use crate::core::{CancelHandle, Spawn};

/// Spawner creating workers as tokio tasks, cancellable via abort.
///
/// By default spawns on the ambient runtime; [`TokioSpawner::on`] pins
/// spawning to an explicit runtime handle.
#[derive(Clone, Default)]
pub struct TokioSpawner {
    handle: Option<tokio::runtime::Handle>,
}

impl TokioSpawner {
    /// Spawn on whatever runtime the calling task runs in.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn on the given runtime handle.
    #[must_use]
    pub fn on(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }
}

impl Spawn for TokioSpawner {
    type Handle = tokio::task::JoinHandle<()>;

    fn spawn<F>(&self, fut: F) -> Self::Handle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match &self.handle {
            Some(handle) => handle.spawn(fut),
            None => tokio::spawn(fut),
        }
    }
}

impl CancelHandle for tokio::task::JoinHandle<()> {
    fn cancel(&self) {
        self.abort();
    }

    fn is_finished(&self) -> bool {
        tokio::task::JoinHandle::is_finished(self)
    }
}
