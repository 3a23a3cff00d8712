//! Runtime adapters implementing the pool's execution seams.

pub mod blocking;
pub mod tokio_spawner;

pub use blocking::TokioBlocking;
pub use tokio_spawner::TokioSpawner;
