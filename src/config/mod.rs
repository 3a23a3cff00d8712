//! Configuration models for pools and shutdown behavior.

pub mod pool;

pub use pool::{CloseOptions, PoolConfig, PoolsConfig};
