//! Fixed-capacity experience replay buffer.
//!
//! This module provides a FIFO replay buffer for storing transitions and
//! sampling uniformly random batches from them:
//!
//! - [`ReplayBuffer`]: the bounded FIFO store itself
//! - [`Transition`]: one recorded experience tuple
//! - [`TransitionBatch`]: a structure-of-arrays batch of sampled transitions
//! - [`ReplayBufferConfig`]: capacity and random seed
//!
//! When the buffer is full, the oldest transition is overwritten. Sampling
//! draws distinct indices uniformly at random over the stored range, so a
//! batch never contains the same underlying transition twice.
mod base;
mod batch;
mod config;
pub use base::ReplayBuffer;
pub use batch::{Transition, TransitionBatch};
pub use config::ReplayBufferConfig;
