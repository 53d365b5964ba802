#![warn(missing_docs)]
//! Backend-independent building blocks for trust-region policy optimization.
//!
//! This crate provides the pieces of a TRPO agent that do not depend on a
//! tensor backend:
//!
//! - [`replay_buffer`]: a fixed-capacity FIFO experience store with uniform
//!   random batch sampling and binary persistence.
//! - [`spaces`]: descriptions of observation and action spaces, used by the
//!   network crates to select the policy parameterization.
//! - [`error`]: typed errors shared across the workspace.
//!
//! Network implementations live in the `trpo-candle-agent` crate.
pub mod error;
pub mod replay_buffer;
pub mod spaces;

pub use error::TrpoError;
pub use spaces::{ActionSpace, ObsSpace};
