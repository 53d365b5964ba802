//! Actor-critic composition with a frozen policy snapshot.
//!
//! [`ActorCritic`] owns the live policy, a snapshot of it ("old policy")
//! used exclusively for the trust-region KL constraint, and the value
//! network. The snapshot is synchronized only through an explicit
//! [`ActorCritic::sync_snapshot`] call; the training loop is expected to
//! invoke it at the start of every trust-region iteration.
mod base;
mod config;
pub use base::ActorCritic;
pub use config::ActorCriticConfig;
