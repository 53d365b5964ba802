//! Actor-critic networks for TRPO, implemented with [candle](https://crates.io/crates/candle-core).
//!
//! The policy family spans four parameterizations, selected once at
//! construction from the observation and action space descriptions of
//! [`trpo_core::spaces`]:
//!
//! | backbone | discrete actions | continuous actions |
//! |----------|------------------|--------------------|
//! | MLP      | [`actor::MlpCategoricalActor`] | [`actor::MlpGaussianActor`] |
//! | CNN      | [`actor::CnnCategoricalActor`] | [`actor::CnnGaussianActor`] |
//!
//! [`actor_critic::ActorCritic`] composes a live policy, a frozen snapshot of
//! it used for the trust-region KL constraint, and a value network. Gradient
//! updates are the responsibility of an external optimizer working on the
//! exposed variable maps; this crate never mutates parameters except through
//! [`actor_critic::ActorCritic::sync_snapshot`] and parameter loading.
pub mod actor;
pub mod actor_critic;
pub mod cnn;
pub mod critic;
pub mod dist;
pub mod mlp;
pub mod util;

use anyhow::Result;
use candle_core::Tensor;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl From<candle_core::Device> for Device {
    fn from(device: candle_core::Device) -> Self {
        match device {
            candle_core::Device::Cpu => Self::Cpu,
            _ => unimplemented!(),
        }
    }
}

impl Device {
    /// Converts into a [`candle_core::Device`].
    pub fn into_device(self) -> Result<candle_core::Device> {
        match self {
            Self::Cpu => Ok(candle_core::Device::Cpu),
            Self::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Activation applied by the output layer of an MLP.
pub enum Activation {
    /// No activation, raw linear output.
    None,

    /// Hyperbolic tangent.
    Tanh,
}

impl Activation {
    /// Applies the activation.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        match self {
            Self::None => Ok(xs.clone()),
            Self::Tanh => Ok(xs.tanh()?),
        }
    }
}
