//! Value networks.
//!
//! A critic maps observations to scalar value estimates. The CNN variant
//! owns its own convolution stack; no weights are shared with the actor.
use crate::{
    cnn::{Cnn, CnnConfig, ConvLayerConfig},
    mlp::{Mlp, MlpConfig},
    Activation,
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use trpo_core::ObsSpace;

/// MLP value network.
pub struct MlpCritic {
    v: Mlp,
}

impl MlpCritic {
    /// Builds the value network for `obs_dim` observations.
    pub fn build(
        varmap: &VarMap,
        device: &Device,
        obs_dim: usize,
        units: &[usize],
    ) -> Result<Self> {
        let vb = VarBuilder::from_varmap(varmap, DType::F32, device);
        let config = MlpConfig::new(obs_dim, units.to_vec(), 1, Activation::None);
        let v = Mlp::build("v", vb, config)?;
        Ok(Self { v })
    }
}

/// CNN value network for image observations.
pub struct CnnCritic {
    conv: Cnn,
    head: Mlp,
}

impl CnnCritic {
    /// Builds the convolution stack and the value head.
    pub fn build(
        varmap: &VarMap,
        device: &Device,
        cnn_config: &CnnConfig,
        units: &[usize],
    ) -> Result<Self> {
        let vb = VarBuilder::from_varmap(varmap, DType::F32, device);
        let conv = Cnn::build("v_cnn", vb.clone(), cnn_config)?;
        let config = MlpConfig::new(conv.flat_dim(), units.to_vec(), 1, Activation::None);
        let head = Mlp::build("v", vb, config)?;
        Ok(Self { conv, head })
    }
}

/// A value network with either backbone.
pub enum Critic {
    /// MLP backbone for vector observations.
    Mlp(MlpCritic),

    /// CNN backbone for image observations.
    Cnn(CnnCritic),
}

impl Critic {
    /// Builds the critic variant matching the observation space.
    pub fn build(
        varmap: &VarMap,
        device: &Device,
        obs_space: &ObsSpace,
        units: &[usize],
        conv_layers: &[ConvLayerConfig],
    ) -> Result<Self> {
        match obs_space {
            ObsSpace::Vector { dim } => {
                Ok(Self::Mlp(MlpCritic::build(varmap, device, *dim, units)?))
            }
            ObsSpace::Image {
                channels,
                height,
                width,
            } => {
                let cnn_config = CnnConfig::new(*channels, *height, *width, conv_layers.to_vec());
                Ok(Self::Cnn(CnnCritic::build(
                    varmap,
                    device,
                    &cnn_config,
                    units,
                )?))
            }
        }
    }

    /// Returns one value estimate per observation, shape `(batch,)`.
    pub fn forward_t(&self, obs: &Tensor, train: bool) -> Result<Tensor> {
        let v = match self {
            Self::Mlp(critic) => critic.v.forward(obs)?,
            Self::Cnn(critic) => {
                let features = critic.conv.forward_t(obs, train)?;
                critic.head.forward(&features)?
            }
        };
        Ok(v.squeeze(D::Minus1)?)
    }
}
