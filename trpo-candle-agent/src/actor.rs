//! Policy networks.
//!
//! Four concrete parameterizations cover the cross product of
//! {MLP, CNN} backbones and {categorical, Gaussian} action distributions.
//! [`Actor`] is the tagged union over them; the variant is chosen once, at
//! construction, from the observation and action space descriptions.
//!
//! Every actor owns only the variables registered in the [`VarMap`] it was
//! built from, so two actors built from separate varmaps are independently
//! parameterized even when they share a configuration. That is how the live
//! policy and its frozen snapshot coexist.
use crate::{
    cnn::{Cnn, CnnConfig, ConvLayerConfig},
    dist::Dist,
    mlp::{self, Mlp, MlpConfig},
    util::scale_weight,
    Activation,
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{Init, VarBuilder, VarMap};
use trpo_core::{ActionSpace, ObsSpace};

/// Scale factor applied to the policy head weights after initialization.
const HEAD_WEIGHT_SCALE: f64 = 0.01;

/// Initial value of the Gaussian log standard deviation.
const LOG_STD_INIT: f64 = -0.5;

fn build_head(
    varmap: &VarMap,
    device: &Device,
    in_dim: usize,
    out_dim: usize,
    units: &[usize],
    activation_out: Activation,
) -> Result<Mlp> {
    let vb = VarBuilder::from_varmap(varmap, DType::F32, device);
    let config = MlpConfig::new(in_dim, units.to_vec(), out_dim, activation_out);
    let head = Mlp::build("pi", vb, config.clone())?;
    scale_weight(
        varmap,
        &mlp::final_linear_weight_name("pi", &config),
        HEAD_WEIGHT_SCALE,
    )?;
    Ok(head)
}

fn build_log_std(varmap: &VarMap, device: &Device, act_dim: usize) -> Result<Tensor> {
    let vb = VarBuilder::from_varmap(varmap, DType::F32, device);
    Ok(vb.get_with_hints((act_dim,), "log_std", Init::Const(LOG_STD_INIT))?)
}

/// MLP policy over a discrete action space.
pub struct MlpCategoricalActor {
    logits: Mlp,
}

impl MlpCategoricalActor {
    /// Builds the logits network for `obs_dim` observations and `act_dim` actions.
    pub fn build(
        varmap: &VarMap,
        device: &Device,
        obs_dim: usize,
        act_dim: usize,
        units: &[usize],
    ) -> Result<Self> {
        let logits = build_head(varmap, device, obs_dim, act_dim, units, Activation::None)?;
        Ok(Self { logits })
    }

    fn dist(&self, obs: &Tensor) -> Result<Dist> {
        Ok(Dist::Categorical {
            logits: self.logits.forward(obs)?,
        })
    }
}

/// MLP policy over a bounded continuous action space.
pub struct MlpGaussianActor {
    mu: Mlp,
    log_std: Tensor,
}

impl MlpGaussianActor {
    /// Builds the mean network and the learned log-std parameter.
    pub fn build(
        varmap: &VarMap,
        device: &Device,
        obs_dim: usize,
        act_dim: usize,
        units: &[usize],
    ) -> Result<Self> {
        let mu = build_head(varmap, device, obs_dim, act_dim, units, Activation::None)?;
        let log_std = build_log_std(varmap, device, act_dim)?;
        Ok(Self { mu, log_std })
    }

    fn dist(&self, obs: &Tensor) -> Result<Dist> {
        Ok(Dist::Gaussian {
            mean: self.mu.forward(obs)?,
            std: self.log_std.exp()?,
        })
    }
}

/// CNN policy over a discrete action space.
///
/// Image observations pass through the convolution stack, are flattened and
/// fed to a tanh-headed MLP producing the logits.
pub struct CnnCategoricalActor {
    conv: Cnn,
    head: Mlp,
}

impl CnnCategoricalActor {
    /// Builds the convolution stack and logits head.
    pub fn build(
        varmap: &VarMap,
        device: &Device,
        cnn_config: &CnnConfig,
        act_dim: usize,
        units: &[usize],
    ) -> Result<Self> {
        let vb = VarBuilder::from_varmap(varmap, DType::F32, device);
        let conv = Cnn::build("cnn", vb, cnn_config)?;
        let head = build_head(
            varmap,
            device,
            conv.flat_dim(),
            act_dim,
            units,
            Activation::Tanh,
        )?;
        Ok(Self { conv, head })
    }

    fn dist(&self, obs: &Tensor, train: bool) -> Result<Dist> {
        let features = self.conv.forward_t(obs, train)?;
        Ok(Dist::Categorical {
            logits: self.head.forward(&features)?,
        })
    }
}

/// CNN policy over a bounded continuous action space.
pub struct CnnGaussianActor {
    conv: Cnn,
    head: Mlp,
    log_std: Tensor,
}

impl CnnGaussianActor {
    /// Builds the convolution stack, mean head and log-std parameter.
    pub fn build(
        varmap: &VarMap,
        device: &Device,
        cnn_config: &CnnConfig,
        act_dim: usize,
        units: &[usize],
    ) -> Result<Self> {
        let vb = VarBuilder::from_varmap(varmap, DType::F32, device);
        let conv = Cnn::build("cnn", vb, cnn_config)?;
        let head = build_head(
            varmap,
            device,
            conv.flat_dim(),
            act_dim,
            units,
            Activation::Tanh,
        )?;
        let log_std = build_log_std(varmap, device, act_dim)?;
        Ok(Self {
            conv,
            head,
            log_std,
        })
    }

    fn dist(&self, obs: &Tensor, train: bool) -> Result<Dist> {
        let features = self.conv.forward_t(obs, train)?;
        Ok(Dist::Gaussian {
            mean: self.head.forward(&features)?,
            std: self.log_std.exp()?,
        })
    }
}

/// A policy network of any of the four supported parameterizations.
pub enum Actor {
    /// MLP backbone, categorical distribution.
    MlpCategorical(MlpCategoricalActor),

    /// MLP backbone, diagonal Gaussian distribution.
    MlpGaussian(MlpGaussianActor),

    /// CNN backbone, categorical distribution.
    CnnCategorical(CnnCategoricalActor),

    /// CNN backbone, diagonal Gaussian distribution.
    CnnGaussian(CnnGaussianActor),
}

impl Actor {
    /// Builds the actor variant matching the given spaces.
    ///
    /// Vector observations select the MLP backbone, image observations the
    /// CNN one; discrete action spaces select a categorical policy,
    /// continuous ones a Gaussian policy.
    pub fn build(
        varmap: &VarMap,
        device: &Device,
        obs_space: &ObsSpace,
        action_space: &ActionSpace,
        units: &[usize],
        conv_layers: &[ConvLayerConfig],
    ) -> Result<Self> {
        action_space.validate()?;
        let act_dim = action_space.dim();

        match obs_space {
            ObsSpace::Vector { dim } => match action_space {
                ActionSpace::Discrete { .. } => Ok(Self::MlpCategorical(
                    MlpCategoricalActor::build(varmap, device, *dim, act_dim, units)?,
                )),
                ActionSpace::Box { .. } => Ok(Self::MlpGaussian(MlpGaussianActor::build(
                    varmap, device, *dim, act_dim, units,
                )?)),
            },
            ObsSpace::Image {
                channels,
                height,
                width,
            } => {
                let cnn_config =
                    CnnConfig::new(*channels, *height, *width, conv_layers.to_vec());
                match action_space {
                    ActionSpace::Discrete { .. } => Ok(Self::CnnCategorical(
                        CnnCategoricalActor::build(varmap, device, &cnn_config, act_dim, units)?,
                    )),
                    ActionSpace::Box { .. } => Ok(Self::CnnGaussian(CnnGaussianActor::build(
                        varmap,
                        device,
                        &cnn_config,
                        act_dim,
                        units,
                    )?)),
                }
            }
        }
    }

    /// Produces the action distribution for a batch of observations.
    ///
    /// `train` selects batch-statistics normalization in the CNN backbone;
    /// MLP variants ignore it.
    pub fn distribution_t(&self, obs: &Tensor, train: bool) -> Result<Dist> {
        match self {
            Self::MlpCategorical(actor) => actor.dist(obs),
            Self::MlpGaussian(actor) => actor.dist(obs),
            Self::CnnCategorical(actor) => actor.dist(obs, train),
            Self::CnnGaussian(actor) => actor.dist(obs, train),
        }
    }

    /// Produces the action distribution and, when actions are given, their
    /// log-probabilities under it.
    pub fn forward(
        &self,
        obs: &Tensor,
        act: Option<&Tensor>,
        train: bool,
    ) -> Result<(Dist, Option<Tensor>)> {
        let dist = self.distribution_t(obs, train)?;
        let logp = match act {
            Some(act) => Some(dist.log_prob(act)?),
            None => None,
        };
        Ok((dist, logp))
    }

    /// KL divergence `D(self ‖ new)` on the given observation batch.
    ///
    /// `self` is treated as the frozen snapshot: its distribution parameters
    /// are detached, so gradient flows only through `new`. Both policies run
    /// in training mode, so CNN variants with synchronized parameters see
    /// identical batch statistics and diverge by exactly zero.
    pub fn kl_divergence(&self, new: &Actor, obs: &Tensor) -> Result<Tensor> {
        let d_old = self.distribution_t(obs, true)?.detach();
        let d_new = new.distribution_t(obs, true)?;
        Dist::kl_divergence(&d_old, &d_new)
    }
}
