use super::ActorCriticConfig;
use crate::{actor::Actor, critic::Critic, dist::Dist, util::copy_params};
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::VarMap;
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use std::path::Path;
use trpo_core::{ActionSpace, ObsSpace, TrpoError};

/// Actor-critic network family with a frozen policy snapshot.
///
/// Holds three independently parameterized networks:
///
/// - `pi`: the live policy, updated by the external optimizer through
///   [`ActorCritic::pi_varmap`],
/// - `pi_old`: the policy snapshot, written only by
///   [`ActorCritic::sync_snapshot`] and read only by the KL constraint,
/// - `v`: the value network.
///
/// All operations are synchronous; parameter mutation by the external
/// optimizer must not interleave with in-flight `step` calls.
pub struct ActorCritic {
    obs_space: ObsSpace,
    action_space: ActionSpace,
    device: Device,
    pi: Actor,
    pi_varmap: VarMap,
    pi_old: Actor,
    pi_old_varmap: VarMap,
    v: Critic,
    v_varmap: VarMap,
    rng: StdRng,
}

impl ActorCritic {
    /// Builds the actor-critic for the given spaces.
    ///
    /// The policy variant is selected from the space descriptions: vector
    /// vs. image observations choose the backbone, discrete vs. continuous
    /// actions choose the distribution family. The live policy and the
    /// snapshot are two independently initialized networks; call
    /// [`ActorCritic::sync_snapshot`] before the first KL evaluation.
    pub fn build(
        config: &ActorCriticConfig,
        obs_space: ObsSpace,
        action_space: ActionSpace,
    ) -> Result<Self> {
        action_space.validate()?;
        let device = config.device.into_device()?;

        let pi_varmap = VarMap::new();
        let pi = Actor::build(
            &pi_varmap,
            &device,
            &obs_space,
            &action_space,
            &config.pi_units,
            &config.conv_layers,
        )?;

        let pi_old_varmap = VarMap::new();
        let pi_old = Actor::build(
            &pi_old_varmap,
            &device,
            &obs_space,
            &action_space,
            &config.pi_units,
            &config.conv_layers,
        )?;

        let v_varmap = VarMap::new();
        let v = Critic::build(
            &v_varmap,
            &device,
            &obs_space,
            &config.v_units,
            &config.conv_layers,
        )?;

        info!(
            "Build actor-critic for {:?} observations and {:?} actions",
            obs_space, action_space
        );

        Ok(Self {
            obs_space,
            action_space,
            device,
            pi,
            pi_varmap,
            pi_old,
            pi_old_varmap,
            v,
            v_varmap,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Promotes an unbatched observation to a batch of one and validates the
    /// per-observation shape.
    fn batch_obs(&self, obs: &Tensor) -> Result<Tensor> {
        let expected: Vec<usize> = match &self.obs_space {
            ObsSpace::Vector { dim } => vec![*dim],
            ObsSpace::Image {
                channels,
                height,
                width,
            } => vec![*channels, *height, *width],
        };

        let obs = if obs.dims() == expected.as_slice() {
            obs.unsqueeze(0)?
        } else {
            obs.clone()
        };

        let dims = obs.dims();
        if dims.len() != expected.len() + 1 || dims[1..] != expected[..] {
            return Err(TrpoError::ShapeMismatch(format!(
                "expected observations of shape {:?}, got {:?}",
                expected, dims
            ))
            .into());
        }
        Ok(obs)
    }

    /// Runs both networks in inference mode and samples one action per
    /// observation.
    ///
    /// Accepts a batch of observations or a single unbatched one (a bare
    /// vector or a single image), which is promoted to a batch of one.
    /// Returns the actions (the index as a single element for discrete
    /// spaces, the action vector for continuous ones), the value estimates
    /// and the log-probabilities of the sampled actions, one entry per
    /// observation.
    pub fn step(&mut self, obs: &Tensor) -> Result<(Vec<Vec<f32>>, Vec<f32>, Vec<f32>)> {
        let obs = self.batch_obs(obs)?;

        let dist = self.pi.distribution_t(&obs, false)?;
        let act = dist.sample(&mut self.rng)?;
        let logp = dist.log_prob(&act)?.detach().to_vec1::<f32>()?;
        let value = self.v.forward_t(&obs, false)?.detach().to_vec1::<f32>()?;

        let action = match &dist {
            Dist::Categorical { .. } => act
                .to_vec1::<u32>()?
                .into_iter()
                .map(|a| vec![a as f32])
                .collect(),
            Dist::Gaussian { .. } => act.to_vec2::<f32>()?,
        };

        Ok((action, value, logp))
    }

    /// Samples actions, discarding the values and log-probabilities.
    pub fn act(&mut self, obs: &Tensor) -> Result<Vec<Vec<f32>>> {
        Ok(self.step(obs)?.0)
    }

    /// Copies the live policy parameters into the snapshot.
    ///
    /// The training loop calls this at the start of each trust-region
    /// iteration; the crate never synchronizes implicitly.
    pub fn sync_snapshot(&self) -> Result<()> {
        copy_params(&self.pi_old_varmap, &self.pi_varmap)
    }

    /// KL divergence `D(snapshot ‖ live)` on the given observation batch.
    ///
    /// The snapshot side is detached; gradient flows only through the live
    /// policy.
    pub fn kl_divergence(&self, obs: &Tensor) -> Result<Tensor> {
        self.pi_old.kl_divergence(&self.pi, obs)
    }

    /// The live policy.
    pub fn pi(&self) -> &Actor {
        &self.pi
    }

    /// The policy snapshot.
    pub fn pi_old(&self) -> &Actor {
        &self.pi_old
    }

    /// The value network.
    pub fn critic(&self) -> &Critic {
        &self.v
    }

    /// Variables of the live policy, for the external optimizer.
    pub fn pi_varmap(&self) -> &VarMap {
        &self.pi_varmap
    }

    /// Variables of the value network, for the external optimizer.
    pub fn v_varmap(&self) -> &VarMap {
        &self.v_varmap
    }

    /// The action space this actor-critic was built for.
    pub fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    /// The observation space this actor-critic was built for.
    pub fn obs_space(&self) -> &ObsSpace {
        &self.obs_space
    }

    /// The device the networks are placed on.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Saves all network parameters into the given directory.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        self.pi_varmap.save(dir.join("pi.safetensors"))?;
        self.pi_old_varmap.save(dir.join("pi_old.safetensors"))?;
        self.v_varmap.save(dir.join("v.safetensors"))?;
        info!("Save actor-critic to {:?}", dir);
        Ok(())
    }

    /// Loads network parameters saved with [`ActorCritic::save`].
    pub fn load(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        self.pi_varmap.load(dir.join("pi.safetensors"))?;
        self.pi_old_varmap.load(dir.join("pi_old.safetensors"))?;
        self.v_varmap.load(dir.join("v.safetensors"))?;
        info!("Load actor-critic from {:?}", dir);
        Ok(())
    }
}
