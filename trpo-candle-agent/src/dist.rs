//! Action distributions produced by the policy networks.
//!
//! A [`Dist`] holds the distribution parameters for one batch of
//! observations: raw logits for categorical policies, mean and standard
//! deviation for diagonal Gaussian ones. Sampling draws from an explicit
//! [`StdRng`] so that all randomness in the crate is seed-controlled.
//!
//! [`Dist::kl_divergence`] is the trust-region constraint: the closed-form
//! KL divergence `D(old ‖ new)` where the old distribution is a detached
//! snapshot and only the new one carries gradient.
use anyhow::Result;
use candle_core::{DType, Tensor, D};
use candle_nn::ops::{log_softmax, softmax};
use rand::{
    distributions::{Distribution as RandDistribution, WeightedIndex},
    rngs::StdRng,
    Rng,
};
use rand_distr::StandardNormal;
use trpo_core::TrpoError;

const LN_2PI: f64 = 1.8378770664093453;

/// Parametrized action distribution for a batch of observations.
#[derive(Debug, Clone)]
pub enum Dist {
    /// Categorical distribution over `(batch, n_actions)` unnormalized logits.
    Categorical {
        /// Raw network outputs.
        logits: Tensor,
    },

    /// Independent per-dimension normal distribution with a state-independent
    /// standard deviation.
    Gaussian {
        /// Per-observation mean, `(batch, act_dim)`.
        mean: Tensor,
        /// Shared standard deviation, `(act_dim,)`.
        std: Tensor,
    },
}

impl Dist {
    /// Samples one action per observation in the batch.
    ///
    /// Categorical samples are `(batch,)` action indices; Gaussian samples
    /// are `(batch, act_dim)` action vectors.
    pub fn sample(&self, rng: &mut StdRng) -> Result<Tensor> {
        match self {
            Self::Categorical { logits } => {
                let probs: Vec<Vec<f32>> = softmax(logits, D::Minus1)?.to_vec2()?;
                let mut actions = Vec::with_capacity(probs.len());
                for row in probs.iter() {
                    let dist = WeightedIndex::new(row)?;
                    actions.push(dist.sample(rng) as u32);
                }
                let n = actions.len();
                Ok(Tensor::from_vec(actions, (n,), logits.device())?)
            }
            Self::Gaussian { mean, std } => {
                let (b, d) = mean.dims2()?;
                let noise: Vec<f32> = (0..b * d).map(|_| rng.sample(StandardNormal)).collect();
                let z = Tensor::from_vec(noise, (b, d), mean.device())?;
                Ok((mean + z.broadcast_mul(std)?)?)
            }
        }
    }

    /// Log-probability the distribution assigns to the given actions.
    ///
    /// Categorical actions are `(batch,)` indices and the result is the
    /// plain categorical log-probability. Gaussian actions are
    /// `(batch, act_dim)` vectors and per-dimension log-densities are summed
    /// over the action axis. Either way the result is `(batch,)`.
    pub fn log_prob(&self, act: &Tensor) -> Result<Tensor> {
        match self {
            Self::Categorical { logits } => {
                let act = act.to_dtype(DType::U32)?;
                let log_probs = log_softmax(logits, D::Minus1)?;
                Ok(log_probs.gather(&act.unsqueeze(1)?, 1)?.squeeze(1)?)
            }
            Self::Gaussian { mean, std } => {
                let z = act.sub(mean)?.broadcast_div(std)?;
                let logp = ((z.sqr()? * -0.5)?.broadcast_sub(&std.log()?)? - 0.5 * LN_2PI)?;
                Ok(logp.sum(D::Minus1)?)
            }
        }
    }

    /// Returns the same distribution with parameters cut off from the
    /// gradient graph.
    pub fn detach(&self) -> Self {
        match self {
            Self::Categorical { logits } => Self::Categorical {
                logits: logits.detach(),
            },
            Self::Gaussian { mean, std } => Self::Gaussian {
                mean: mean.detach(),
                std: std.detach(),
            },
        }
    }

    /// Closed-form KL divergence `D(old ‖ new)`, averaged over the batch.
    ///
    /// `old` must be the detached snapshot; only `new` carries gradient.
    /// For categorical distributions this is
    /// `mean(Σ_a p_old(a) · log(p_old(a) / p_new(a)))`; for Gaussians the
    /// per-dimension analytic KL
    /// `log(σ_new/σ_old) + (σ_old² + (μ_old − μ_new)²)/(2σ_new²) − 0.5`,
    /// summed over action dimensions. Near-zero categorical probabilities
    /// are not clamped.
    pub fn kl_divergence(old: &Dist, new: &Dist) -> Result<Tensor> {
        match (old, new) {
            (Self::Categorical { logits: l0 }, Self::Categorical { logits: l1 }) => {
                let p0 = softmax(l0, D::Minus1)?;
                let p1 = softmax(l1, D::Minus1)?;
                let kl = p0.mul(&p0.div(&p1)?.log()?)?;
                Ok(kl.sum(D::Minus1)?.mean_all()?)
            }
            (
                Self::Gaussian {
                    mean: mu0,
                    std: std0,
                },
                Self::Gaussian {
                    mean: mu1,
                    std: std1,
                },
            ) => {
                let term = std1.div(std0)?.log()?;
                let num = mu0.sub(mu1)?.sqr()?.broadcast_add(&std0.sqr()?)?;
                let den = (std1.sqr()? * 2.0)?;
                let kl = (num.broadcast_div(&den)?.broadcast_add(&term)? - 0.5)?;
                Ok(kl.sum(D::Minus1)?.mean_all()?)
            }
            _ => Err(TrpoError::PolicyMismatch(
                "KL divergence requires distributions of the same kind".into(),
            )
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use rand::SeedableRng;

    fn categorical(probs: &[f32]) -> Result<Dist> {
        let logits: Vec<f32> = probs.iter().map(|p| p.ln()).collect();
        let n = logits.len();
        Ok(Dist::Categorical {
            logits: Tensor::from_vec(logits, (1, n), &Device::Cpu)?,
        })
    }

    fn gaussian(mean: &[f32], std: &[f32]) -> Result<Dist> {
        let d = mean.len();
        Ok(Dist::Gaussian {
            mean: Tensor::from_vec(mean.to_vec(), (1, d), &Device::Cpu)?,
            std: Tensor::from_vec(std.to_vec(), (d,), &Device::Cpu)?,
        })
    }

    #[test]
    fn categorical_log_prob_matches_log_softmax() -> Result<()> {
        let dist = categorical(&[0.2, 0.3, 0.5])?;
        let act = Tensor::from_vec(vec![2u32], (1,), &Device::Cpu)?;
        let logp = dist.log_prob(&act)?.to_vec1::<f32>()?;
        assert!((logp[0] - 0.5f32.ln()).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn gaussian_log_prob_standard_normal_at_mean() -> Result<()> {
        let dist = gaussian(&[0.0, 0.0], &[1.0, 1.0])?;
        let act = Tensor::zeros((1, 2), DType::F32, &Device::Cpu)?;
        let logp = dist.log_prob(&act)?.to_vec1::<f32>()?;
        // Two dimensions, each contributing -0.5 ln(2 pi).
        assert!((logp[0] - (-(LN_2PI as f32))).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn categorical_self_kl_is_zero() -> Result<()> {
        let dist = categorical(&[0.1, 0.6, 0.3])?;
        let kl = Dist::kl_divergence(&dist.detach(), &dist)?.to_scalar::<f32>()?;
        assert!(kl.abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn gaussian_self_kl_is_zero() -> Result<()> {
        let dist = gaussian(&[0.3, -0.7], &[0.5, 1.5])?;
        let kl = Dist::kl_divergence(&dist.detach(), &dist)?.to_scalar::<f32>()?;
        assert!(kl.abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn categorical_kl_known_value() -> Result<()> {
        let old = categorical(&[0.5, 0.5])?;
        let new = categorical(&[0.25, 0.75])?;
        let kl = Dist::kl_divergence(&old, &new)?.to_scalar::<f32>()?;
        let expected = 0.5 * (4.0f32 / 3.0).ln();
        assert!((kl - expected).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn gaussian_kl_known_value() -> Result<()> {
        // Unit-variance Gaussians one mean apart: KL = 0.5 per dimension.
        let old = gaussian(&[0.0], &[1.0])?;
        let new = gaussian(&[1.0], &[1.0])?;
        let kl = Dist::kl_divergence(&old, &new)?.to_scalar::<f32>()?;
        assert!((kl - 0.5).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn kl_between_kinds_fails() -> Result<()> {
        let c = categorical(&[0.5, 0.5])?;
        let g = gaussian(&[0.0], &[1.0])?;
        let err = Dist::kl_divergence(&c, &g).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrpoError>(),
            Some(TrpoError::PolicyMismatch(_))
        ));
        Ok(())
    }

    #[test]
    fn near_deterministic_categorical_samples_argmax() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(0);
        let dist = Dist::Categorical {
            logits: Tensor::from_vec(vec![20.0f32, -20.0, -20.0], (1, 3), &Device::Cpu)?,
        };
        for _ in 0..32 {
            let act = dist.sample(&mut rng)?.to_vec1::<u32>()?;
            assert_eq!(act[0], 0);
        }
        Ok(())
    }

    #[test]
    fn tight_gaussian_samples_near_mean() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(0);
        let dist = gaussian(&[2.0, -3.0], &[1e-4, 1e-4])?;
        let act = dist.sample(&mut rng)?.to_vec2::<f32>()?;
        assert!((act[0][0] - 2.0).abs() < 1e-2);
        assert!((act[0][1] + 3.0).abs() < 1e-2);
        Ok(())
    }

    #[test]
    fn sampled_actions_have_valid_log_probs() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let dist = categorical(&[0.2, 0.8])?;
        let act = dist.sample(&mut rng)?;
        let logp = dist.log_prob(&act)?.to_vec1::<f32>()?;
        assert!(logp[0].is_finite() && logp[0] < 0.0);
        Ok(())
    }
}
