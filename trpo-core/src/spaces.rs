//! Observation and action space descriptions.
//!
//! These mirror the metadata an environment exposes about its interface and
//! are what the network crates use to choose a policy parameterization:
//! a [`ActionSpace::Discrete`] space selects a categorical policy, a
//! [`ActionSpace::Box`] space a diagonal Gaussian one.
use crate::TrpoError;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Shape of the observations an environment produces.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum ObsSpace {
    /// Fixed-length numeric vector.
    Vector {
        /// Number of elements of the observation vector.
        dim: usize,
    },

    /// 3-D image tensor in channels-first layout.
    Image {
        /// Number of channels.
        channels: usize,
        /// Image height in pixels.
        height: usize,
        /// Image width in pixels.
        width: usize,
    },
}

impl ObsSpace {
    /// Returns the total number of elements of one observation.
    pub fn numel(&self) -> usize {
        match self {
            Self::Vector { dim } => *dim,
            Self::Image {
                channels,
                height,
                width,
            } => channels * height * width,
        }
    }
}

/// Description of the actions an environment accepts.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum ActionSpace {
    /// Finite set of `n` symbols.
    Discrete {
        /// Number of available actions.
        n: usize,
    },

    /// Bounded continuous vector with elementwise bounds.
    Box {
        /// Lower bound per action dimension.
        low: Vec<f32>,
        /// Upper bound per action dimension.
        high: Vec<f32>,
    },
}

impl ActionSpace {
    /// Returns the dimensionality of the action parameterization: the number
    /// of symbols for discrete spaces, the vector length for continuous ones.
    pub fn dim(&self) -> usize {
        match self {
            Self::Discrete { n } => *n,
            Self::Box { low, .. } => low.len(),
        }
    }

    /// Rejects degenerate spaces that no policy can be built for.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Discrete { n } => {
                if *n == 0 {
                    return Err(TrpoError::UnsupportedActionSpace(
                        "discrete space with zero actions".into(),
                    )
                    .into());
                }
            }
            Self::Box { low, high } => {
                if low.is_empty() {
                    return Err(TrpoError::UnsupportedActionSpace(
                        "continuous space with zero dimensions".into(),
                    )
                    .into());
                }
                if low.len() != high.len() {
                    return Err(TrpoError::UnsupportedActionSpace(format!(
                        "bounds of different lengths: {} and {}",
                        low.len(),
                        high.len()
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_dims() {
        assert_eq!(ActionSpace::Discrete { n: 4 }.dim(), 4);
        let b = ActionSpace::Box {
            low: vec![-1.0, -1.0],
            high: vec![1.0, 1.0],
        };
        assert_eq!(b.dim(), 2);
        assert!(b.validate().is_ok());
    }

    #[test]
    fn degenerate_spaces_rejected() {
        assert!(ActionSpace::Discrete { n: 0 }.validate().is_err());
        let b = ActionSpace::Box {
            low: vec![-1.0],
            high: vec![1.0, 1.0],
        };
        assert!(b.validate().is_err());
    }

    #[test]
    fn obs_numel() {
        assert_eq!(ObsSpace::Vector { dim: 8 }.numel(), 8);
        let img = ObsSpace::Image {
            channels: 3,
            height: 16,
            width: 16,
        };
        assert_eq!(img.numel(), 768);
    }
}
