use crate::{
    cnn::{default_conv_layers, ConvLayerConfig},
    Device,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`ActorCritic`](super::ActorCritic).
pub struct ActorCriticConfig {
    /// Hidden layer sizes of the policy networks.
    pub pi_units: Vec<usize>,

    /// Hidden layer sizes of the value network.
    pub v_units: Vec<usize>,

    /// Convolution stack for image observations. Ignored for vector
    /// observations.
    pub conv_layers: Vec<ConvLayerConfig>,

    /// Random seed for action sampling.
    pub seed: u64,

    /// Device the networks are placed on.
    pub device: Device,
}

impl Default for ActorCriticConfig {
    fn default() -> Self {
        Self {
            pi_units: vec![64, 64],
            v_units: vec![256, 256],
            conv_layers: default_conv_layers(),
            seed: 42,
            device: Device::Cpu,
        }
    }
}

impl ActorCriticConfig {
    /// Sets the hidden layer sizes of the policy networks.
    pub fn pi_units(mut self, v: Vec<usize>) -> Self {
        self.pi_units = v;
        self
    }

    /// Sets the hidden layer sizes of the value network.
    pub fn v_units(mut self, v: Vec<usize>) -> Self {
        self.v_units = v;
        self
    }

    /// Sets the convolution stack for image observations.
    pub fn conv_layers(mut self, v: Vec<ConvLayerConfig>) -> Self {
        self.conv_layers = v;
        self
    }

    /// Sets the random seed for action sampling.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Constructs [`ActorCriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ActorCriticConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
