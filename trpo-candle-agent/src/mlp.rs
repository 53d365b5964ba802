//! Multilayer perceptron with tanh hidden activations.
mod base;
mod config;
use crate::Activation;
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::{Linear, Module};
pub use base::Mlp;
pub use config::MlpConfig;

fn mlp_forward(xs: Tensor, layers: &[Linear], final_act: &Activation) -> Result<Tensor> {
    let n_layers = layers.len();
    let mut xs = xs;

    for layer in layers.iter().take(n_layers - 1) {
        xs = layer.forward(&xs)?.tanh()?;
    }

    let xs = layers[n_layers - 1].forward(&xs)?;
    final_act.forward(&xs)
}

/// Returns the varmap key of the output layer's weight tensor.
///
/// Used to rescale the policy head after initialization.
pub fn final_linear_weight_name(prefix: &str, config: &MlpConfig) -> String {
    format!("{}.ln{}.weight", prefix, config.units.len())
}
