use super::{mlp_forward, MlpConfig};
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::{linear, Linear, VarBuilder};

/// Returns vector of linear modules from [`MlpConfig`].
fn create_linear_layers(prefix: &str, vs: VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let mut dims = vec![config.in_dim];
    dims.extend(config.units.iter());
    dims.push(config.out_dim);
    let vs = vs.pp(prefix);

    dims.windows(2)
        .enumerate()
        .map(|(i, pair)| Ok(linear(pair[0], pair[1], vs.pp(format!("ln{}", i)))?))
        .collect()
}

/// Multilayer perceptron with tanh activation function.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    layers: Vec<Linear>,
}

impl Mlp {
    /// Builds an MLP under the given variable-name prefix.
    pub fn build(prefix: &str, vs: VarBuilder, config: MlpConfig) -> Result<Self> {
        let device = vs.device().clone();
        let layers = create_linear_layers(prefix, vs, &config)?;

        Ok(Self {
            config,
            device,
            layers,
        })
    }

    /// Applies the network to a `(batch, in_dim)` input.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = xs.to_device(&self.device)?;
        mlp_forward(xs, &self.layers, &self.config.activation_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Activation;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn output_shape() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = MlpConfig::new(4, vec![64, 64], 2, Activation::None);
        let mlp = Mlp::build("pi", vb, config)?;

        let xs = Tensor::zeros((5, 4), DType::F32, &Device::Cpu)?;
        let ys = mlp.forward(&xs)?;
        assert_eq!(ys.dims(), &[5, 2]);
        Ok(())
    }

    #[test]
    fn no_hidden_layers() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = MlpConfig::new(3, vec![], 1, Activation::None);
        let mlp = Mlp::build("v", vb, config)?;

        let xs = Tensor::zeros((2, 3), DType::F32, &Device::Cpu)?;
        assert_eq!(mlp.forward(&xs)?.dims(), &[2, 1]);
        Ok(())
    }

    #[test]
    fn tanh_output_is_bounded() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = MlpConfig::new(4, vec![8], 2, Activation::Tanh);
        let mlp = Mlp::build("pi", vb, config)?;

        let xs = Tensor::ones((1, 4), DType::F32, &Device::Cpu)?;
        let ys = mlp.forward(&xs)?.abs()?.max(1)?.to_vec1::<f32>()?;
        assert!(ys[0] <= 1.0);
        Ok(())
    }

    #[test]
    fn final_weight_name_matches_layer_count() {
        let config = MlpConfig::new(4, vec![64, 64], 2, Activation::None);
        assert_eq!(super::super::final_linear_weight_name("pi", &config), "pi.ln2.weight");
    }
}
