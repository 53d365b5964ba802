use super::CnnConfig;
use anyhow::Result;
use candle_core::{Device, ModuleT, Tensor};
use candle_nn::{
    batch_norm, conv2d, conv::Conv2dConfig, BatchNorm, BatchNormConfig, Conv2d, Module, VarBuilder,
};

/// Convolutional feature extractor.
///
/// Each layer applies convolution, tanh and batch normalization; the output
/// is flattened to `(batch, flat_dim)`. The flattened width is derived in
/// closed form from the configuration at build time, never probed with a
/// dummy forward pass.
pub struct Cnn {
    device: Device,
    convs: Vec<Conv2d>,
    norms: Vec<BatchNorm>,
    flat_dim: usize,
}

impl Cnn {
    fn stride(s: usize) -> Conv2dConfig {
        Conv2dConfig {
            stride: s,
            ..Default::default()
        }
    }

    /// Builds the convolution stack under the given variable-name prefix.
    ///
    /// Fails if the configured stack exhausts the spatial dimensions of the
    /// configured observation shape.
    pub fn build(prefix: &str, vs: VarBuilder, config: &CnnConfig) -> Result<Self> {
        let flat_dim = config.flat_dim()?;
        let device = vs.device().clone();
        let vs = vs.pp(prefix);

        let mut convs = Vec::with_capacity(config.conv_layers.len());
        let mut norms = Vec::with_capacity(config.conv_layers.len());
        let mut in_channels = config.in_channels;
        for (i, layer) in config.conv_layers.iter().enumerate() {
            convs.push(conv2d(
                in_channels,
                layer.out_channels,
                layer.kernel,
                Self::stride(layer.stride),
                vs.pp(format!("c{}", i)),
            )?);
            norms.push(batch_norm(
                layer.out_channels,
                BatchNormConfig::default(),
                vs.pp(format!("bn{}", i)),
            )?);
            in_channels = layer.out_channels;
        }

        Ok(Self {
            device,
            convs,
            norms,
            flat_dim,
        })
    }

    /// Width of the flattened feature vector.
    pub fn flat_dim(&self) -> usize {
        self.flat_dim
    }

    /// Applies the stack to a `(batch, channels, height, width)` input.
    ///
    /// `train` selects batch-statistics vs. running-statistics normalization.
    pub fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let mut xs = xs.to_device(&self.device)?;
        for (conv, norm) in self.convs.iter().zip(self.norms.iter()) {
            xs = conv.forward(&xs)?.tanh()?;
            xs = norm.forward_t(&xs, train)?;
        }
        Ok(xs.flatten_from(1)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnn::ConvLayerConfig;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    fn small_config() -> CnnConfig {
        CnnConfig::new(
            3,
            16,
            16,
            vec![ConvLayerConfig::new(8, 3, 2), ConvLayerConfig::new(16, 3, 2)],
        )
    }

    #[test]
    fn forward_shape_matches_flat_dim() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let cnn = Cnn::build("cnn", vb, &small_config())?;

        let xs = Tensor::zeros((2, 3, 16, 16), DType::F32, &Device::Cpu)?;
        let ys = cnn.forward_t(&xs, false)?;
        assert_eq!(ys.dims(), &[2, cnn.flat_dim()]);
        assert_eq!(cnn.flat_dim(), 144);
        Ok(())
    }

    #[test]
    fn invalid_stack_fails_at_build() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = CnnConfig::new(3, 4, 4, vec![ConvLayerConfig::new(8, 8, 4)]);
        assert!(Cnn::build("cnn", vb, &config).is_err());
    }
}
