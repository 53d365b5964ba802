use anyhow::Result;
use serde::{Deserialize, Serialize};
use trpo_core::TrpoError;

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// One convolution layer of the stack.
pub struct ConvLayerConfig {
    /// Number of output channels.
    pub out_channels: usize,

    /// Square kernel size.
    pub kernel: usize,

    /// Stride in both spatial dimensions.
    pub stride: usize,
}

impl ConvLayerConfig {
    /// Creates a layer description.
    pub fn new(out_channels: usize, kernel: usize, stride: usize) -> Self {
        Self {
            out_channels,
            kernel,
            stride,
        }
    }
}

/// Returns the default convolution stack, the architecture of the DQN paper.
pub fn default_conv_layers() -> Vec<ConvLayerConfig> {
    vec![
        ConvLayerConfig::new(32, 8, 4),
        ConvLayerConfig::new(64, 4, 2),
        ConvLayerConfig::new(64, 3, 1),
    ]
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Cnn`](super::Cnn).
pub struct CnnConfig {
    pub(super) in_channels: usize,
    pub(super) height: usize,
    pub(super) width: usize,
    pub(super) conv_layers: Vec<ConvLayerConfig>,
}

impl CnnConfig {
    /// Creates configuration of a CNN for `(in_channels, height, width)`
    /// observations.
    pub fn new(
        in_channels: usize,
        height: usize,
        width: usize,
        conv_layers: Vec<ConvLayerConfig>,
    ) -> Self {
        Self {
            in_channels,
            height,
            width,
            conv_layers,
        }
    }

    /// Computes the width of the flattened feature vector after the whole
    /// convolution stack.
    ///
    /// The spatial output of each layer is `(d - kernel) / stride + 1` (no
    /// padding, no dilation). Stacks that exhaust the spatial dimensions are
    /// rejected, so a dimension mismatch surfaces at construction instead of
    /// deep inside a forward pass.
    pub fn flat_dim(&self) -> Result<usize> {
        let mut h = self.height;
        let mut w = self.width;
        let mut channels = self.in_channels;

        for (i, layer) in self.conv_layers.iter().enumerate() {
            if layer.kernel > h || layer.kernel > w {
                return Err(TrpoError::ShapeMismatch(format!(
                    "conv layer {}: kernel {} exceeds input size {}x{}",
                    i, layer.kernel, h, w
                ))
                .into());
            }
            if layer.stride == 0 {
                return Err(
                    TrpoError::ShapeMismatch(format!("conv layer {}: stride is zero", i)).into(),
                );
            }
            h = (h - layer.kernel) / layer.stride + 1;
            w = (w - layer.kernel) / layer.stride + 1;
            channels = layer.out_channels;
        }

        Ok(channels * h * w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dqn_stack_on_84x84() -> Result<()> {
        // 84 -> 20 -> 9 -> 7; 64 * 7 * 7 = 3136.
        let config = CnnConfig::new(4, 84, 84, default_conv_layers());
        assert_eq!(config.flat_dim()?, 3136);
        Ok(())
    }

    #[test]
    fn small_stack() -> Result<()> {
        // 16 -> 7 -> 3; 16 * 3 * 3 = 144.
        let layers = vec![ConvLayerConfig::new(8, 3, 2), ConvLayerConfig::new(16, 3, 2)];
        let config = CnnConfig::new(3, 16, 16, layers);
        assert_eq!(config.flat_dim()?, 144);
        Ok(())
    }

    #[test]
    fn exhausted_spatial_dims_rejected() {
        let config = CnnConfig::new(3, 8, 8, default_conv_layers());
        assert!(config.flat_dim().is_err());
    }
}
