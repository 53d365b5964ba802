//! Convolutional feature extractor for image observations.
mod base;
mod config;
pub use base::Cnn;
pub use config::{default_conv_layers, CnnConfig, ConvLayerConfig};
