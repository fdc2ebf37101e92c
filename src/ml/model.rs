// ============================================================
// Layer 5 — Classifier Model
// ============================================================
// The model topology is not hard-coded: it is deserialized from
// models/model_architecture.json and instantiated as a stack of
// convolution blocks (Conv2d → ReLU → MaxPool2d) followed by a
// dense classifier head. The JSON document is the single source
// of truth for input dimensions, block shapes, and class count.

use std::path::Path;

use anyhow::{bail, Context, Result};
use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        PaddingConfig2d, Relu,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

// ─── Architecture document ────────────────────────────────────────────────────

/// Input dimensions every image is resized to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputShape {
    pub height:   usize,
    pub width:    usize,
    pub channels: usize,
}

/// One convolution block: Conv2d (same padding) → ReLU →
/// 2x2 max pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvBlockSpec {
    pub filters: usize,

    #[serde(default = "default_kernel_size")]
    pub kernel_size: usize,
}

/// The deserialized model topology.
///
/// No validation is applied beyond what deserialization itself
/// enforces; a topology that cannot be instantiated fails when
/// the model is built or first run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArchitecture {
    pub input: InputShape,

    pub conv_blocks: Vec<ConvBlockSpec>,

    /// Width of the hidden dense layer between the flattened
    /// features and the class logits
    pub dense_units: usize,

    #[serde(default = "default_dropout")]
    pub dropout: f64,

    pub num_classes: usize,
}

fn default_kernel_size() -> usize {
    3
}

fn default_dropout() -> f64 {
    0.5
}

impl ModelArchitecture {
    /// Read the architecture document. A missing file is fatal
    /// and logged distinctly so this failure is recognizable in
    /// the log; malformed JSON fails through the deserializer.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::error!("Model architecture file not found.");
            bail!("model architecture file not found: '{}'", path.display());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read architecture file '{}'", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Cannot parse architecture file '{}'", path.display()))
    }

    /// Instantiate the topology on the given device.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ImageClassifier<B> {
        let mut blocks = Vec::new();
        let mut in_channels = self.input.channels;
        let mut height = self.input.height;
        let mut width  = self.input.width;

        for spec in &self.conv_blocks {
            let k = spec.kernel_size;
            let conv = Conv2dConfig::new([in_channels, spec.filters], [k, k])
                .with_padding(PaddingConfig2d::Same)
                .init(device);
            blocks.push(ConvBlock {
                conv,
                pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
                activation: Relu::new(),
            });
            in_channels = spec.filters;
            // Same-padded conv keeps H/W; the 2x2 pool halves them
            height /= 2;
            width /= 2;
        }

        let feature_dim = in_channels * height * width;

        ImageClassifier {
            blocks,
            fc1:        LinearConfig::new(feature_dim, self.dense_units).init(device),
            dropout:    DropoutConfig::new(self.dropout).init(),
            fc2:        LinearConfig::new(self.dense_units, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}

// ─── Modules ──────────────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv:       Conv2d<B>,
    pub pool:       MaxPool2d,
    pub activation: Relu,
}

impl<B: Backend> ConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.pool.forward(self.activation.forward(self.conv.forward(x)))
    }
}

#[derive(Module, Debug)]
pub struct ImageClassifier<B: Backend> {
    pub blocks:     Vec<ConvBlock<B>>,
    pub fc1:        Linear<B>,
    pub dropout:    Dropout,
    pub fc2:        Linear<B>,
    pub activation: Relu,
}

impl<B: Backend> ImageClassifier<B> {
    /// images: [batch, channels, height, width] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = images;
        for block in &self.blocks {
            x = block.forward(x);
        }
        let x = x.flatten::<2>(1, 3);
        let x = self.activation.forward(self.fc1.forward(x));
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }

    /// Forward pass plus the training loss (cross-entropy over
    /// integer class labels).
    pub fn forward_loss(
        &self,
        images:  Tensor<B, 4>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>)
    where
        B: AutodiffBackend,
    {
        let logits = self.forward(images);
        let ce = burn::nn::loss::CrossEntropyLossConfig::new().init(&logits.device());
        let loss = ce.forward(logits.clone(), targets);
        (loss, logits)
    }
}
