// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
// Key Burn 0.16 insight:
//   - Training uses TrainBackend (Autodiff<NdArray>) for gradients
//   - model.valid() returns the model on EvalBackend (NdArray)
//   - Validation batcher must also use EvalBackend
//   - argmax(1) returns [batch,1] so we flatten before .equal()
//
// Reference: Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::data::{batcher::ImageBatcher, dataset::ImageDataset};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::config::PipelineConfig;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{ImageClassifier, ModelArchitecture};

type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
type EvalBackend  = burn::backend::NdArray;

/// Summary of a finished training run.
#[derive(Debug)]
pub struct TrainingReport {
    /// Epochs actually run (equals the configured count)
    pub epochs_completed: usize,

    /// Learning rate handed to the optimizer, unchanged
    pub learning_rate: f64,

    /// Per-epoch metrics in epoch order
    pub history: Vec<EpochMetrics>,

    /// Lowest validation loss seen, None if every epoch was NaN
    pub best_val_loss: Option<f64>,
}

pub fn run_training(
    cfg:           &PipelineConfig,
    architecture:  &ModelArchitecture,
    train_dataset: ImageDataset,
    val_dataset:   ImageDataset,
    ckpt_manager:  CheckpointManager,
    metrics:       MetricsLogger,
) -> Result<TrainingReport> {
    let device = burn::backend::ndarray::NdArrayDevice::default();
    tracing::info!("Using NdArray device: {:?}", device);
    train_loop(cfg, architecture, train_dataset, val_dataset, ckpt_manager, metrics, device)
}

fn train_loop(
    cfg:              &PipelineConfig,
    architecture:     &ModelArchitecture,
    train_dataset:    ImageDataset,
    val_dataset:      ImageDataset,
    mut ckpt_manager: CheckpointManager,
    metrics:          MetricsLogger,
    device:           burn::backend::ndarray::NdArrayDevice,
) -> Result<TrainingReport> {
    let lr     = cfg.optimizer.learning_rate;
    let epochs = cfg.training.epochs;

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: ImageClassifier<TrainBackend> = architecture.init(&device);
    tracing::info!(
        "Model ready: {} conv blocks, {} classes",
        architecture.conv_blocks.len(),
        architecture.num_classes,
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    // ── Training data loader (AutodiffBackend, augmentation on) ───────────────
    let train_batcher = ImageBatcher::<TrainBackend>::for_training(
        device.clone(),
        architecture.input.channels,
        architecture.input.height,
        architecture.input.width,
    );
    let train_loader = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.training.batch_size)
        .shuffle(42)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend, augmentation off) ───────────────
    let val_batcher = ImageBatcher::<EvalBackend>::for_validation(
        device.clone(),
        architecture.input.channels,
        architecture.input.height,
        architecture.input.width,
    );
    let val_loader = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.training.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let mut history = Vec::with_capacity(epochs);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(batch.images, batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        // model.valid() → ImageClassifier<EvalBackend>
        // dropout disabled for deterministic evaluation
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut correct      = 0usize;
        let mut total        = 0usize;

        for batch in val_loader.iter() {
            let logits = model_valid.forward(batch.images);

            let ce = burn::nn::loss::CrossEntropyLossConfig::new()
                .init(&logits.device());
            let batch_loss: f64 = ce
                .forward(logits.clone(), batch.targets.clone())
                .into_scalar()
                .elem::<f64>();
            val_loss_sum += batch_loss;
            val_batches  += 1;

            // argmax(1) returns shape [batch, 1] — flatten to [batch]
            // before comparing with targets which is [batch]
            let predicted = logits.argmax(1).flatten::<1>(0, 1);

            total += batch.targets.dims()[0];
            let batch_correct: i64 = predicted
                .equal(batch.targets)
                .int().sum().into_scalar().elem::<i64>();
            correct += batch_correct as usize;
        }

        let avg_val_loss = if val_batches > 0 { val_loss_sum / val_batches as f64 } else { f64::NAN };
        let val_accuracy = if total > 0 { correct as f64 / total as f64 } else { 0.0 };

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.1}%",
            epoch, epochs, avg_train_loss, avg_val_loss, val_accuracy * 100.0,
        );

        let m = EpochMetrics::new(epoch, avg_train_loss, avg_val_loss, val_accuracy);
        metrics.log(&m)?;

        if ckpt_manager.save_if_improved(avg_val_loss, &model)? {
            tracing::info!("Validation loss improved, checkpoint saved for epoch {}", epoch);
        }

        history.push(m);
    }

    // The final model is saved whether or not the last epoch improved.
    ckpt_manager.save_final(&model)?;
    tracing::info!("Training complete, final model saved.");

    Ok(TrainingReport {
        epochs_completed: history.len(),
        learning_rate:    lr,
        history,
        best_val_loss:    ckpt_manager.best_val_loss(),
    })
}
