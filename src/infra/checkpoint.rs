// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's
// NamedMpkGzFileRecorder (half precision),
// and owns the best-checkpoint decision: the manager monitors
// validation loss (mode: min) and writes the best-checkpoint
// file only when the loss improves on the minimum seen so far.
// The final save at the end of training is unconditional.
//
// What gets written:
//   checkpoints/best_model.mpk.gz  ← best weights so far
//                                    (conditional, per epoch)
//   best_model.mpk.gz              ← final weights
//                                    (unconditional, end of run)
//   architecture.json              ← topology used, so a saved
//                                    model can be rebuilt
//   classes.json                   ← class names in label order
//
// Paths are configured without extension — the recorder appends
// .mpk.gz itself.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{HalfPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};

use crate::ml::model::{ImageClassifier, ModelArchitecture};

/// Manages the conditional best checkpoint and the unconditional
/// final save.
pub struct CheckpointManager {
    /// Best-checkpoint stem (conditional, per epoch)
    best_path: PathBuf,

    /// Final model stem (unconditional, end of training)
    final_path: PathBuf,

    /// Minimum validation loss seen so far. Starts at infinity so
    /// the first finite loss always checkpoints; NaN never does.
    best_val_loss: f64,
}

impl CheckpointManager {
    /// Create a new CheckpointManager. Creates the parent
    /// directories of both paths if they don't already exist.
    pub fn new(best_path: impl Into<PathBuf>, final_path: impl Into<PathBuf>) -> Self {
        let best_path  = best_path.into();
        let final_path = final_path.into();

        for path in [&best_path, &final_path] {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).ok();
                }
            }
        }

        Self {
            best_path,
            final_path,
            best_val_loss: f64::INFINITY,
        }
    }

    /// Monitor one epoch's validation loss and checkpoint iff it
    /// improved on the minimum seen so far. Returns whether the
    /// checkpoint was written.
    pub fn save_if_improved<B: AutodiffBackend>(
        &mut self,
        val_loss: f64,
        model: &ImageClassifier<B>,
    ) -> Result<bool> {
        if !(val_loss < self.best_val_loss) {
            return Ok(false);
        }

        NamedMpkGzFileRecorder::<HalfPrecisionSettings>::new()
            .record(model.clone().into_record(), self.best_path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", self.best_path.display())
            })?;

        tracing::debug!(
            "val_loss improved from {:.6} to {:.6}, checkpoint saved",
            self.best_val_loss,
            val_loss,
        );
        self.best_val_loss = val_loss;
        Ok(true)
    }

    /// Save the final model state unconditionally.
    pub fn save_final<B: Backend>(&self, model: &ImageClassifier<B>) -> Result<()> {
        NamedMpkGzFileRecorder::<HalfPrecisionSettings>::new()
            .record(model.clone().into_record(), self.final_path.clone())
            .with_context(|| {
                format!("Failed to save final model to '{}'", self.final_path.display())
            })?;

        tracing::debug!("Saved final model to '{}'", self.final_path.display());
        Ok(())
    }

    /// Load weights from the final save into a freshly built
    /// model. The architecture must match the saved record.
    pub fn load_final<B: Backend>(
        &self,
        model:  ImageClassifier<B>,
        device: &B::Device,
    ) -> Result<ImageClassifier<B>> {
        let record = NamedMpkGzFileRecorder::<HalfPrecisionSettings>::new()
            .load(self.final_path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load model '{}'. Have you trained the model first?",
                    self.final_path.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    /// Save the topology next to the final model so it can be
    /// rebuilt for later inference.
    pub fn save_architecture(&self, architecture: &ModelArchitecture) -> Result<()> {
        let path = self.side_file("architecture.json");
        let json = serde_json::to_string_pretty(architecture)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write architecture to '{}'", path.display()))?;

        tracing::debug!("Saved architecture to '{}'", path.display());
        Ok(())
    }

    /// Save the class names in label order.
    pub fn save_classes(&self, classes: &[String]) -> Result<()> {
        let path = self.side_file("classes.json");
        let json = serde_json::to_string_pretty(classes)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write class manifest to '{}'", path.display()))?;

        tracing::debug!("Saved {} class names to '{}'", classes.len(), path.display());
        Ok(())
    }

    /// Minimum validation loss seen so far, if any epoch improved.
    pub fn best_val_loss(&self) -> Option<f64> {
        if self.best_val_loss.is_finite() {
            Some(self.best_val_loss)
        } else {
            None
        }
    }

    /// Path the recorder will actually write the best checkpoint
    /// to (the configured stem plus the recorder's extension).
    pub fn best_file(&self) -> PathBuf {
        with_recorder_extension(&self.best_path)
    }

    pub fn final_file(&self) -> PathBuf {
        with_recorder_extension(&self.final_path)
    }

    fn side_file(&self, name: &str) -> PathBuf {
        match self.final_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
            _ => PathBuf::from(name),
        }
    }
}

/// NamedMpkGzFileRecorder writes `<stem>.mpk.gz`.
fn with_recorder_extension(stem: &PathBuf) -> PathBuf {
    let mut s = stem.clone().into_os_string();
    s.push(".mpk.gz");
    PathBuf::from(s)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use crate::ml::model::ModelArchitecture;

    type B = Autodiff<NdArray>;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vvp-ckpt-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn tiny_arch() -> ModelArchitecture {
        serde_json::from_str(
            r#"{
                "input": { "height": 4, "width": 4, "channels": 1 },
                "conv_blocks": [ { "filters": 2 } ],
                "dense_units": 3,
                "num_classes": 2
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_best_checkpoint_written_only_on_improvement() {
        let dir = temp_dir("best");
        let mut manager =
            CheckpointManager::new(dir.join("checkpoints/best_model"), dir.join("best_model"));

        let device = Default::default();
        let model = tiny_arch().init::<B>(&device);

        // First finite loss always improves on infinity
        assert!(manager.save_if_improved(0.9, &model).unwrap());
        assert!(manager.best_file().exists());

        // Equal and worse losses must not rewrite the checkpoint
        fs::remove_file(manager.best_file()).unwrap();
        assert!(!manager.save_if_improved(0.9, &model).unwrap());
        assert!(!manager.save_if_improved(1.4, &model).unwrap());
        assert!(!manager.best_file().exists());

        // A lower loss writes again and moves the minimum
        assert!(manager.save_if_improved(0.5, &model).unwrap());
        assert!(manager.best_file().exists());
        assert_eq!(manager.best_val_loss(), Some(0.5));
    }

    #[test]
    fn test_nan_loss_never_checkpoints() {
        let dir = temp_dir("nan");
        let mut manager =
            CheckpointManager::new(dir.join("checkpoints/best_model"), dir.join("best_model"));

        let device = Default::default();
        let model = tiny_arch().init::<B>(&device);

        assert!(!manager.save_if_improved(f64::NAN, &model).unwrap());
        assert!(!manager.best_file().exists());
        assert_eq!(manager.best_val_loss(), None);
    }

    #[test]
    fn test_final_save_and_load_roundtrip() {
        let dir = temp_dir("final");
        let manager =
            CheckpointManager::new(dir.join("checkpoints/best_model"), dir.join("best_model"));

        let device = Default::default();
        let arch = tiny_arch();
        let model = arch.init::<B>(&device);

        manager.save_final(&model).unwrap();
        assert!(manager.final_file().exists());

        let restored = manager.load_final(arch.init::<B>(&device), &device);
        assert!(restored.is_ok());
    }

    #[test]
    fn test_side_files() {
        let dir = temp_dir("side");
        let manager =
            CheckpointManager::new(dir.join("checkpoints/best_model"), dir.join("best_model"));

        manager.save_architecture(&tiny_arch()).unwrap();
        manager.save_classes(&["cat".into(), "dog".into()]).unwrap();

        assert!(dir.join("architecture.json").exists());
        let manifest = fs::read_to_string(dir.join("classes.json")).unwrap();
        assert!(manifest.contains("cat") && manifest.contains("dog"));
    }
}
