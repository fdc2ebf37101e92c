// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the training half of the pipeline in order:
//
//   Step 1: Load training images      (Layer 4 - data)
//   Step 2: Load validation images    (Layer 4 - data)
//   Step 3: Consistency checks        (here)
//   Step 4: Checkpoints and metrics   (Layer 6 - infra)
//   Step 5: Build Burn datasets       (Layer 4 - data)
//   Step 6: Run training loop         (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{dataset::ImageDataset, loader::ImageFolderLoader};
use crate::domain::traits::ImageSource;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::model::ModelArchitecture;
use crate::ml::trainer::{run_training, TrainingReport};
use crate::infra::config::PipelineConfig;

// ─── Training Settings ────────────────────────────────────────────────────────
// Where the image feeds live and where trained artifacts go.
// Hyperparameters come from the PipelineConfig instead; these are
// only the filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainSettings {
    pub train_dir:  String,
    pub val_dir:    String,
    pub models_dir: String,
}

impl Default for TrainSettings {
    fn default() -> Self {
        Self {
            train_dir:  "datasets/train".to_string(),
            val_dir:    "datasets/validation".to_string(),
            models_dir: "models".to_string(),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the settings and runs the training pipeline end to end.
pub struct TrainUseCase {
    settings: TrainSettings,
}

impl TrainUseCase {
    pub fn new(settings: TrainSettings) -> Self {
        Self { settings }
    }

    /// Execute the full training pipeline. Images are resized to the
    /// architecture's input shape, the training feed is augmented,
    /// and the best checkpoint tracks the minimum validation loss.
    pub fn execute(
        &self,
        cfg:          &PipelineConfig,
        architecture: &ModelArchitecture,
    ) -> Result<TrainingReport> {
        let s = &self.settings;

        let height   = architecture.input.height as u32;
        let width    = architecture.input.width as u32;
        let channels = architecture.input.channels as u32;

        // ── Step 1: Load the training feed ────────────────────────────────────
        tracing::info!("Loading training images from '{}'", s.train_dir);
        let train_folder =
            ImageFolderLoader::new(&s.train_dir, height, width, channels).load_all()?;
        if train_folder.is_empty() {
            bail!("no training images found under '{}'", s.train_dir);
        }

        // ── Step 2: Load the validation feed ──────────────────────────────────
        tracing::info!("Loading validation images from '{}'", s.val_dir);
        let val_folder =
            ImageFolderLoader::new(&s.val_dir, height, width, channels).load_all()?;
        if val_folder.is_empty() {
            bail!("no validation images found under '{}'", s.val_dir);
        }

        // ── Step 3: Consistency checks ────────────────────────────────────────
        // Labels index into the sorted class list, so both feeds must
        // agree on it and the architecture's head must match.
        if train_folder.classes != val_folder.classes {
            bail!(
                "train and validation feeds disagree on classes: {:?} vs {:?}",
                train_folder.classes,
                val_folder.classes,
            );
        }
        if train_folder.class_count() != architecture.num_classes {
            bail!(
                "architecture expects {} classes but the feeds provide {}",
                architecture.num_classes,
                train_folder.class_count(),
            );
        }

        // ── Step 4: Checkpoints, metrics, side artifacts ──────────────────────
        // The class manifest and architecture are saved next to the
        // final model so a later load can rebuild it.
        let models_dir   = Path::new(&s.models_dir);
        let ckpt_manager = CheckpointManager::new(
            models_dir.join("checkpoints").join("best_model"),
            models_dir.join("best_model"),
        );
        ckpt_manager.save_architecture(architecture)?;
        ckpt_manager.save_classes(&train_folder.classes)?;
        let metrics = MetricsLogger::new(models_dir)?;

        // ── Step 5: Build Burn datasets ───────────────────────────────────────
        let train_dataset = ImageDataset::new(train_folder.images);
        let val_dataset   = ImageDataset::new(val_folder.images);

        // ── Step 6: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, architecture, train_dataset, val_dataset, ckpt_manager, metrics)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::config::{
        DataSettings, OptimizerSettings, SpeechSettings, TrainingSettings,
    };
    use image::{Rgb, RgbImage};
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vvp-train-uc-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_class_tree(root: &Path, classes: &[&str], per_class: usize) {
        for (ci, class) in classes.iter().enumerate() {
            let class_dir = root.join(class);
            fs::create_dir_all(&class_dir).unwrap();
            for i in 0..per_class {
                let shade = (40 + 80 * ci) as u8;
                let img = RgbImage::from_pixel(8, 8, Rgb([shade, shade, shade]));
                img.save(class_dir.join(format!("img_{i}.png"))).unwrap();
            }
        }
    }

    fn tiny_architecture(num_classes: usize) -> ModelArchitecture {
        serde_json::from_str(&format!(
            r#"{{
                "input": {{ "height": 8, "width": 8, "channels": 3 }},
                "conv_blocks": [ {{ "filters": 2 }} ],
                "dense_units": 4,
                "num_classes": {num_classes}
            }}"#,
        ))
        .unwrap()
    }

    fn tiny_config() -> PipelineConfig {
        PipelineConfig {
            optimizer: OptimizerSettings { learning_rate: 0.01 },
            training:  TrainingSettings { epochs: 1, batch_size: 2 },
            data:      DataSettings::default(),
            speech:    SpeechSettings::default(),
        }
    }

    #[test]
    fn test_full_training_pass_writes_artifacts() {
        let dir = temp_dir("happy");
        write_class_tree(&dir.join("train"), &["cats", "dogs"], 2);
        write_class_tree(&dir.join("validation"), &["cats", "dogs"], 1);

        let settings = TrainSettings {
            train_dir:  dir.join("train").to_string_lossy().into_owned(),
            val_dir:    dir.join("validation").to_string_lossy().into_owned(),
            models_dir: dir.join("models").to_string_lossy().into_owned(),
        };

        let report = TrainUseCase::new(settings)
            .execute(&tiny_config(), &tiny_architecture(2))
            .unwrap();

        assert_eq!(report.epochs_completed, 1);
        assert_eq!(report.learning_rate, 0.01);

        let models = dir.join("models");
        assert!(models.join("best_model.mpk.gz").exists());
        assert!(models.join("checkpoints").join("best_model.mpk.gz").exists());
        assert!(models.join("metrics.csv").exists());
        assert!(models.join("architecture.json").exists());

        let classes: Vec<String> =
            serde_json::from_str(&fs::read_to_string(models.join("classes.json")).unwrap())
                .unwrap();
        assert_eq!(classes, vec!["cats".to_string(), "dogs".to_string()]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_class_count_mismatch_is_an_error() {
        let dir = temp_dir("mismatch");
        write_class_tree(&dir.join("train"), &["cats", "dogs"], 1);
        write_class_tree(&dir.join("validation"), &["cats", "dogs"], 1);

        let settings = TrainSettings {
            train_dir:  dir.join("train").to_string_lossy().into_owned(),
            val_dir:    dir.join("validation").to_string_lossy().into_owned(),
            models_dir: dir.join("models").to_string_lossy().into_owned(),
        };

        let err = TrainUseCase::new(settings)
            .execute(&tiny_config(), &tiny_architecture(3))
            .unwrap_err();
        assert!(err.to_string().contains("architecture expects 3 classes"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_empty_training_feed_is_an_error() {
        let dir = temp_dir("empty");
        fs::create_dir_all(dir.join("train")).unwrap();
        write_class_tree(&dir.join("validation"), &["cats"], 1);

        let settings = TrainSettings {
            train_dir:  dir.join("train").to_string_lossy().into_owned(),
            val_dir:    dir.join("validation").to_string_lossy().into_owned(),
            models_dir: dir.join("models").to_string_lossy().into_owned(),
        };

        let err = TrainUseCase::new(settings)
            .execute(&tiny_config(), &tiny_architecture(1))
            .unwrap_err();
        assert!(err.to_string().contains("no training images"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
