// ============================================================
// Layer 4 — Image Folder Loader
// ============================================================
// Loads a class-per-subdirectory image tree using the image
// crate:
//
//   datasets/train/
//     ├── cat/   001.png, 002.jpg, ...
//     └── dog/   001.png, ...
//
// Subdirectory names become class names; the label of every
// image is its class's index in the sorted class list. Images
// are decoded, resized to the model input size with
// nearest-neighbour interpolation, rescaled by 1/255 and stored
// channel-major (CHW).

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use image::imageops::FilterType;

use crate::domain::image::{ImageFolder, LabeledImage};
use crate::domain::traits::ImageSource;

/// File extensions the loader accepts
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Loads every image under a class-per-subdirectory tree.
/// Implements the ImageSource trait from Layer 3.
pub struct ImageFolderLoader {
    /// The dataset root (one subdirectory per class)
    dir: PathBuf,

    /// Target size images are resized to
    height:   u32,
    width:    u32,
    channels: u32,
}

impl ImageFolderLoader {
    /// Create a loader for one dataset directory. The target size
    /// comes from the model architecture document.
    pub fn new(dir: impl Into<PathBuf>, height: u32, width: u32, channels: u32) -> Self {
        Self {
            dir: dir.into(),
            height,
            width,
            channels,
        }
    }
}

impl ImageSource for ImageFolderLoader {
    fn load_all(&self) -> Result<ImageFolder> {
        if self.channels != 1 && self.channels != 3 {
            bail!(
                "unsupported channel count {} (expected 1 or 3)",
                self.channels
            );
        }

        // One subdirectory per class, sorted so labels are stable
        // across runs and platforms
        let mut class_dirs: Vec<(String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read dataset directory '{}'", self.dir.display()))?
        {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                let name = entry.file_name().to_string_lossy().into_owned();
                class_dirs.push((name, path));
            }
        }
        class_dirs.sort_by(|a, b| a.0.cmp(&b.0));

        let classes: Vec<String> = class_dirs.iter().map(|(name, _)| name.clone()).collect();
        let mut images = Vec::new();

        for (label, (class_name, class_dir)) in class_dirs.iter().enumerate() {
            let mut files: Vec<PathBuf> = fs::read_dir(class_dir)
                .with_context(|| format!("Cannot read class directory '{}'", class_dir.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| is_image_file(path))
                .collect();
            files.sort();

            for path in files {
                match self.load_single_image(&path, label) {
                    Ok(img) => {
                        tracing::debug!("Loaded: {} (class '{}')", img.source, class_name);
                        images.push(img);
                    }
                    // Log a warning but continue — don't fail on one bad file
                    Err(e) => {
                        tracing::warn!("Skipping '{}': {}", path.display(), e);
                    }
                }
            }
        }

        tracing::info!(
            "Found {} images belonging to {} classes under '{}'",
            images.len(),
            classes.len(),
            self.dir.display()
        );

        Ok(ImageFolder::new(classes, images))
    }
}

impl ImageFolderLoader {
    /// Decode one file into a rescaled CHW LabeledImage.
    fn load_single_image(&self, path: &Path, label: usize) -> Result<LabeledImage> {
        let img = image::open(path)
            .with_context(|| format!("Cannot decode image '{}'", path.display()))?
            .resize_exact(self.width, self.height, FilterType::Nearest);

        let plane = (self.height * self.width) as usize;
        let channels = self.channels as usize;
        let mut pixels = vec![0.0f32; channels * plane];

        match channels {
            1 => {
                let gray = img.to_luma8();
                for (i, px) in gray.as_raw().iter().enumerate() {
                    pixels[i] = *px as f32 / 255.0;
                }
            }
            _ => {
                let rgb = img.to_rgb8();
                for (i, px) in rgb.as_raw().chunks_exact(3).enumerate() {
                    for (c, value) in px.iter().enumerate() {
                        pixels[c * plane + i] = *value as f32 / 255.0;
                    }
                }
            }
        }

        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(LabeledImage::new(source, label, pixels))
    }
}

/// True when the path has one of the accepted image extensions.
fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| IMAGE_EXTENSIONS.iter().any(|ok| ext.eq_ignore_ascii_case(ok)))
            .unwrap_or(false)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn temp_tree(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vvp-loader-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_png(path: &Path, value: u8) {
        let img = RgbImage::from_pixel(4, 4, Rgb([value, value, value]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_classes_sorted_and_labeled() {
        let root = temp_tree("classes");
        for class in ["dog", "cat"] {
            fs::create_dir_all(root.join(class)).unwrap();
        }
        write_png(&root.join("cat/a.png"), 10);
        write_png(&root.join("dog/b.png"), 200);

        let loader = ImageFolderLoader::new(&root, 4, 4, 3);
        let folder = loader.load_all().unwrap();

        assert_eq!(folder.classes, vec!["cat", "dog"]);
        assert_eq!(folder.images.len(), 2);
        let cat = folder.images.iter().find(|i| i.source == "a.png").unwrap();
        let dog = folder.images.iter().find(|i| i.source == "b.png").unwrap();
        assert_eq!(cat.label, 0);
        assert_eq!(dog.label, 1);
    }

    #[test]
    fn test_pixels_rescaled_chw() {
        let root = temp_tree("pixels");
        fs::create_dir_all(root.join("only")).unwrap();
        let img = RgbImage::from_pixel(2, 2, Rgb([255, 0, 51]));
        img.save(root.join("only/x.png")).unwrap();

        let loader = ImageFolderLoader::new(&root, 2, 2, 3);
        let folder = loader.load_all().unwrap();
        let pixels = &folder.images[0].pixels;

        assert_eq!(pixels.len(), 3 * 2 * 2);
        // Channel planes: R all 1.0, G all 0.0, B all 0.2
        assert!(pixels[0..4].iter().all(|&v| (v - 1.0).abs() < 1e-6));
        assert!(pixels[4..8].iter().all(|&v| v == 0.0));
        assert!(pixels[8..12].iter().all(|&v| (v - 0.2).abs() < 1e-6));
    }

    #[test]
    fn test_non_image_files_skipped() {
        let root = temp_tree("skip");
        fs::create_dir_all(root.join("cls")).unwrap();
        write_png(&root.join("cls/ok.png"), 1);
        fs::write(root.join("cls/notes.txt"), "not an image").unwrap();

        let loader = ImageFolderLoader::new(&root, 4, 4, 3);
        let folder = loader.load_all().unwrap();
        assert_eq!(folder.images.len(), 1);
        assert_eq!(folder.images[0].source, "ok.png");
    }

    #[test]
    fn test_unreadable_image_is_skipped_not_fatal() {
        let root = temp_tree("corrupt");
        fs::create_dir_all(root.join("cls")).unwrap();
        write_png(&root.join("cls/ok.png"), 1);
        fs::write(root.join("cls/broken.png"), b"not a png").unwrap();

        let loader = ImageFolderLoader::new(&root, 4, 4, 3);
        let folder = loader.load_all().unwrap();
        assert_eq!(folder.images.len(), 1);
    }

    #[test]
    fn test_missing_directory_is_error() {
        let loader = ImageFolderLoader::new("definitely/not/here", 4, 4, 3);
        let err = loader.load_all().unwrap_err();
        assert!(err.to_string().contains("Cannot read dataset directory"));
    }

    #[test]
    fn test_grayscale_loading() {
        let root = temp_tree("gray");
        fs::create_dir_all(root.join("cls")).unwrap();
        let img = image::GrayImage::from_pixel(2, 2, image::Luma([255]));
        img.save(root.join("cls/g.png")).unwrap();

        let loader = ImageFolderLoader::new(&root, 2, 2, 1);
        let folder = loader.load_all().unwrap();
        assert_eq!(folder.images[0].pixels, vec![1.0; 4]);
    }
}
