use burn::data::dataset::Dataset;

use crate::domain::image::LabeledImage;

/// In-memory image dataset backing Burn's DataLoader.
/// All images share the same CHW dimensions; the loader resizes
/// them before the dataset is built.
pub struct ImageDataset {
    samples: Vec<LabeledImage>,
}

impl ImageDataset {
    pub fn new(samples: Vec<LabeledImage>) -> Self {
        Self { samples }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl Dataset<LabeledImage> for ImageDataset {
    fn get(&self, index: usize) -> Option<LabeledImage> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_len() {
        let dataset = ImageDataset::new(vec![
            LabeledImage::new("a", 0, vec![0.0; 4]),
            LabeledImage::new("b", 1, vec![1.0; 4]),
        ]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.sample_count(), 2);
        assert_eq!(dataset.get(1).unwrap().source, "b");
        assert!(dataset.get(2).is_none());
    }
}
