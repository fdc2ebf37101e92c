// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<LabeledImage>
// into model-ready tensors.
//
// How batching works here:
//   Input:  Vec of N images, each CHW with identical dimensions
//   Output: ImageBatch with images [N, C, H, W] and targets [N]
//
//   Pixels are flattened into one long Vec<f32>, turned into a
//   1D tensor, then reshaped to [N, C, H, W].
//
// The training batcher additionally carries the augmentation
// recipe and warps each image before stacking; the validation
// batcher carries none and stacks pixels as-is. Augmentation
// parameters are drawn fresh per image per epoch.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::augment::Augmentor;
use crate::domain::image::LabeledImage;

// ─── ImageBatch ───────────────────────────────────────────────────────────────
/// A batch of images ready for the model forward pass.
///
/// B is the Burn Backend — generic so the same batcher serves
/// the autodiff training backend and the plain validation one.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Pixel data — shape: [batch_size, channels, height, width]
    pub images: Tensor<B, 4>,

    /// Class labels — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
/// Holds the target device, the image dimensions, and (for the
/// training feed only) the augmentation recipe.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,

    channels: usize,
    height:   usize,
    width:    usize,

    /// Some(recipe) on the training feed, None on validation
    augment: Option<Augmentor>,
}

impl<B: Backend> ImageBatcher<B> {
    /// Batcher for the training feed: every image is warped with
    /// freshly sampled recipe parameters.
    pub fn for_training(
        device: B::Device,
        channels: usize,
        height: usize,
        width: usize,
    ) -> Self {
        Self {
            device,
            channels,
            height,
            width,
            augment: Some(Augmentor::default()),
        }
    }

    /// Batcher for the validation feed: pixels pass through
    /// unchanged.
    pub fn for_validation(
        device: B::Device,
        channels: usize,
        height: usize,
        width: usize,
    ) -> Self {
        Self {
            device,
            channels,
            height,
            width,
            augment: None,
        }
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
impl<B: Backend> Batcher<LabeledImage, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<LabeledImage>) -> ImageBatch<B> {
        let batch_size = items.len();
        let plane = self.channels * self.height * self.width;

        let mut rng = rand::thread_rng();
        let mut pixels_flat: Vec<f32> = Vec::with_capacity(batch_size * plane);

        for item in &items {
            debug_assert_eq!(item.pixels.len(), plane);
            match &self.augment {
                Some(augmentor) => pixels_flat.extend(augmentor.apply(
                    &item.pixels,
                    self.channels,
                    self.height,
                    self.width,
                    &mut rng,
                )),
                None => pixels_flat.extend_from_slice(&item.pixels),
            }
        }

        let targets: Vec<i32> = items.iter().map(|item| item.label as i32).collect();

        let images = Tensor::<B, 1>::from_floats(pixels_flat.as_slice(), &self.device)
            .reshape([batch_size, self.channels, self.height, self.width]);

        let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), &self.device);

        ImageBatch { images, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    fn sample(label: usize, value: f32) -> LabeledImage {
        LabeledImage::new(format!("img-{label}"), label, vec![value; 1 * 2 * 2])
    }

    #[test]
    fn test_validation_batch_shapes_and_values() {
        let batcher = ImageBatcher::<B>::for_validation(Default::default(), 1, 2, 2);
        let batch = batcher.batch(vec![sample(0, 0.25), sample(1, 0.75)]);

        assert_eq!(batch.images.dims(), [2, 1, 2, 2]);
        assert_eq!(batch.targets.dims(), [2]);

        let data: Vec<f32> = batch.images.into_data().to_vec().unwrap();
        assert_eq!(&data[0..4], &[0.25; 4]);
        assert_eq!(&data[4..8], &[0.75; 4]);

        let targets: Vec<i64> = batch.targets.into_data().to_vec().unwrap();
        assert_eq!(targets, vec![0, 1]);
    }

    #[test]
    fn test_training_batch_keeps_shape_under_augmentation() {
        let batcher = ImageBatcher::<B>::for_training(Default::default(), 1, 2, 2);
        let batch = batcher.batch(vec![sample(0, 1.0)]);

        assert_eq!(batch.images.dims(), [1, 1, 2, 2]);
        // A constant image survives any warp unchanged
        let data: Vec<f32> = batch.images.into_data().to_vec().unwrap();
        assert!(data.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }
}
