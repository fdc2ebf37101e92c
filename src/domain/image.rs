// ============================================================
// Layer 3 — Image Domain Types
// ============================================================
// A labelled training image and the result of scanning a
// class-per-subdirectory dataset folder. Plain data structs —
// pixel decoding and resizing happen in the data layer before
// these are created.

/// A single labelled image, decoded and rescaled.
///
/// Pixels are stored channel-major (CHW) as f32 in [0, 1],
/// already rescaled by 1/255 and resized to the model's input
/// dimensions. The label is an index into the owning folder's
/// class list.
#[derive(Debug, Clone)]
pub struct LabeledImage {
    /// The filename or path — kept for traceability
    pub source: String,

    /// Class index (position of the class name in the sorted
    /// subdirectory listing)
    pub label: usize,

    /// CHW pixel data, length = channels * height * width
    pub pixels: Vec<f32>,
}

impl LabeledImage {
    pub fn new(source: impl Into<String>, label: usize, pixels: Vec<f32>) -> Self {
        Self {
            source: source.into(),
            label,
            pixels,
        }
    }
}

/// The result of loading one dataset directory: the sorted class
/// names (subdirectory names) and every image found under them.
#[derive(Debug, Clone, Default)]
pub struct ImageFolder {
    /// Class names in sorted order; a LabeledImage's label indexes
    /// into this list
    pub classes: Vec<String>,

    /// All decoded images across all classes
    pub images: Vec<LabeledImage>,
}

impl ImageFolder {
    pub fn new(classes: Vec<String>, images: Vec<LabeledImage>) -> Self {
        Self { classes, images }
    }

    /// Number of distinct classes discovered
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
