//! Fixed class label space of the DeepLab-v3 PASCAL VOC model

/// Number of output classes predicted per pixel
pub const NUM_CLASSES: usize = 21;

/// Class index of the "person" label, the default segmentation target
pub const PERSON_CLASS: usize = 15;

/// Human-readable names for the 21 PASCAL VOC classes, indexed by class id
pub const LABELS: [&str; NUM_CLASSES] = [
    "background",
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "dining table",
    "dog",
    "horse",
    "motorbike",
    "person",
    "potted plant",
    "sheep",
    "sofa",
    "train",
    "tv",
];

/// Look up the human-readable name for a class index
#[must_use]
pub fn label(class: usize) -> Option<&'static str> {
    LABELS.get(class).copied()
}
