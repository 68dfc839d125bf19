//! Class color palette and compositing helpers
//!
//! The palette is an explicitly constructed value built from a seed, so
//! composites are reproducible for a given segmenter instance and fully
//! deterministic under test.

use crate::labels::NUM_CLASSES;
use image::Rgba;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Alpha applied to every non-background class color
const CLASS_ALPHA: u8 = 128;

/// Fixed per-class overlay colors
///
/// Index 0 (background) is fully transparent; every other class gets a
/// semi-transparent RGB color drawn from the seeded generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPalette {
    colors: [Rgba<u8>; NUM_CLASSES],
}

impl ColorPalette {
    /// Build a palette from a seed
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut colors = [Rgba([0, 0, 0, 0]); NUM_CLASSES];
        for color in colors.iter_mut().skip(1) {
            *color = Rgba([
                random_channel(&mut rng),
                random_channel(&mut rng),
                random_channel(&mut rng),
                CLASS_ALPHA,
            ]);
        }
        Self { colors }
    }

    /// Get the overlay color for a class index
    ///
    /// Out-of-range indices map to the transparent background color.
    #[must_use]
    pub fn color(&self, class: usize) -> Rgba<u8> {
        self.colors.get(class).copied().unwrap_or(Rgba([0, 0, 0, 0]))
    }

    /// Number of entries in the palette
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the palette is empty (never true for a constructed palette)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn random_channel(rng: &mut StdRng) -> u8 {
    (255.0 * rng.gen::<f32>()) as u8
}

/// Source-over alpha compositing of `overlay` onto `backdrop`
///
/// Standard non-premultiplied "over" math; a fully transparent overlay
/// returns the backdrop unchanged.
#[must_use]
pub fn composite_colors(overlay: Rgba<u8>, backdrop: Rgba<u8>) -> Rgba<u8> {
    let fa = f32::from(overlay[3]) / 255.0;
    let ba = f32::from(backdrop[3]) / 255.0;
    let out_a = fa + ba * (1.0 - fa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |f: u8, b: u8| -> u8 {
        let f = f32::from(f);
        let b = f32::from(b);
        ((f * fa + b * ba * (1.0 - fa)) / out_a).round() as u8
    };

    Rgba([
        blend(overlay[0], backdrop[0]),
        blend(overlay[1], backdrop[1]),
        blend(overlay[2], backdrop[2]),
        (out_a * 255.0).round() as u8,
    ])
}
