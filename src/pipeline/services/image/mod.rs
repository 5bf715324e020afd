//! Pixel-level stages: statistics, thresholds and enhanced variants.

pub mod color;
pub mod image_stats;
pub mod threshold;
pub mod variants;

pub use color::{mean_hsv, rgb_to_hsv};
pub use image_stats::{downscale_for_analysis, ImageStatsService};
pub use variants::{Technique, VariantGenerator};
