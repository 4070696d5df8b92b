//! Feature extraction from part records.

mod color;
mod features;
mod matrix;

pub use color::{channels as color_channels, lookup as color_rgb};
pub use features::{size_signal, stud_dimensions, EncodedInventory, FeatureEncoder};
pub use matrix::{FeatureMatrix, FeatureVector};
