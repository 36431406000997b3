//! Image loading, saving, and preview utilities.

mod load;
mod preview;
mod save;

pub use load::{base_identifier, load_folder, load_image, load_mask_folder, ImageMap};
pub use preview::thumbnail;
pub use save::{save_image, OutputFormat};

/// File extensions accepted from input folders (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Stem suffix marking a file as a segmentation mask.
pub const MASK_SUFFIX: &str = "_mask";

/// Longest edge of a preview thumbnail.
pub const PREVIEW_SIZE: u32 = 500;
