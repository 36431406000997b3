//! Custom error types for augmask.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the augmask library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to list the contents of an input folder.
    #[error("failed to read folder {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The selected input folder holds no usable images.
    #[error("no .jpg or .png images found in {path}")]
    NoImages { path: PathBuf },

    /// Augmentation was requested before an input folder was selected.
    #[error("no input folder selected")]
    NoFolderSelected,

    /// Export was requested before augmentation ran.
    #[error("nothing to save: run augmentation first")]
    NotAugmented,

    /// The export target is missing or not a directory.
    #[error("output folder {path} does not exist or is not a directory")]
    OutputDir { path: PathBuf },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
}

/// Result type alias for augmask operations.
pub type Result<T> = std::result::Result<T, Error>;
