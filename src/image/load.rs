//! Image loading utilities.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use image::DynamicImage;

use crate::error::{Error, Result};

use super::{IMAGE_EXTENSIONS, MASK_SUFFIX};

/// Images keyed by base identifier.
pub type ImageMap = BTreeMap<String, DynamicImage>;

/// Load an image from disk.
///
/// Inputs with 16-bit or floating point samples are converted to the 8-bit variant with the
/// same channel layout, so every image handed to the transforms has `u8` samples.
///
/// # Errors
///
/// Returns an error if the image cannot be opened or decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(to_8bit(img))
}

/// Base identifier of an image or mask file: the stem with any trailing `_mask` removed.
///
/// Returns `None` when the path has no UTF-8 stem.
#[must_use]
pub fn base_identifier(path: &Path) -> Option<String> {
    let stem = utf8_stem(path)?;
    Some(stem.strip_suffix(MASK_SUFFIX).unwrap_or(stem).to_string())
}

/// Load every `.jpg`/`.png` image directly inside `dir`, keyed by its file stem.
///
/// # Errors
///
/// Returns an error if the folder cannot be read or an image fails to decode.
pub fn load_folder<P: AsRef<Path>>(dir: P) -> Result<ImageMap> {
    load_matching(dir.as_ref(), |path| utf8_stem(path).map(str::to_string))
}

/// Load every `*_mask.jpg`/`*_mask.png` file directly inside `dir`, keyed by base identifier
/// so it pairs with the image of the same stem.
///
/// # Errors
///
/// Returns an error if the folder cannot be read or a mask fails to decode.
pub fn load_mask_folder<P: AsRef<Path>>(dir: P) -> Result<ImageMap> {
    load_matching(dir.as_ref(), |path| {
        if utf8_stem(path)?.ends_with(MASK_SUFFIX) {
            base_identifier(path)
        } else {
            tracing::debug!("Skipping {}: not a mask", path.display());
            None
        }
    })
}

fn load_matching(dir: &Path, key: impl Fn(&Path) -> Option<String>) -> Result<ImageMap> {
    let entries = fs::read_dir(dir).map_err(|source| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| Error::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?
            .path();

        if path.is_file() && has_image_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut images = ImageMap::new();
    for path in paths {
        if utf8_stem(&path).is_none() {
            tracing::warn!("Skipping {}: file name is not valid UTF-8", path.display());
            continue;
        }
        let Some(id) = key(&path) else {
            continue;
        };

        tracing::debug!("Loading {}", path.display());
        let img = load_image(&path)?;

        if images.insert(id.clone(), img).is_some() {
            tracing::warn!(
                "Duplicate base identifier {id:?}, keeping {}",
                path.display()
            );
        }
    }

    tracing::info!("Loaded {} images from {}", images.len(), dir.display());
    Ok(images)
}

fn utf8_stem(path: &Path) -> Option<&str> {
    path.file_stem()?.to_str()
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

/// Narrow any image to 8-bit samples, keeping its channel layout.
fn to_8bit(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => img,
        other => match other.color().channel_count() {
            1 => DynamicImage::ImageLuma8(other.to_luma8()),
            2 => DynamicImage::ImageLumaA8(other.to_luma_alpha8()),
            3 => DynamicImage::ImageRgb8(other.to_rgb8()),
            _ => DynamicImage::ImageRgba8(other.to_rgba8()),
        },
    }
}
