//! Image saving utilities.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};

/// File format written by an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// JPEG; alpha channels are dropped.
    #[default]
    Jpeg,
    /// Lossless PNG.
    Png,
}

impl OutputFormat {
    /// File extension used in exported names.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            other => Err(Error::InvalidParameter {
                name: "format".to_string(),
                reason: format!("unsupported output format {other:?}, expected jpg or png"),
            }),
        }
    }
}

/// Save an image to `path` in the given format.
///
/// # Arguments
///
/// * `img` - Image with 8-bit samples
/// * `path` - Output file path
/// * `format` - Output format; the extension of `path` is not consulted
/// * `quality` - JPEG quality (1-100), ignored for PNG
///
/// # Errors
///
/// Returns an error if the file cannot be created or encoding fails.
pub fn save_image<P: AsRef<Path>>(
    img: &DynamicImage,
    path: P,
    format: OutputFormat,
    quality: u8,
) -> Result<()> {
    let path = path.as_ref();
    let save_err = |source| Error::ImageSave {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(|e| save_err(image::ImageError::IoError(e)))?;
    let mut output = BufWriter::new(file);

    match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut output, quality);
            jpeg_compatible(img)
                .write_with_encoder(encoder)
                .map_err(save_err)?;
        }
        OutputFormat::Png => {
            img.write_to(&mut output, ImageFormat::Png)
                .map_err(save_err)?;
        }
    }

    output
        .flush()
        .map_err(|e| save_err(image::ImageError::IoError(e)))?;

    Ok(())
}

/// JPEG stores neither alpha nor anything beyond gray and RGB.
fn jpeg_compatible(img: &DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img.clone(),
        DynamicImage::ImageLumaA8(_) => DynamicImage::ImageLuma8(img.to_luma8()),
        _ => DynamicImage::ImageRgb8(img.to_rgb8()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn test_format_parse() {
        assert_eq!("JPEG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("png".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert!("gif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_save_rgba_as_jpeg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 6, Rgba([200, 100, 50, 128])));

        save_image(&img, &path, OutputFormat::Jpeg, 90).unwrap();

        let reloaded = image::open(&path).unwrap();
        assert_eq!(reloaded.dimensions(), (8, 6));
        assert!(!reloaded.color().has_alpha());
    }

    #[test]
    fn test_save_png_is_lossless() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.png");
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(5, 5, |x, y| {
            Rgba([x as u8 * 40, y as u8 * 40, 7, 255])
        }));

        save_image(&img, &path, OutputFormat::Png, 95).unwrap();

        let reloaded = image::open(&path).unwrap();
        assert_eq!(reloaded.as_bytes(), img.as_bytes());
    }

    #[test]
    fn test_save_into_missing_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.png");
        let img = DynamicImage::new_rgb8(2, 2);

        let err = save_image(&img, &path, OutputFormat::Png, 95).unwrap_err();
        assert!(matches!(err, Error::ImageSave { .. }));
    }
}
