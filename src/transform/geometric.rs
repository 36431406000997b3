//! Transforms that move pixels: rotation, flips, crop-and-resize.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Luma, LumaA, Rgb, Rgba};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

/// Rotate counter-clockwise by `degrees` about the image center.
///
/// The canvas keeps its size; corners rotated out are cropped and uncovered regions are
/// filled with zero (fully transparent for images with alpha). Nearest-neighbour sampling
/// keeps mask labels intact.
#[must_use]
pub fn rotate(img: &DynamicImage, degrees: f32) -> DynamicImage {
    if degrees.abs() < f32::EPSILON {
        return img.clone();
    }

    // imageproc rotates clockwise for positive angles.
    let theta = -degrees.to_radians();
    let interp = Interpolation::Nearest;

    match img {
        DynamicImage::ImageLuma8(buf) => {
            DynamicImage::ImageLuma8(rotate_about_center(buf, theta, interp, Luma([0])))
        }
        DynamicImage::ImageLumaA8(buf) => {
            DynamicImage::ImageLumaA8(rotate_about_center(buf, theta, interp, LumaA([0, 0])))
        }
        DynamicImage::ImageRgb8(buf) => {
            DynamicImage::ImageRgb8(rotate_about_center(buf, theta, interp, Rgb([0, 0, 0])))
        }
        DynamicImage::ImageRgba8(buf) => {
            DynamicImage::ImageRgba8(rotate_about_center(buf, theta, interp, Rgba([0, 0, 0, 0])))
        }
        other => DynamicImage::ImageRgba8(rotate_about_center(
            &other.to_rgba8(),
            theta,
            interp,
            Rgba([0, 0, 0, 0]),
        )),
    }
}

/// Mirror left-right.
#[must_use]
pub fn flip_horizontal(img: &DynamicImage) -> DynamicImage {
    img.fliph()
}

/// Mirror top-bottom.
#[must_use]
pub fn flip_vertical(img: &DynamicImage) -> DynamicImage {
    img.flipv()
}

/// Crop a `crop_factor`-sized window and resize it back to the original dimensions.
///
/// `offset` holds the horizontal and vertical position of the window as fractions in
/// `[0, 1)` of the slack left by the crop, so a uniform fraction selects every in-bounds
/// integer offset with equal probability and the same fraction addresses the same
/// relative region of differently sized images. `crop_factor` must lie in `(0, 1]`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn crop_and_resize(
    img: &DynamicImage,
    crop_factor: f32,
    offset: (f32, f32),
    filter: FilterType,
) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    // Multiply in f32: widening crop_factor to f64 first turns 0.7 into 0.69999998..., and
    // 10 * 0.7 would truncate to 6 instead of 7.
    // Safe: crop_factor <= 1 keeps the product within the original dimension
    let crop_w = ((width as f32 * crop_factor) as u32).clamp(1, width);
    let crop_h = ((height as f32 * crop_factor) as u32).clamp(1, height);

    let left = slack_offset(width - crop_w, offset.0);
    let top = slack_offset(height - crop_h, offset.1);

    img.crop_imm(left, top, crop_w, crop_h)
        .resize_exact(width, height, filter)
}

/// Map a fraction in `[0, 1)` onto `0..=slack`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn slack_offset(slack: u32, fraction: f32) -> u32 {
    let scaled = f64::from(fraction.clamp(0.0, 1.0)) * (f64::from(slack) + 1.0);
    (scaled as u32).min(slack)
}
