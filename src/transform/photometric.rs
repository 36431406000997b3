//! Transforms that change sample values: brightness and noise.

use image::{DynamicImage, ImageBuffer, Pixel};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Scale every colour sample by `factor`, rounding and clamping to `[0, 255]`.
///
/// Alpha is left untouched. A factor of 1.0 reproduces the input exactly.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn adjust_brightness(img: &DynamicImage, factor: f32) -> DynamicImage {
    map_samples(img, |value, is_alpha| {
        if is_alpha {
            value
        } else {
            // Safe: clamped to [0, 255] before casting
            (f32::from(value) * factor).round().clamp(0.0, 255.0) as u8
        }
    })
}

/// Add zero-mean Gaussian noise with standard deviation `255 * noise_factor`.
///
/// Every sample of every channel, alpha included, receives an independent draw. Results are
/// clamped to `[0, 255]` and truncated, so a factor of 0 reproduces the input exactly.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn add_noise<R: Rng + ?Sized>(
    img: &DynamicImage,
    noise_factor: f32,
    rng: &mut R,
) -> DynamicImage {
    // Normal::new only rejects a non-finite deviation; a negative one would mirror the draws.
    let normal = match Normal::new(0.0_f32, 255.0 * noise_factor) {
        Ok(normal) if noise_factor >= 0.0 => normal,
        _ => {
            tracing::warn!("Ignoring invalid noise factor {noise_factor}");
            return img.clone();
        }
    };

    map_samples(img, |value, _| {
        // Safe: clamped to [0, 255] before casting
        (f32::from(value) + normal.sample(&mut *rng)).clamp(0.0, 255.0) as u8
    })
}

/// Rebuild an 8-bit image with `f(sample, is_alpha)` applied to every sample.
fn map_samples(img: &DynamicImage, mut f: impl FnMut(u8, bool) -> u8) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(map_buffer(buf, false, &mut f)),
        DynamicImage::ImageLumaA8(buf) => DynamicImage::ImageLumaA8(map_buffer(buf, true, &mut f)),
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(map_buffer(buf, false, &mut f)),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(map_buffer(buf, true, &mut f)),
        other => DynamicImage::ImageRgba8(map_buffer(&other.to_rgba8(), true, &mut f)),
    }
}

fn map_buffer<P>(
    buf: &ImageBuffer<P, Vec<u8>>,
    has_alpha: bool,
    f: &mut impl FnMut(u8, bool) -> u8,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let channels = usize::from(P::CHANNEL_COUNT);
    let alpha_index = if has_alpha { Some(channels - 1) } else { None };

    let mut out = buf.clone();
    for pixel in out.chunks_exact_mut(channels) {
        for (i, sample) in pixel.iter_mut().enumerate() {
            *sample = f(*sample, alpha_index == Some(i));
        }
    }
    out
}
