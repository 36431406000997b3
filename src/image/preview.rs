//! Preview thumbnails.

use image::DynamicImage;

use super::PREVIEW_SIZE;

/// Scale an image to fit inside a `PREVIEW_SIZE` square, preserving aspect ratio.
///
/// Images already small enough are returned as a copy; the source is never modified.
#[must_use]
pub fn thumbnail(img: &DynamicImage) -> DynamicImage {
    if img.width() <= PREVIEW_SIZE && img.height() <= PREVIEW_SIZE {
        return img.clone();
    }
    img.thumbnail(PREVIEW_SIZE, PREVIEW_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn test_thumbnail_fits_and_keeps_source() {
        let img = DynamicImage::new_rgb8(1000, 250);
        let thumb = thumbnail(&img);

        assert_eq!(thumb.dimensions(), (500, 125));
        assert_eq!(img.dimensions(), (1000, 250));
    }

    #[test]
    fn test_thumbnail_small_image_unchanged() {
        let img = DynamicImage::new_rgb8(40, 30);
        assert_eq!(thumbnail(&img).dimensions(), (40, 30));
    }
}
