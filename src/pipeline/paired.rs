//! Paired image/mask augmentation.

use std::fmt;
use std::str::FromStr;

use image::DynamicImage;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;

use crate::error::{Error, Result};
use crate::image::ImageMap;
use crate::transform::AssetKind;

use super::compose::Pipeline;

/// How a mask is transformed relative to its image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskPolicy {
    /// Share one sampled plan per pair; the mask receives only its geometric ops.
    #[default]
    GeometricOnly,
    /// Share one sampled plan per pair; the mask receives every op, noise field included.
    Mirror,
    /// Sample a separate plan for the mask. Random rotations and crops will generally not
    /// line up with the image.
    Independent,
}

impl fmt::Display for MaskPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GeometricOnly => "geometric",
            Self::Mirror => "mirror",
            Self::Independent => "independent",
        })
    }
}

impl FromStr for MaskPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "geometric" | "geometric-only" => Ok(Self::GeometricOnly),
            "mirror" => Ok(Self::Mirror),
            "independent" => Ok(Self::Independent),
            other => Err(Error::InvalidParameter {
                name: "mask_policy".to_string(),
                reason: format!("unknown mask policy {other:?}"),
            }),
        }
    }
}

/// Augmented images and masks keyed by base identifier.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub images: ImageMap,
    pub masks: ImageMap,
}

impl Batch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// First augmented image in base-identifier order.
    #[must_use]
    pub fn first_image(&self) -> Option<&DynamicImage> {
        self.images.values().next()
    }
}

/// Run `pipeline` over every image, and over the mask sharing its base identifier.
///
/// Masks without a matching image are skipped. Sources are borrowed and never modified.
pub fn augment_batch<R: Rng + ?Sized>(
    images: &ImageMap,
    masks: &ImageMap,
    pipeline: &Pipeline,
    policy: MaskPolicy,
    rng: &mut R,
) -> Batch {
    if pipeline.is_empty() {
        tracing::warn!("No transforms enabled, outputs will match their sources");
    }

    let unpaired = masks.keys().filter(|id| !images.contains_key(*id)).count();
    if unpaired > 0 {
        tracing::warn!("Ignoring {unpaired} masks with no matching image");
    }

    let pb = ProgressBar::new(images.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Augmenting [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let mut batch = Batch::default();

    for (id, img) in images {
        let plan = pipeline.sample(rng);
        tracing::debug!("Augmenting {id} with {:?}", plan.ops());

        batch
            .images
            .insert(id.clone(), plan.apply(img, AssetKind::Image));

        if let Some(mask) = masks.get(id) {
            let augmented = match policy {
                MaskPolicy::GeometricOnly => plan.geometric().apply(mask, AssetKind::Mask),
                MaskPolicy::Mirror => plan.apply(mask, AssetKind::Mask),
                MaskPolicy::Independent => pipeline.apply(mask, AssetKind::Mask, rng),
            };
            batch.masks.insert(id.clone(), augmented);
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    tracing::info!(
        "Augmented {} images and {} masks",
        batch.images.len(),
        batch.masks.len()
    );
    batch
}
