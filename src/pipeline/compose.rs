//! Pipeline configuration and composition.

use std::collections::BTreeSet;

use image::DynamicImage;
use rand::Rng;

use crate::error::{Error, Result};
use crate::image::OutputFormat;
use crate::transform::{AssetKind, Plan, TransformKind, TransformParams};

use super::paired::MaskPolicy;

/// Configuration for an augmentation run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Transforms to apply. Order of insertion is irrelevant; the pipeline always applies
    /// them in [`TransformKind::ALL`] order.
    pub enabled: BTreeSet<TransformKind>,

    /// Fixed transform parameters (noise strength, crop size).
    pub params: TransformParams,

    /// How masks follow their images through the pipeline.
    pub mask_policy: MaskPolicy,

    /// Exported file format.
    pub output_format: OutputFormat,

    /// Output JPEG quality (1-100).
    pub output_quality: u8,

    /// Random seed for reproducibility. None for random.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: BTreeSet::new(),
            params: TransformParams::default(),
            mask_policy: MaskPolicy::default(),
            output_format: OutputFormat::default(),
            output_quality: 95,
            seed: None,
        }
    }
}

impl Config {
    /// Enable every transform.
    #[must_use]
    pub fn all() -> Self {
        Self {
            enabled: TransformKind::ALL.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        let crop = self.params.crop_factor;
        if !(crop > 0.0 && crop <= 1.0) {
            return Err(Error::InvalidParameter {
                name: "crop_factor".to_string(),
                reason: "must be greater than 0.0 and at most 1.0".to_string(),
            });
        }

        let noise = self.params.noise_factor;
        if !noise.is_finite() || noise < 0.0 {
            return Err(Error::InvalidParameter {
                name: "noise_factor".to_string(),
                reason: "must be a finite value of at least 0.0".to_string(),
            });
        }

        if !(1..=100).contains(&self.output_quality) {
            return Err(Error::InvalidParameter {
                name: "output_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        Ok(())
    }

    /// Build the pipeline described by this configuration.
    #[must_use]
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.enabled.iter().copied(), self.params)
    }
}

/// An ordered list of transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    kinds: Vec<TransformKind>,
    params: TransformParams,
}

impl Pipeline {
    /// Create a pipeline from a set of enabled transforms.
    ///
    /// The result follows master order no matter the order `enabled` yields them in;
    /// duplicates collapse.
    pub fn new(enabled: impl IntoIterator<Item = TransformKind>, params: TransformParams) -> Self {
        let enabled: BTreeSet<_> = enabled.into_iter().collect();
        let kinds = TransformKind::ALL
            .into_iter()
            .filter(|kind| enabled.contains(kind))
            .collect();

        Self { kinds, params }
    }

    /// Transforms in application order.
    #[must_use]
    pub fn kinds(&self) -> &[TransformKind] {
        &self.kinds
    }

    #[must_use]
    pub fn params(&self) -> &TransformParams {
        &self.params
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Draw one set of parameters for every transform.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Plan {
        Plan::new(
            self.kinds
                .iter()
                .map(|kind| kind.sample(&self.params, &mut *rng))
                .collect(),
        )
    }

    /// Sample a fresh plan and apply it. Each call draws new parameters.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        img: &DynamicImage,
        asset: AssetKind,
        rng: &mut R,
    ) -> DynamicImage {
        self.sample(rng).apply(img, asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn checker() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(12, 8, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 40, 80])
            }
        }))
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
        assert!(Config::all().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_crop() {
        for crop_factor in [0.0, -0.5, 1.01, f32::NAN] {
            let mut config = Config::default();
            config.params.crop_factor = crop_factor;
            assert!(matches!(
                config.validate(),
                Err(Error::InvalidParameter { ref name, .. }) if name == "crop_factor"
            ));
        }
    }

    #[test]
    fn test_validate_rejects_bad_noise_and_quality() {
        let mut config = Config::default();
        config.params.noise_factor = -0.1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output_quality = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pipeline_uses_master_order() {
        let pipeline = Pipeline::new(
            [
                TransformKind::RandomCropAndResize,
                TransformKind::Rotate,
                TransformKind::AddNoise,
                TransformKind::Rotate,
            ],
            TransformParams::default(),
        );

        assert_eq!(
            pipeline.kinds(),
            &[
                TransformKind::Rotate,
                TransformKind::AddNoise,
                TransformKind::RandomCropAndResize
            ]
        );
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let mut rng = StdRng::seed_from_u64(0);
        let pipeline = Config::default().pipeline();
        let img = checker();

        assert!(pipeline.is_empty());
        let out = pipeline.apply(&img, AssetKind::Image, &mut rng);
        assert_eq!(out.as_bytes(), img.as_bytes());
    }

    #[test]
    fn test_full_pipeline_keeps_dimensions() {
        let mut rng = StdRng::seed_from_u64(4);
        let pipeline = Config::all().pipeline();
        let img = checker();

        for _ in 0..10 {
            assert_eq!(pipeline.apply(&img, AssetKind::Image, &mut rng).dimensions(), (12, 8));
        }
    }

    #[test]
    fn test_plan_follows_pipeline_order() {
        let mut rng = StdRng::seed_from_u64(8);
        let pipeline = Config::all().pipeline();
        let plan = pipeline.sample(&mut rng);

        let kinds: Vec<_> = plan.ops().iter().map(crate::transform::Op::kind).collect();
        assert_eq!(kinds, TransformKind::ALL);
    }

    #[test]
    fn test_repeated_apply_resamples() {
        let mut rng = StdRng::seed_from_u64(21);
        let pipeline = Pipeline::new([TransformKind::Rotate], TransformParams::default());

        let first = pipeline.sample(&mut rng);
        let second = pipeline.sample(&mut rng);
        assert_ne!(first, second);
    }
}
