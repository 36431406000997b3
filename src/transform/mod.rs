//! Transform library.
//!
//! Every transform is a pure function from one image to a new image with the same
//! dimensions. Randomness is resolved up front: a [`TransformKind`] is sampled into an
//! [`Op`] carrying concrete parameters, and applying an `Op` is deterministic. That lets an
//! image and its mask receive exactly the same rotation, crop window or noise field.

mod geometric;
mod photometric;

pub use geometric::{crop_and_resize, flip_horizontal, flip_vertical, rotate};
pub use photometric::{add_noise, adjust_brightness};

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use image::imageops::FilterType;
use image::DynamicImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

/// Largest rotation, in degrees, either way.
pub const MAX_ROTATION_DEGREES: f32 = 30.0;

/// Range brightness factors are drawn from.
pub const BRIGHTNESS_RANGE: RangeInclusive<f32> = 0.5..=1.5;

/// Default noise strength relative to the full sample range.
pub const DEFAULT_NOISE_FACTOR: f32 = 0.1;

/// Default side length of the crop window relative to the image.
pub const DEFAULT_CROP_FACTOR: f32 = 0.8;

/// The available transforms, declared in master order.
///
/// The derived `Ord` follows declaration order, which is the order a pipeline applies
/// enabled transforms in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransformKind {
    /// Rotate by a random angle in `[-30, 30]` degrees.
    Rotate,
    /// Mirror left-right.
    FlipHorizontal,
    /// Mirror top-bottom.
    FlipVertical,
    /// Scale brightness by a random factor in `[0.5, 1.5]`.
    AdjustBrightness,
    /// Add Gaussian noise.
    AddNoise,
    /// Crop a random window and resize it back.
    RandomCropAndResize,
}

impl TransformKind {
    /// Every transform in master order.
    pub const ALL: [Self; 6] = [
        Self::Rotate,
        Self::FlipHorizontal,
        Self::FlipVertical,
        Self::AdjustBrightness,
        Self::AddNoise,
        Self::RandomCropAndResize,
    ];

    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rotate => "Rotate",
            Self::FlipHorizontal => "Flip Horizontal",
            Self::FlipVertical => "Flip Vertical",
            Self::AdjustBrightness => "Adjust Brightness",
            Self::AddNoise => "Add Noise",
            Self::RandomCropAndResize => "Random Crop and Resize",
        }
    }

    /// Whether the transform moves pixels (as opposed to changing their values).
    #[must_use]
    pub const fn is_geometric(self) -> bool {
        matches!(
            self,
            Self::Rotate | Self::FlipHorizontal | Self::FlipVertical | Self::RandomCropAndResize
        )
    }

    /// Draw concrete parameters for one application of this transform.
    pub fn sample<R: Rng + ?Sized>(self, params: &TransformParams, rng: &mut R) -> Op {
        match self {
            Self::Rotate => Op::Rotate {
                degrees: rng.random_range(-MAX_ROTATION_DEGREES..=MAX_ROTATION_DEGREES),
            },
            Self::FlipHorizontal => Op::FlipHorizontal,
            Self::FlipVertical => Op::FlipVertical,
            Self::AdjustBrightness => Op::AdjustBrightness {
                factor: rng.random_range(BRIGHTNESS_RANGE),
            },
            Self::AddNoise => Op::AddNoise {
                noise_factor: params.noise_factor,
                seed: rng.random(),
            },
            Self::RandomCropAndResize => Op::CropAndResize {
                crop_factor: params.crop_factor,
                offset: (rng.random(), rng.random()),
            },
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TransformKind {
    type Err = Error;

    /// Accepts the label ("Flip Horizontal") or a kebab/snake-case name ("flip-horizontal").
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "rotate" => Ok(Self::Rotate),
            "fliphorizontal" | "hflip" => Ok(Self::FlipHorizontal),
            "flipvertical" | "vflip" => Ok(Self::FlipVertical),
            "adjustbrightness" | "brightness" => Ok(Self::AdjustBrightness),
            "addnoise" | "noise" => Ok(Self::AddNoise),
            "randomcropandresize" | "crop" => Ok(Self::RandomCropAndResize),
            _ => Err(Error::InvalidParameter {
                name: "transform".to_string(),
                reason: format!("unknown transform {s:?}"),
            }),
        }
    }
}

/// Fixed parameters of the transforms that are not drawn at random.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformParams {
    /// Noise standard deviation as a fraction of 255.
    pub noise_factor: f32,

    /// Crop window size as a fraction of each image dimension, in `(0, 1]`.
    pub crop_factor: f32,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            noise_factor: DEFAULT_NOISE_FACTOR,
            crop_factor: DEFAULT_CROP_FACTOR,
        }
    }
}

/// What an image represents, which decides how it is resampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// A photograph; resized with a bicubic filter.
    Image,
    /// A segmentation mask; resized with nearest neighbour so labels stay discrete.
    Mask,
}

impl AssetKind {
    const fn resize_filter(self) -> FilterType {
        match self {
            Self::Image => FilterType::CatmullRom,
            Self::Mask => FilterType::Nearest,
        }
    }
}

/// One transform with every parameter fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Rotate { degrees: f32 },
    FlipHorizontal,
    FlipVertical,
    AdjustBrightness { factor: f32 },
    AddNoise { noise_factor: f32, seed: u64 },
    CropAndResize { crop_factor: f32, offset: (f32, f32) },
}

impl Op {
    /// The transform this op is an instance of.
    #[must_use]
    pub const fn kind(&self) -> TransformKind {
        match self {
            Self::Rotate { .. } => TransformKind::Rotate,
            Self::FlipHorizontal => TransformKind::FlipHorizontal,
            Self::FlipVertical => TransformKind::FlipVertical,
            Self::AdjustBrightness { .. } => TransformKind::AdjustBrightness,
            Self::AddNoise { .. } => TransformKind::AddNoise,
            Self::CropAndResize { .. } => TransformKind::RandomCropAndResize,
        }
    }

    /// Apply the op, returning a new image of the same dimensions.
    #[must_use]
    pub fn apply(&self, img: &DynamicImage, asset: AssetKind) -> DynamicImage {
        match *self {
            Self::Rotate { degrees } => rotate(img, degrees),
            Self::FlipHorizontal => flip_horizontal(img),
            Self::FlipVertical => flip_vertical(img),
            Self::AdjustBrightness { factor } => adjust_brightness(img, factor),
            Self::AddNoise { noise_factor, seed } => {
                add_noise(img, noise_factor, &mut StdRng::seed_from_u64(seed))
            }
            Self::CropAndResize {
                crop_factor,
                offset,
            } => crop_and_resize(img, crop_factor, offset, asset.resize_filter()),
        }
    }
}

/// An ordered list of ops, sampled once and applicable any number of times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    ops: Vec<Op>,
}

impl Plan {
    /// Build a plan from explicit ops.
    #[must_use]
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    #[must_use]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Keep only the geometric ops, preserving their parameters.
    #[must_use]
    pub fn geometric(&self) -> Self {
        Self {
            ops: self
                .ops
                .iter()
                .filter(|op| op.kind().is_geometric())
                .copied()
                .collect(),
        }
    }

    /// Feed the image through every op in order. An empty plan returns a copy.
    #[must_use]
    pub fn apply(&self, img: &DynamicImage, asset: AssetKind) -> DynamicImage {
        self.ops
            .iter()
            .fold(img.clone(), |current, op| op.apply(&current, asset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, GrayImage, Luma};

    fn labelled(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| {
            Luma([((x + y * width) % 251) as u8])
        }))
    }

    #[test]
    fn test_master_order_matches_ord() {
        let mut sorted = TransformKind::ALL;
        sorted.sort();
        assert_eq!(sorted, TransformKind::ALL);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            "Flip Horizontal".parse::<TransformKind>().unwrap(),
            TransformKind::FlipHorizontal
        );
        assert_eq!(
            "random-crop-and-resize".parse::<TransformKind>().unwrap(),
            TransformKind::RandomCropAndResize
        );
        assert_eq!(
            "add_noise".parse::<TransformKind>().unwrap(),
            TransformKind::AddNoise
        );
        assert!("sharpen".parse::<TransformKind>().is_err());

        for kind in TransformKind::ALL {
            assert_eq!(kind.label().parse::<TransformKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_sample_ranges() {
        let mut rng = StdRng::seed_from_u64(11);
        let params = TransformParams::default();

        for _ in 0..200 {
            match TransformKind::Rotate.sample(&params, &mut rng) {
                Op::Rotate { degrees } => assert!((-30.0..=30.0).contains(&degrees)),
                other => panic!("unexpected op {other:?}"),
            }
            match TransformKind::AdjustBrightness.sample(&params, &mut rng) {
                Op::AdjustBrightness { factor } => assert!(BRIGHTNESS_RANGE.contains(&factor)),
                other => panic!("unexpected op {other:?}"),
            }
            match TransformKind::RandomCropAndResize.sample(&params, &mut rng) {
                Op::CropAndResize {
                    crop_factor,
                    offset: (x, y),
                } => {
                    assert!((crop_factor - DEFAULT_CROP_FACTOR).abs() < f32::EPSILON);
                    assert!((0.0..1.0).contains(&x) && (0.0..1.0).contains(&y));
                }
                other => panic!("unexpected op {other:?}"),
            }
        }
    }

    #[test]
    fn test_sampled_op_kind_round_trips() {
        let mut rng = StdRng::seed_from_u64(5);
        let params = TransformParams::default();
        for kind in TransformKind::ALL {
            assert_eq!(kind.sample(&params, &mut rng).kind(), kind);
        }
    }

    #[test]
    fn test_every_op_keeps_dimensions() {
        let mut rng = StdRng::seed_from_u64(2);
        let params = TransformParams::default();
        let img = labelled(37, 21);

        for kind in TransformKind::ALL {
            let op = kind.sample(&params, &mut rng);
            assert_eq!(op.apply(&img, AssetKind::Image).dimensions(), (37, 21));
            assert_eq!(op.apply(&img, AssetKind::Mask).dimensions(), (37, 21));
        }
    }

    #[test]
    fn test_op_apply_is_deterministic() {
        let img = labelled(24, 24);
        let ops = [
            Op::Rotate { degrees: 17.0 },
            Op::AddNoise {
                noise_factor: 0.3,
                seed: 99,
            },
            Op::CropAndResize {
                crop_factor: 0.6,
                offset: (0.3, 0.8),
            },
        ];

        for op in ops {
            assert_eq!(
                op.apply(&img, AssetKind::Mask).as_bytes(),
                op.apply(&img, AssetKind::Mask).as_bytes()
            );
        }
    }

    #[test]
    fn test_empty_plan_is_identity() {
        let img = labelled(9, 4);
        let out = Plan::default().apply(&img, AssetKind::Image);
        assert_eq!(out.as_bytes(), img.as_bytes());
    }

    #[test]
    fn test_plan_composes_in_order() {
        let img = labelled(6, 3);
        let plan = Plan::new(vec![Op::FlipHorizontal, Op::FlipVertical]);

        let expected = flip_vertical(&flip_horizontal(&img));
        assert_eq!(plan.apply(&img, AssetKind::Image).as_bytes(), expected.as_bytes());
    }

    #[test]
    fn test_geometric_filter_drops_photometric_ops() {
        let plan = Plan::new(vec![
            Op::AdjustBrightness { factor: 1.2 },
            Op::FlipVertical,
            Op::AddNoise {
                noise_factor: 0.1,
                seed: 1,
            },
            Op::Rotate { degrees: 5.0 },
        ]);

        assert_eq!(
            plan.geometric().ops(),
            &[Op::FlipVertical, Op::Rotate { degrees: 5.0 }]
        );
    }
}
