//! # augmask
//!
//! A library for augmenting folders of images together with their segmentation masks.
//!
//! Images are loaded into memory keyed by their base identifier (the file stem, with a
//! trailing `_mask` removed for masks), run through an ordered pipeline of transforms and
//! exported with a per-run identifier so that every file from one run can be found as a set.
//!
//! ## Example
//!
//! ```no_run
//! use augmask::{Config, Session, TransformKind};
//!
//! # fn main() -> augmask::Result<()> {
//! let mut config = Config::default();
//! config.enabled.insert(TransformKind::FlipHorizontal);
//! config.enabled.insert(TransformKind::Rotate);
//!
//! let mut session = Session::new();
//! session.select_folder("images")?;
//! session.select_mask_folder("masks")?;
//! session.augment(&config)?;
//! let report = session.save("augmented", &config)?;
//!
//! println!("run {} wrote {} images", report.run_id, report.images.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod pipeline;
pub mod session;
pub mod transform;

pub use error::{Error, Result};
pub use pipeline::{Batch, Config, ExportReport, MaskPolicy, Pipeline, RunId};
pub use session::{Session, SessionState};
pub use transform::{AssetKind, Op, Plan, TransformKind, TransformParams};
