//! Augmentation pipeline: composition, paired image/mask augmentation and export.

mod compose;
mod export;
mod paired;

pub use compose::{Config, Pipeline};
pub use export::{
    export_batch, export_batch_with_run_id, image_file_name, mask_file_name, ExportReport, RunId,
};
pub use paired::{augment_batch, Batch, MaskPolicy};
