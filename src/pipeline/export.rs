//! Batch export with per-run file naming.

use std::fmt;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::image::{save_image, OutputFormat, MASK_SUFFIX};

use super::paired::Batch;

/// Identifier shared by every file written in one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Files written by one export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub run_id: RunId,
    pub images: Vec<PathBuf>,
    pub masks: Vec<PathBuf>,
}

impl ExportReport {
    /// Total number of files written.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.images.len() + self.masks.len()
    }
}

/// `<base>_ag<run_id>.<ext>`
#[must_use]
pub fn image_file_name(base: &str, run_id: RunId, format: OutputFormat) -> String {
    format!("{base}_ag{run_id}.{}", format.extension())
}

/// `<base>_ag<run_id>_mask.<ext>`
#[must_use]
pub fn mask_file_name(base: &str, run_id: RunId, format: OutputFormat) -> String {
    format!("{base}_ag{run_id}{MASK_SUFFIX}.{}", format.extension())
}

/// Write a batch to `output_dir` under a freshly generated run identifier.
///
/// # Errors
///
/// Returns an error if `output_dir` is not a directory or any file fails to write. Files
/// written before the failure are left in place.
pub fn export_batch<P: AsRef<Path>>(
    batch: &Batch,
    output_dir: P,
    format: OutputFormat,
    quality: u8,
) -> Result<ExportReport> {
    export_batch_with_run_id(batch, output_dir, RunId::generate(), format, quality)
}

/// Write a batch to `output_dir` under the given run identifier.
///
/// # Errors
///
/// Returns an error if `output_dir` is not a directory or any file fails to write.
pub fn export_batch_with_run_id<P: AsRef<Path>>(
    batch: &Batch,
    output_dir: P,
    run_id: RunId,
    format: OutputFormat,
    quality: u8,
) -> Result<ExportReport> {
    let output_dir = output_dir.as_ref();
    if !output_dir.is_dir() {
        return Err(Error::OutputDir {
            path: output_dir.to_path_buf(),
        });
    }

    tracing::info!("Saving run {run_id} to {}", output_dir.display());

    let pb = ProgressBar::new((batch.images.len() + batch.masks.len()) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Saving [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let mut report = ExportReport {
        run_id,
        images: Vec::with_capacity(batch.images.len()),
        masks: Vec::with_capacity(batch.masks.len()),
    };

    for (base, img) in &batch.images {
        let path = output_dir.join(image_file_name(base, run_id, format));
        tracing::debug!("Writing {}", path.display());
        save_image(img, &path, format, quality)?;
        report.images.push(path);
        pb.inc(1);
    }

    for (base, mask) in &batch.masks {
        let path = output_dir.join(mask_file_name(base, run_id, format));
        tracing::debug!("Writing {}", path.display());
        save_image(mask, &path, format, quality)?;
        report.masks.push(path);
        pb.inc(1);
    }

    pb.finish_and_clear();

    tracing::info!(
        "Saved {} images and {} masks",
        report.images.len(),
        report.masks.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};
    use std::fs;
    use tempfile::tempdir;

    fn batch(ids: &[&str], mask_ids: &[&str]) -> Batch {
        let mut batch = Batch::default();
        for id in ids {
            batch
                .images
                .insert((*id).to_string(), DynamicImage::new_rgb8(6, 4));
        }
        for id in mask_ids {
            batch.masks.insert(
                (*id).to_string(),
                DynamicImage::ImageLuma8(GrayImage::from_pixel(6, 4, Luma([255]))),
            );
        }
        batch
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_file_names() {
        let run_id = RunId::from_uuid(Uuid::nil());
        assert_eq!(
            image_file_name("cat", run_id, OutputFormat::Jpeg),
            "cat_ag00000000-0000-0000-0000-000000000000.jpg"
        );
        assert_eq!(
            mask_file_name("cat", run_id, OutputFormat::Png),
            "cat_ag00000000-0000-0000-0000-000000000000_mask.png"
        );
    }

    #[test]
    fn test_export_pair_shares_run_id() {
        let dir = tempdir().unwrap();
        let report = export_batch(&batch(&["cat"], &["cat"]), dir.path(), OutputFormat::Jpeg, 90)
            .unwrap();

        let run = report.run_id.to_string();
        assert_eq!(
            names(dir.path()),
            vec![format!("cat_ag{run}.jpg"), format!("cat_ag{run}_mask.jpg")]
        );
        assert_eq!(report.file_count(), 2);
    }

    #[test]
    fn test_export_images_only() {
        let dir = tempdir().unwrap();
        let report = export_batch(
            &batch(&["a", "b", "c"], &[]),
            dir.path(),
            OutputFormat::Png,
            95,
        )
        .unwrap();

        assert_eq!(report.images.len(), 3);
        assert!(report.masks.is_empty());
        assert_eq!(names(dir.path()).len(), 3);
        assert!(report.images.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_each_export_gets_new_run_id() {
        let dir = tempdir().unwrap();
        let b = batch(&["a"], &[]);

        let first = export_batch(&b, dir.path(), OutputFormat::Png, 95).unwrap();
        let second = export_batch(&b, dir.path(), OutputFormat::Png, 95).unwrap();

        assert_ne!(first.run_id, second.run_id);
        assert_eq!(names(dir.path()).len(), 2);
    }

    #[test]
    fn test_export_missing_dir() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = export_batch(&batch(&["a"], &[]), &missing, OutputFormat::Png, 95).unwrap_err();
        assert!(matches!(err, Error::OutputDir { ref path } if *path == missing));
    }
}
