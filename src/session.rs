//! Augmentation session: loaded folders, the current batch, and what can be done next.

use std::fmt;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Error, Result};
use crate::image::{load_folder, load_mask_folder, thumbnail, ImageMap};
use crate::pipeline::{augment_batch, export_batch, Batch, Config, ExportReport};

/// Progress of a session. States only advance, except that selecting a new input folder
/// returns to [`SessionState::FolderSelected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoFolder,
    FolderSelected,
    MaskFolderSelected,
    Augmented,
    Saved,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoFolder => "no folder",
            Self::FolderSelected => "folder selected",
            Self::MaskFolderSelected => "mask folder selected",
            Self::Augmented => "augmented",
            Self::Saved => "saved",
        })
    }
}

/// Holds source images and masks in memory, keyed by base identifier, together with the
/// most recent augmentation results.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    input_folder: Option<PathBuf>,
    mask_folder: Option<PathBuf>,
    images: ImageMap,
    masks: ImageMap,
    batch: Option<Batch>,
    last_export: Option<ExportReport>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::NoFolder,
            input_folder: None,
            mask_folder: None,
            images: ImageMap::new(),
            masks: ImageMap::new(),
            batch: None,
            last_export: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn input_folder(&self) -> Option<&Path> {
        self.input_folder.as_deref()
    }

    #[must_use]
    pub fn mask_folder(&self) -> Option<&Path> {
        self.mask_folder.as_deref()
    }

    /// Source images keyed by base identifier.
    #[must_use]
    pub fn images(&self) -> &ImageMap {
        &self.images
    }

    /// Source masks keyed by the base identifier of their image.
    #[must_use]
    pub fn masks(&self) -> &ImageMap {
        &self.masks
    }

    /// Results of the last augmentation, if still current.
    #[must_use]
    pub fn batch(&self) -> Option<&Batch> {
        self.batch.as_ref()
    }

    #[must_use]
    pub fn last_export(&self) -> Option<&ExportReport> {
        self.last_export.as_ref()
    }

    /// Whether `augment` has something to work on.
    #[must_use]
    pub fn can_augment(&self) -> bool {
        !self.images.is_empty()
    }

    /// Whether `save` has a batch to write.
    #[must_use]
    pub fn can_save(&self) -> bool {
        self.batch.is_some()
    }

    /// Load the images of `dir`, replacing any previous selection and discarding results.
    ///
    /// Returns the number of images loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be read, an image fails to decode, or no images
    /// are found. On error the session has no input folder.
    pub fn select_folder<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize> {
        let dir = dir.as_ref();

        self.batch = None;
        self.input_folder = None;
        self.images.clear();
        self.state = SessionState::NoFolder;

        let images = load_folder(dir)?;
        if images.is_empty() {
            return Err(Error::NoImages {
                path: dir.to_path_buf(),
            });
        }

        tracing::info!("Selected folder {}", dir.display());
        self.images = images;
        self.input_folder = Some(dir.to_path_buf());
        self.state = SessionState::FolderSelected;
        Ok(self.images.len())
    }

    /// Load the masks of `dir` (`*_mask.jpg` / `*_mask.png`), replacing previous masks and
    /// discarding results.
    ///
    /// Returns the number of masks loaded, which may be zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be read or a mask fails to decode. The previous
    /// masks are kept in that case.
    pub fn select_mask_folder<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize> {
        let dir = dir.as_ref();
        let masks = load_mask_folder(dir)?;

        let paired = masks
            .keys()
            .filter(|id| self.images.contains_key(*id))
            .count();
        tracing::info!(
            "Selected mask folder {} ({paired} of {} masks match an image)",
            dir.display(),
            masks.len()
        );

        self.masks = masks;
        self.mask_folder = Some(dir.to_path_buf());
        self.batch = None;
        if self.state != SessionState::NoFolder {
            self.state = SessionState::MaskFolderSelected;
        }
        Ok(self.masks.len())
    }

    /// Run the configured pipeline over every loaded image and its mask.
    ///
    /// # Errors
    ///
    /// Returns an error if no images are loaded or the configuration is invalid.
    pub fn augment(&mut self, config: &Config) -> Result<&Batch> {
        if !self.can_augment() {
            return Err(Error::NoFolderSelected);
        }
        config.validate()?;

        let pipeline = config.pipeline();
        tracing::info!(
            "Applying [{}] to {} images",
            pipeline
                .kinds()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            self.images.len()
        );

        let mut rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        let batch = augment_batch(
            &self.images,
            &self.masks,
            &pipeline,
            config.mask_policy,
            &mut rng,
        );

        self.state = SessionState::Augmented;
        Ok(self.batch.insert(batch))
    }

    /// Export the current batch to `output_dir` under a new run identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing has been augmented or writing fails. The batch and state
    /// are kept on failure so the save can be retried.
    pub fn save<P: AsRef<Path>>(&mut self, output_dir: P, config: &Config) -> Result<ExportReport> {
        let batch = self.batch.as_ref().ok_or(Error::NotAugmented)?;

        let report = export_batch(
            batch,
            output_dir,
            config.output_format,
            config.output_quality,
        )?;

        self.state = SessionState::Saved;
        self.last_export = Some(report.clone());
        Ok(report)
    }

    /// Thumbnail of the first augmented image, or of the first source image before
    /// augmentation.
    #[must_use]
    pub fn preview(&self) -> Option<DynamicImage> {
        self.batch
            .as_ref()
            .and_then(Batch::first_image)
            .or_else(|| self.images.values().next())
            .map(thumbnail)
    }
}
