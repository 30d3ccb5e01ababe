use crate::batch::FileStage;
use crate::error::{DicomscanError, Result};
use crate::extraction::{extract, ExtractedTags, TAG_CATALOG};
use crate::parser::{self, DicomFile};
use crate::pixel::{self, PixelArray};
use crate::types::{PixelErrorPolicy, RecordOptions};
use log::warn;
use std::path::{Path, PathBuf};

/// Builds one [`DicomRecord`] per file
///
/// Composes the tag extractor and the pixel decoder. A record is either
/// complete or not produced at all.
///
/// # Example
///
/// ```
/// use dicomscan_core::{parser, RecordBuilder, RecordOptions, TAG_NOT_FOUND};
///
/// // Raw implicit VR little endian dataset: Modality = "CT"
/// let bytes = [0x08, 0x00, 0x60, 0x00, 0x02, 0x00, 0x00, 0x00, b'C', b'T'];
/// let file = parser::parse(&bytes).unwrap();
///
/// let record = RecordBuilder::new(RecordOptions::default())
///     .build("ct.dcm", &file)
///     .unwrap();
///
/// assert_eq!(record.tags["Modality"], "CT");
/// assert_eq!(record.tags["PatientName"], TAG_NOT_FOUND);
/// assert!(record.pixel_data.is_none());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordBuilder {
    options: RecordOptions,
}

impl RecordBuilder {
    pub fn new(options: RecordOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> RecordOptions {
        self.options
    }

    /// Reads, parses and builds the record for one file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a valid
    /// dataset, or its pixel data fails under the configured policy.
    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<DicomRecord> {
        self.read_staged(path.as_ref(), |_| {})
    }

    /// [`read`](Self::read), reporting each stage the file completes
    pub(crate) fn read_staged<F>(&self, path: &Path, mut on_stage: F) -> Result<DicomRecord>
    where
        F: FnMut(FileStage),
    {
        let file = parser::read_file(path)?;
        on_stage(FileStage::Parsed);
        self.build_staged(path, &file, on_stage)
    }

    /// Builds the record for an already parsed file
    ///
    /// # Errors
    ///
    /// Returns [`DicomscanError::PixelError`] if the pixel data cannot be
    /// decoded and the policy does not allow dropping it.
    pub fn build<P: AsRef<Path>>(&self, path: P, file: &DicomFile) -> Result<DicomRecord> {
        self.build_staged(path.as_ref(), file, |_| {})
    }

    fn build_staged<F>(&self, path: &Path, file: &DicomFile, mut on_stage: F) -> Result<DicomRecord>
    where
        F: FnMut(FileStage),
    {
        let tags = self.extract_tags(file);
        on_stage(FileStage::Extracted);
        let pixel_data = self.decode_pixels(path, file)?;
        on_stage(FileStage::Done);
        Ok(DicomRecord {
            path: path.to_path_buf(),
            tags,
            pixel_data,
        })
    }

    /// Extracts the tag catalog from the top level of the dataset
    pub fn extract_tags(&self, file: &DicomFile) -> ExtractedTags {
        extract(file.dataset(), &TAG_CATALOG)
    }

    /// Decodes pixel data, applying the pixel error policy
    ///
    /// # Errors
    ///
    /// Returns [`DicomscanError::PixelError`] for every decoding failure
    /// under [`PixelErrorPolicy::Fail`], and for non-recoverable ones under
    /// [`PixelErrorPolicy::Degrade`].
    pub fn decode_pixels(&self, path: &Path, file: &DicomFile) -> Result<Option<PixelArray>> {
        match pixel::decode(file, self.options.modality_lut) {
            Ok(pixels) => Ok(pixels),
            Err(e) if self.options.pixel_policy == PixelErrorPolicy::Degrade && e.is_recoverable() => {
                warn!("{}: dropping pixel data: {}", path.display(), e);
                Ok(None)
            }
            Err(e) => Err(DicomscanError::PixelError(e)),
        }
    }
}

/// Everything extracted from one file
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct DicomRecord {
    /// Path the record was read from
    pub path: PathBuf,

    /// Catalog keyword to rendered value, one entry per catalog tag
    pub tags: ExtractedTags,

    /// Decoded samples, `None` when the file has no pixel data
    #[cfg_attr(feature = "json", serde(skip))]
    pub pixel_data: Option<PixelArray>,
}

impl DicomRecord {
    /// Shape of the pixel array, if any
    pub fn pixel_shape(&self) -> Option<&[usize]> {
        self.pixel_data.as_ref().map(|array| array.shape())
    }
}
