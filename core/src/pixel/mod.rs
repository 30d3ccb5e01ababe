//! Pixel data decoding
//!
//! Turns the pixel data element of a parsed file into an `i32` array of
//! shape `(frames, rows, columns)`, or `(frames, rows, columns, samples)`
//! for multi-sample images. Native data is read directly, RLE Lossless is
//! decoded in-crate and the JPEG processes go through `jpeg-decoder`.
//!
//! Every codec first produces the stored sample words in interleaved
//! order. Normalization then masks unsigned words to BitsStored and
//! sign-extends signed ones, so CT data keeps its negative values.

mod jpeg;
mod native;
mod rle;

use crate::error::PixelDecodeError;
use crate::extraction::tags::{
    get_float_value, get_int_value, BITS_ALLOCATED, BITS_STORED, COLUMNS, NUMBER_OF_FRAMES,
    PIXEL_DATA, PIXEL_REPRESENTATION, PLANAR_CONFIGURATION, RESCALE_INTERCEPT, RESCALE_SLOPE,
    ROWS, SAMPLES_PER_PIXEL,
};
use crate::parser::{DicomFile, PixelCodec};
use crate::types::{ElementBody, ElementTable, ModalityLut, PixelFragments};
use dicom_core::Tag;
use log::debug;
use ndarray::{Array, ArrayD, IxDyn};

/// Decoded pixel samples
pub type PixelArray = ArrayD<i32>;

/// Image Pixel module attributes needed to lay out the samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelGeometry {
    pub rows: usize,
    pub columns: usize,
    pub frames: usize,
    pub samples_per_pixel: usize,
    pub bits_allocated: u16,
    pub bits_stored: u16,
    /// PixelRepresentation 1: two's complement samples
    pub signed: bool,
    /// PlanarConfiguration 1: one plane per sample within each frame
    pub planar: bool,
}

impl PixelGeometry {
    /// Reads the geometry from the top level of a dataset
    ///
    /// # Errors
    ///
    /// Returns [`PixelDecodeError::MissingAttribute`] when Rows, Columns or
    /// BitsAllocated is absent, and [`PixelDecodeError::InvalidAttribute`]
    /// for values outside what the decoder accepts.
    pub fn from_table(table: &ElementTable) -> Result<Self, PixelDecodeError> {
        let rows = required(table, ROWS, "Rows")?;
        let columns = required(table, COLUMNS, "Columns")?;
        let bits_allocated = required(table, BITS_ALLOCATED, "BitsAllocated")?;
        let frames = get_int_value(table, NUMBER_OF_FRAMES).unwrap_or(1);
        let samples_per_pixel = get_int_value(table, SAMPLES_PER_PIXEL).unwrap_or(1);
        let bits_stored = get_int_value(table, BITS_STORED).unwrap_or(bits_allocated);
        let representation = get_int_value(table, PIXEL_REPRESENTATION).unwrap_or(0);
        let planar = get_int_value(table, PLANAR_CONFIGURATION).unwrap_or(0);

        if !matches!(bits_allocated, 1 | 8 | 16 | 32) {
            return Err(invalid("BitsAllocated", bits_allocated));
        }
        if bits_stored < 1 || bits_stored > bits_allocated {
            return Err(invalid("BitsStored", bits_stored));
        }
        if frames < 1 {
            return Err(invalid("NumberOfFrames", frames));
        }
        if samples_per_pixel < 1 {
            return Err(invalid("SamplesPerPixel", samples_per_pixel));
        }

        let geometry = PixelGeometry {
            rows: to_usize(rows, "Rows")?,
            columns: to_usize(columns, "Columns")?,
            frames: to_usize(frames, "NumberOfFrames")?,
            samples_per_pixel: to_usize(samples_per_pixel, "SamplesPerPixel")?,
            bits_allocated: bits_allocated as u16,
            bits_stored: bits_stored as u16,
            signed: representation == 1,
            planar: planar == 1,
        };
        if geometry.checked_byte_len().is_none() {
            return Err(invalid("NumberOfFrames", frames));
        }
        Ok(geometry)
    }

    /// Samples in one frame, saturating on overflow
    pub fn frame_len(&self) -> usize {
        self.rows
            .saturating_mul(self.columns)
            .saturating_mul(self.samples_per_pixel)
    }

    /// Samples in the whole image, saturating on overflow
    pub fn sample_count(&self) -> usize {
        self.frame_len().saturating_mul(self.frames)
    }

    /// Bytes of uncompressed pixel data the geometry describes
    ///
    /// Returns `None` when the size overflows or the decoded `i32` array
    /// could not be addressed.
    pub fn checked_byte_len(&self) -> Option<usize> {
        let samples = self
            .rows
            .checked_mul(self.columns)?
            .checked_mul(self.samples_per_pixel)?
            .checked_mul(self.frames)?;
        // decoded samples take four bytes each
        if samples.checked_mul(4)? > isize::MAX as usize {
            return None;
        }
        Some(samples.checked_mul(usize::from(self.bits_allocated))?.div_ceil(8))
    }

    /// Output array shape
    pub fn shape(&self) -> Vec<usize> {
        if self.samples_per_pixel > 1 {
            vec![self.frames, self.rows, self.columns, self.samples_per_pixel]
        } else {
            vec![self.frames, self.rows, self.columns]
        }
    }

    /// Converts a stored sample word to its `i32` value
    ///
    /// # Errors
    ///
    /// Returns [`PixelDecodeError::ValueOutOfRange`] for unsigned words
    /// that do not fit an `i32`.
    pub fn normalize(&self, word: u32) -> Result<i32, PixelDecodeError> {
        let bits = u32::from(self.bits_stored);
        let value = if bits >= 32 {
            word
        } else {
            word & ((1u32 << bits) - 1)
        };

        if self.signed {
            let shift = 32 - bits;
            Ok(((value << shift) as i32) >> shift)
        } else {
            i32::try_from(value).map_err(|_| PixelDecodeError::ValueOutOfRange(value))
        }
    }
}

fn required(table: &ElementTable, tag: Tag, name: &'static str) -> Result<i64, PixelDecodeError> {
    get_int_value(table, tag).ok_or(PixelDecodeError::MissingAttribute(name))
}

fn invalid(name: &'static str, value: i64) -> PixelDecodeError {
    PixelDecodeError::InvalidAttribute {
        name,
        value: value.to_string(),
    }
}

fn to_usize(value: i64, name: &'static str) -> Result<usize, PixelDecodeError> {
    usize::try_from(value).map_err(|_| invalid(name, value))
}

/// Decodes the pixel data of a parsed file
///
/// Returns `Ok(None)` when the dataset has no pixel data element.
///
/// # Errors
///
/// Returns a [`PixelDecodeError`] if:
/// - A required geometry attribute is missing or invalid
/// - The transfer syntax uses a compression this crate does not decode
/// - The pixel bytes are shorter than the geometry requires or corrupt
/// - An unsigned 32-bit sample does not fit an `i32`
pub fn decode(file: &DicomFile, lut: ModalityLut) -> Result<Option<PixelArray>, PixelDecodeError> {
    let dataset = file.dataset();
    let element = match dataset.get(PIXEL_DATA) {
        Some(element) => element,
        None => return Ok(None),
    };

    let ts = file.transfer_syntax();
    if ts.codec() == PixelCodec::Unsupported {
        return Err(PixelDecodeError::UnsupportedSyntax {
            uid: ts.uid().to_string(),
            name: ts.name().to_string(),
        });
    }

    let geometry = PixelGeometry::from_table(dataset)?;
    debug!(
        "Decoding {} pixel data: {:?}",
        ts.name(),
        geometry
    );

    let words = match (element.body(), ts.codec()) {
        (ElementBody::Primitive(bytes), _) => {
            native::decode(bytes, &geometry, element.byte_order(), element.vr())?
        }
        (ElementBody::Encapsulated(pixels), PixelCodec::RleLossless) => {
            rle::decode(pixels, &geometry)?
        }
        (ElementBody::Encapsulated(pixels), PixelCodec::Jpeg) => jpeg::decode(pixels, &geometry)?,
        (ElementBody::Encapsulated(_), _) => {
            return Err(PixelDecodeError::UnsupportedLayout(
                "encapsulated pixel data in a native transfer syntax".to_string(),
            ))
        }
        (ElementBody::Sequence(_), _) => {
            return Err(PixelDecodeError::UnsupportedLayout(
                "pixel data element holds sequence items".to_string(),
            ))
        }
    };

    let mut samples = words
        .into_iter()
        .map(|word| geometry.normalize(word))
        .collect::<Result<Vec<i32>, _>>()?;

    if lut == ModalityLut::Rescale {
        apply_rescale(&mut samples, dataset, &geometry);
    }

    let array = Array::from_shape_vec(IxDyn(&geometry.shape()), samples)?;
    Ok(Some(array))
}

/// Applies RescaleSlope and RescaleIntercept to single-sample images
fn apply_rescale(samples: &mut [i32], table: &ElementTable, geometry: &PixelGeometry) {
    if geometry.samples_per_pixel != 1 {
        return;
    }
    let slope = get_float_value(table, RESCALE_SLOPE).unwrap_or(1.0);
    let intercept = get_float_value(table, RESCALE_INTERCEPT).unwrap_or(0.0);
    if slope == 1.0 && intercept == 0.0 {
        return;
    }
    for sample in samples.iter_mut() {
        *sample = (f64::from(*sample) * slope + intercept).round() as i32;
    }
}

/// Splits encapsulated fragments into one byte buffer per frame
///
/// A single frame takes every fragment. Otherwise fragments map one to one
/// onto frames, or are grouped through the basic offset table.
pub(crate) fn frame_data(
    pixels: &PixelFragments,
    frames: usize,
) -> Result<Vec<Vec<u8>>, PixelDecodeError> {
    let fragments = &pixels.fragments;
    if fragments.is_empty() {
        return Err(PixelDecodeError::MissingFragment { frame: 0 });
    }

    if frames == 1 {
        return Ok(vec![fragments.concat()]);
    }
    if fragments.len() == frames {
        return Ok(fragments.clone());
    }
    if pixels.offset_table.len() != frames {
        return Err(PixelDecodeError::MissingFragment {
            frame: fragments.len().min(frames),
        });
    }

    // offsets count from the first fragment item, headers included
    let mut grouped = vec![Vec::new(); frames];
    let mut position = 0usize;
    for fragment in fragments {
        let frame = pixels
            .offset_table
            .iter()
            .rposition(|&offset| offset as usize <= position)
            .unwrap_or(0);
        grouped[frame].extend_from_slice(fragment);
        position += fragment.len() + 8;
    }

    match grouped.iter().position(Vec::is_empty) {
        Some(frame) => Err(PixelDecodeError::MissingFragment { frame }),
        None => Ok(grouped),
    }
}
