//! Binary DICOM dataset parsing
//!
//! This module turns the bytes of a DICOM file into [`ElementTable`]s:
//! - Locates the `DICM` marker (with or without the 128-byte preamble)
//! - Reads the file meta group, always explicit VR little endian
//! - Resolves the [`TransferSyntax`] that encodes the rest of the file
//! - Walks the dataset, recursing into sequences and collecting the
//!   fragments of encapsulated pixel data
//!
//! Files without a marker are accepted when their first element header
//! looks like a little endian dataset.

mod dataset;
mod reader;
mod transfer_syntax;

pub use dataset::MAX_NESTING_DEPTH;
pub use transfer_syntax::{Endianness, PixelCodec, TransferSyntax};
pub use transfer_syntax::{
    DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN, EXPLICIT_VR_BIG_ENDIAN, EXPLICIT_VR_LITTLE_ENDIAN,
    IMPLICIT_VR_LITTLE_ENDIAN, JPEG_BASELINE, JPEG_EXTENDED, JPEG_LOSSLESS_NON_HIERARCHICAL,
    JPEG_LOSSLESS_SV1, RLE_LOSSLESS,
};

use crate::error::{FormatError, Result};
use crate::extraction::tags::TRANSFER_SYNTAX_UID;
use crate::types::ElementTable;
use dataset::{has_long_length, DatasetParser};
use dicom_core::VR;
use flate2::read::DeflateDecoder;
use log::debug;
use reader::ByteReader;
use std::io::Read;
use std::path::Path;

const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";

/// A parsed DICOM file
#[derive(Debug, Clone, PartialEq)]
pub struct DicomFile {
    meta: ElementTable,
    dataset: ElementTable,
    transfer_syntax: TransferSyntax,
}

impl DicomFile {
    /// File meta group (group 0002), empty for raw datasets
    pub fn meta(&self) -> &ElementTable {
        &self.meta
    }

    /// Top level of the main dataset
    pub fn dataset(&self) -> &ElementTable {
        &self.dataset
    }

    /// Transfer syntax the dataset was encoded with
    pub fn transfer_syntax(&self) -> &TransferSyntax {
        &self.transfer_syntax
    }
}

/// Parses a complete DICOM file held in memory
///
/// # Example
///
/// ```
/// use dicomscan_core::parser;
///
/// // Raw implicit VR little endian dataset holding Rows = 512
/// let bytes = [0x28, 0x00, 0x10, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x02];
/// let file = parser::parse(&bytes).unwrap();
/// assert_eq!(file.dataset().len(), 1);
/// assert!(file.meta().is_empty());
/// ```
///
/// # Errors
///
/// Returns a [`FormatError`] if:
/// - There is no `DICM` marker and no recognizable dataset
/// - A length field points past the end of the data
/// - An element header cannot be resolved
/// - A deflated dataset cannot be inflated
pub fn parse(bytes: &[u8]) -> std::result::Result<DicomFile, FormatError> {
    match locate_meta(bytes) {
        Some(start) => parse_with_meta(bytes, start),
        None => parse_raw(bytes),
    }
}

/// Parses a meta group at `start` followed by the dataset it describes
fn parse_with_meta(bytes: &[u8], start: usize) -> std::result::Result<DicomFile, FormatError> {
    let mut reader = ByteReader::new(&bytes[start..], start);
    let meta = DatasetParser::meta().parse_meta_group(&mut reader)?;
    let body_start = reader.position();
    let body = &bytes[body_start..];

    let transfer_syntax = match transfer_syntax_uid(&meta) {
        Some(uid) => TransferSyntax::from_uid(&uid),
        None => {
            let detected = detect_raw_encoding(body)
                .unwrap_or_else(TransferSyntax::explicit_vr_little_endian);
            debug!(
                "No transfer syntax in file meta, reading dataset as {}",
                detected.name()
            );
            detected
        }
    };
    debug!(
        "Transfer syntax {} ({}), dataset at offset {}",
        transfer_syntax.name(),
        transfer_syntax.uid(),
        body_start
    );

    let dataset = if transfer_syntax.is_deflated() {
        let inflated = inflate(body)?;
        let mut reader = ByteReader::new(&inflated, 0);
        DatasetParser::new(&transfer_syntax).parse_dataset(&mut reader)?
    } else {
        let mut reader = ByteReader::new(body, body_start);
        DatasetParser::new(&transfer_syntax).parse_dataset(&mut reader)?
    };

    Ok(DicomFile {
        meta,
        dataset,
        transfer_syntax,
    })
}

/// Reads a whole file into memory and parses it
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid dataset.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<DicomFile> {
    let bytes = std::fs::read(path.as_ref())?;
    Ok(parse(&bytes)?)
}

/// Offset of the first meta element, if the file carries a marker
fn locate_meta(bytes: &[u8]) -> Option<usize> {
    if bytes.get(PREAMBLE_LEN..PREAMBLE_LEN + 4) == Some(MAGIC.as_slice()) {
        return Some(PREAMBLE_LEN + 4);
    }
    if bytes.starts_with(MAGIC) {
        return Some(MAGIC.len());
    }
    None
}

/// Parses a buffer without a marker
fn parse_raw(bytes: &[u8]) -> std::result::Result<DicomFile, FormatError> {
    let transfer_syntax = detect_raw_encoding(bytes).ok_or(FormatError::NotDicom)?;

    // meta group written without preamble or marker
    if bytes.get(..2) == Some([0x02, 0x00].as_slice()) && transfer_syntax.is_explicit_vr() {
        debug!("No DICM marker, file starts with a bare meta group");
        return parse_with_meta(bytes, 0);
    }

    debug!(
        "No DICM marker, parsing raw dataset as {}",
        transfer_syntax.name()
    );
    let mut reader = ByteReader::new(bytes, 0);
    let dataset = DatasetParser::new(&transfer_syntax).parse_dataset(&mut reader)?;
    Ok(DicomFile {
        meta: ElementTable::new(),
        dataset,
        transfer_syntax,
    })
}

/// Guesses the encoding of a dataset from its first element header
///
/// Only little endian encodings are recognized. A header qualifies when its
/// group is even and its length fits in the buffer.
fn detect_raw_encoding(bytes: &[u8]) -> Option<TransferSyntax> {
    let header = bytes.get(..8)?;
    let order = Endianness::Little;
    let group = order.read_u16(&header[0..2]);
    if group % 2 == 1 || !(0x0002..=0x7FE0).contains(&group) {
        return None;
    }
    let available = (bytes.len() - 8) as u64;

    if let Some(vr) = VR::from_binary([header[4], header[5]]) {
        let len = if has_long_length(vr) {
            bytes.get(8..12).map(|b| order.read_u32(b))? as u64
        } else {
            order.read_u16(&header[6..8]) as u64
        };
        if len == 0xFFFF_FFFF || len <= available {
            return Some(TransferSyntax::explicit_vr_little_endian());
        }
    }

    let len = order.read_u32(&header[4..8]) as u64;
    if len == 0xFFFF_FFFF || len <= available {
        return Some(TransferSyntax::implicit_vr_little_endian());
    }
    None
}

fn transfer_syntax_uid(meta: &ElementTable) -> Option<String> {
    let value = meta.value(TRANSFER_SYNTAX_UID)?.ok()?;
    value.first().map(ToString::to_string)
}

fn inflate(bytes: &[u8]) -> std::result::Result<Vec<u8>, FormatError> {
    let mut inflated = Vec::new();
    DeflateDecoder::new(bytes)
        .read_to_end(&mut inflated)
        .map_err(|e| FormatError::Deflate(e.to_string()))?;
    Ok(inflated)
}
