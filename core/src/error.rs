use dicom_core::{Tag, VR};
use std::time::Duration;
use thiserror::Error;

/// Result type for dicomscan operations
pub type Result<T> = std::result::Result<T, DicomscanError>;

/// File-level error types
///
/// Any of these marks a single file as failed. The batch orchestrator
/// turns them into report entries and moves on to the next path.
#[derive(Error, Debug)]
pub enum DicomscanError {
    /// I/O error while reading a file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The byte stream is not a readable DICOM dataset
    #[error("DICOM format error: {0}")]
    FormatError(#[from] FormatError),

    /// Pixel data could not be decoded
    #[error("Pixel data error: {0}")]
    PixelError(#[from] PixelDecodeError),

    /// The per-file timeout fired before the file was done
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The worker pool could not be created
    #[error("Worker pool error: {0}")]
    ThreadPool(String),

    /// Processing the file panicked
    #[error("Processing panicked: {0}")]
    Panic(String),
}

impl From<rayon::ThreadPoolBuildError> for DicomscanError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        DicomscanError::ThreadPool(e.to_string())
    }
}

/// Structural errors found while walking the binary dataset
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// No DICM marker and the header heuristic found no dataset either
    #[error("not a DICOM file: missing DICM marker and no recognizable dataset")]
    NotDicom,

    /// A length field points past the end of the available bytes
    #[error("truncated {context} at offset {offset}: needs {needed} bytes but {remaining} remain")]
    Truncated {
        context: String,
        offset: usize,
        needed: u64,
        remaining: usize,
    },

    /// Explicit VR bytes that are neither a known VR nor resolvable by dictionary
    #[error("unrecognized VR {:?} for element {tag}", String::from_utf8_lossy(.vr))]
    UnknownVr { tag: Tag, vr: [u8; 2] },

    /// Undefined length on an element that cannot be delimited
    #[error("undefined length on element {tag} with VR {vr}")]
    UndefinedLength { tag: Tag, vr: VR },

    /// A delimiter or item tag showed up where something else was required
    #[error("unexpected tag {tag} at offset {offset}, expected {expected}")]
    UnexpectedTag {
        tag: Tag,
        offset: usize,
        expected: &'static str,
    },

    /// Sequence nesting beyond the supported depth
    #[error("sequence nesting exceeds {max} levels")]
    NestingTooDeep { max: usize },

    /// Deflated transfer syntax could not be inflated
    #[error("failed to inflate deflated dataset: {0}")]
    Deflate(String),
}

/// Failure to turn one element's bytes into a typed value
///
/// Always scoped to a single tag. The extractor renders it into the
/// tag's output string instead of failing the file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TagDecodeError {
    /// Numeric text (DS, IS) that does not parse
    #[error("invalid {vr} value '{text}'")]
    InvalidNumber { vr: VR, text: String },

    /// Binary value whose length does not match the VR's width
    #[error("{len} bytes is not a multiple of the {vr} value width {width}")]
    LengthMismatch { vr: VR, len: usize, width: usize },

    /// Failure inside a sequence item
    #[error("in item element {tag}: {source}")]
    Nested {
        tag: Tag,
        #[source]
        source: Box<TagDecodeError>,
    },
}

/// Errors raised by the pixel decoder
#[derive(Error, Debug)]
pub enum PixelDecodeError {
    /// A geometry attribute needed for decoding is absent
    #[error("missing required attribute {0}")]
    MissingAttribute(&'static str),

    /// A geometry attribute is present but unusable
    #[error("invalid value for {name}: {value}")]
    InvalidAttribute { name: &'static str, value: String },

    /// Compression scheme the decoder cannot handle
    #[error("unsupported transfer syntax for pixel data: {name} ({uid})")]
    UnsupportedSyntax { uid: String, name: String },

    /// Pixel layout the decoder cannot handle
    #[error("unsupported pixel layout: {0}")]
    UnsupportedLayout(String),

    /// Fewer bytes than the geometry requires
    #[error("pixel data holds {actual} bytes but the geometry requires {expected}")]
    InsufficientData { expected: usize, actual: usize },

    /// Encapsulated data without a fragment for a frame
    #[error("no fragment data for frame {frame}")]
    MissingFragment { frame: usize },

    /// Corrupt RLE stream
    #[error("RLE decoding failed: {0}")]
    Rle(String),

    /// Corrupt or unsupported JPEG stream
    #[error("JPEG decoding failed: {0}")]
    Jpeg(String),

    /// Unsigned 32-bit sample beyond the i32 range
    #[error("sample value {0} does not fit a signed 32-bit integer")]
    ValueOutOfRange(u32),

    /// Decoded buffer does not match the computed shape
    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl PixelDecodeError {
    /// Whether the file may still produce a record without pixel data
    ///
    /// Only unsupported compression is recoverable. Missing geometry and
    /// corrupt streams indicate a broken file.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PixelDecodeError::UnsupportedSyntax { .. })
    }
}
