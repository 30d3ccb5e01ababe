pub mod api;
pub mod batch;
pub mod cli;
pub mod error;
pub mod extraction;
pub mod parser;
pub mod pixel;
pub mod types;

pub use api::{DicomRecord, RecordBuilder};
pub use batch::{BatchOutput, BatchProcessor, FileStage, ProgressEvent};
pub use cli::report::TextReport;
pub use error::{DicomscanError, FormatError, PixelDecodeError, Result, TagDecodeError};
pub use extraction::{extract, lookup, CatalogEntry, ExtractedTags, TAG_CATALOG, TAG_NOT_FOUND};
pub use parser::{parse, read_file, DicomFile, TransferSyntax};
pub use pixel::{PixelArray, PixelGeometry};
pub use types::*;
