//! Core type definitions for parsed DICOM data
//!
//! This module provides the fundamental types used throughout the dicomscan library:
//! - [`ElementTable`]: One dataset level of parsed [`DataElement`]s, keyed by tag
//! - [`Value`] and [`Scalar`]: Decoded form of an element
//! - [`BatchConfig`]: Worker count, timeout and decoding options for a batch run
//! - [`BatchReport`]: Totals and per-file failures of a batch run

mod config;
mod element;
mod report;
mod value;

pub use config::{default_concurrency, BatchConfig, ModalityLut, PixelErrorPolicy, RecordOptions};
pub use element::{DataElement, ElementBody, ElementTable, PixelFragments};
pub use report::{BatchReport, FileError};
pub use value::{decode_primitive, Scalar, Value};
