pub mod extractor;
pub mod tags;

pub use extractor::{extract, render_element, render_value, ExtractedTags, TAG_NOT_FOUND};
pub use tags::{lookup, CatalogEntry, CATALOG_LEN, TAG_CATALOG};
