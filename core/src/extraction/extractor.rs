use crate::error::TagDecodeError;
use crate::extraction::tags::{lookup, CatalogEntry};
use crate::types::{DataElement, ElementTable, Scalar, Value};
use dicom_core::dictionary::DataDictionary;
use dicom_core::Tag;
use dicom_dictionary_std::StandardDataDictionary;
use std::collections::BTreeMap;

/// Output value for catalog tags absent from the dataset
pub const TAG_NOT_FOUND: &str = "Tag not found";

/// Catalog keyword to rendered value, one entry per catalog tag
pub type ExtractedTags = BTreeMap<String, String>;

/// Projects the top level of a dataset through a tag catalog
///
/// Every catalog entry produces exactly one output entry. Absent tags map
/// to [`TAG_NOT_FOUND`]. A tag whose bytes cannot be decoded maps to
/// `"Error: <message>"` and does not affect the other entries.
///
/// # Example
///
/// ```
/// use dicomscan_core::extraction::{extract, TAG_CATALOG, TAG_NOT_FOUND};
/// use dicomscan_core::ElementTable;
///
/// let tags = extract(&ElementTable::new(), &TAG_CATALOG);
/// assert_eq!(tags.len(), TAG_CATALOG.len());
/// assert_eq!(tags["Modality"], TAG_NOT_FOUND);
/// ```
pub fn extract(table: &ElementTable, catalog: &[CatalogEntry]) -> ExtractedTags {
    catalog
        .iter()
        .map(|entry| {
            let rendered = match table.get(entry.tag) {
                None => TAG_NOT_FOUND.to_string(),
                Some(element) => match render_element(element) {
                    Ok(s) => s,
                    Err(e) => format!("Error: {}", e),
                },
            };
            (entry.name.to_string(), rendered)
        })
        .collect()
}

/// Renders one element into its human-readable string form
pub fn render_element(element: &DataElement) -> Result<String, TagDecodeError> {
    render_value(&element.value()?)
}

/// Renders a decoded value
///
/// - Empty values render as `""`
/// - Scalars render plainly: `Doe^John`, `512`, `-1024`
/// - Multiple values render as a list, quoting text: `['ORIGINAL', 'PRIMARY']`, `[0.5, 0.5]`
/// - Sequences render as a list of `{Keyword: value, ...}` items
pub fn render_value(value: &Value<'_>) -> Result<String, TagDecodeError> {
    let rendered = match value {
        Value::Empty => String::new(),
        Value::Scalar(s) => s.to_string(),
        Value::Multi(values) => {
            let parts: Vec<String> = values.iter().map(render_list_component).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Sequence(items) => {
            let parts = items
                .iter()
                .map(render_item)
                .collect::<Result<Vec<_>, _>>()?;
            format!("[{}]", parts.join(", "))
        }
        Value::Bytes(len) => format!("<{} bytes>", len),
        Value::Encapsulated(fragments) => format!("<{} fragments>", fragments),
    };
    Ok(rendered)
}

fn render_list_component(scalar: &Scalar) -> String {
    if scalar.is_text() {
        format!("'{}'", scalar)
    } else {
        scalar.to_string()
    }
}

fn render_item(item: &ElementTable) -> Result<String, TagDecodeError> {
    let mut parts = Vec::with_capacity(item.len());
    for element in item {
        let rendered = render_element(element).map_err(|e| TagDecodeError::Nested {
            tag: element.tag(),
            source: Box::new(e),
        })?;
        parts.push(format!("{}: {}", keyword(element.tag()), rendered));
    }
    Ok(format!("{{{}}}", parts.join(", ")))
}

/// Dictionary keyword of a nested tag
fn keyword(tag: Tag) -> String {
    StandardDataDictionary
        .by_tag(tag)
        .map(|entry| entry.alias.to_string())
        .unwrap_or_else(|| lookup(tag))
}
