use crate::error::TagDecodeError;
use crate::parser::Endianness;
use crate::types::value::{decode_primitive, Value};
use dicom_core::{Tag, VR};
use std::collections::btree_map::{self, BTreeMap};

/// Encapsulated pixel data: basic offset table plus fragments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelFragments {
    /// Frame offsets from the first item, possibly empty
    pub offset_table: Vec<u32>,
    /// Fragment payloads in stream order
    pub fragments: Vec<Vec<u8>>,
}

/// What a data element holds once parsed
#[derive(Debug, Clone, PartialEq)]
pub enum ElementBody {
    /// Raw value bytes, decoded on demand
    Primitive(Vec<u8>),
    /// Sequence items, each a nested dataset
    Sequence(Vec<ElementTable>),
    /// Encapsulated pixel data
    Encapsulated(PixelFragments),
}

/// A single parsed data element
#[derive(Debug, Clone, PartialEq)]
pub struct DataElement {
    tag: Tag,
    vr: VR,
    byte_order: Endianness,
    body: ElementBody,
}

impl DataElement {
    pub fn new(tag: Tag, vr: VR, byte_order: Endianness, body: ElementBody) -> Self {
        Self {
            tag,
            vr,
            byte_order,
            body,
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn vr(&self) -> VR {
        self.vr
    }

    /// Byte order the value bytes were written in
    pub fn byte_order(&self) -> Endianness {
        self.byte_order
    }

    pub fn body(&self) -> &ElementBody {
        &self.body
    }

    /// Raw value bytes of a primitive element
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        match &self.body {
            ElementBody::Primitive(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Items of a sequence element
    pub fn items(&self) -> Option<&[ElementTable]> {
        match &self.body {
            ElementBody::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Fragments of encapsulated pixel data
    pub fn fragments(&self) -> Option<&PixelFragments> {
        match &self.body {
            ElementBody::Encapsulated(fragments) => Some(fragments),
            _ => None,
        }
    }

    /// Decodes the element into its typed value
    ///
    /// # Errors
    ///
    /// Returns a [`TagDecodeError`] when the bytes do not match the VR,
    /// for example malformed numeric text.
    pub fn value(&self) -> Result<Value<'_>, TagDecodeError> {
        match &self.body {
            ElementBody::Primitive(bytes) => decode_primitive(self.vr, bytes, self.byte_order),
            ElementBody::Sequence(items) => Ok(Value::Sequence(items)),
            ElementBody::Encapsulated(pixels) => Ok(Value::Encapsulated(pixels.fragments.len())),
        }
    }
}

/// All data elements of one dataset level, keyed by tag
///
/// Iterates in ascending tag order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementTable {
    elements: BTreeMap<Tag, DataElement>,
}

impl ElementTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an element, returning the one it replaced
    pub fn insert(&mut self, element: DataElement) -> Option<DataElement> {
        self.elements.insert(element.tag, element)
    }

    pub fn get(&self, tag: Tag) -> Option<&DataElement> {
        self.elements.get(&tag)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.elements.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> btree_map::Values<'_, Tag, DataElement> {
        self.elements.values()
    }

    /// Decoded value of an element, `None` when the tag is absent
    pub fn value(&self, tag: Tag) -> Option<Result<Value<'_>, TagDecodeError>> {
        self.get(tag).map(DataElement::value)
    }
}

impl FromIterator<DataElement> for ElementTable {
    fn from_iter<I: IntoIterator<Item = DataElement>>(iter: I) -> Self {
        let mut table = ElementTable::new();
        for element in iter {
            table.insert(element);
        }
        table
    }
}

impl<'a> IntoIterator for &'a ElementTable {
    type Item = &'a DataElement;
    type IntoIter = btree_map::Values<'a, Tag, DataElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
