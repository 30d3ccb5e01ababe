use crate::error::FormatError;
use crate::parser::reader::ByteReader;
use crate::parser::{Endianness, TransferSyntax};
use crate::types::{DataElement, ElementBody, ElementTable, PixelFragments};
use dicom_core::dictionary::DataDictionary;
use dicom_core::{Tag, VR};
use dicom_dictionary_std::StandardDataDictionary;
use log::debug;

pub(crate) const ITEM: Tag = Tag(0xFFFE, 0xE000);
pub(crate) const ITEM_DELIMITATION: Tag = Tag(0xFFFE, 0xE00D);
pub(crate) const SEQUENCE_DELIMITATION: Tag = Tag(0xFFFE, 0xE0DD);
pub(crate) const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

/// Length field value meaning "delimited, not counted"
pub(crate) const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

/// Deepest sequence nesting accepted before giving up on a file
pub const MAX_NESTING_DEPTH: usize = 64;

/// Decoded element header
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Header {
    pub tag: Tag,
    pub vr: VR,
    pub len: u32,
    pub offset: usize,
}

impl Header {
    fn is_undefined_length(&self) -> bool {
        self.len == UNDEFINED_LENGTH
    }
}

/// VRs whose explicit header carries two reserved bytes and a 32-bit length
pub(crate) fn has_long_length(vr: VR) -> bool {
    use VR::*;
    matches!(
        vr,
        OB | OD | OF | OL | OV | OW | SQ | SV | UC | UN | UR | UT | UV
    )
}

/// VR of a tag according to the standard dictionary, for implicit VR data
///
/// Group lengths are UL and private creators are LO. Tags the dictionary
/// does not know are UN.
pub(crate) fn implicit_vr(tag: Tag) -> VR {
    dictionary_vr(tag).unwrap_or(VR::UN)
}

fn dictionary_vr(tag: Tag) -> Option<VR> {
    if tag.1 == 0x0000 {
        return Some(VR::UL);
    }
    if tag.0 % 2 == 1 {
        return if (0x0010..=0x00FF).contains(&tag.1) {
            Some(VR::LO)
        } else {
            None
        };
    }
    StandardDataDictionary
        .by_tag(tag)
        .map(|entry| entry.vr.relaxed())
}

/// Recursive walker turning encoded bytes into element tables
#[derive(Debug, Clone, Copy)]
pub(crate) struct DatasetParser {
    order: Endianness,
    explicit_vr: bool,
}

impl DatasetParser {
    /// Parser for the dataset encoding of a transfer syntax
    pub fn new(ts: &TransferSyntax) -> Self {
        Self {
            order: ts.byte_order(),
            explicit_vr: ts.is_explicit_vr(),
        }
    }

    /// Parser for the file meta group, always explicit VR little endian
    pub fn meta() -> Self {
        Self {
            order: Endianness::Little,
            explicit_vr: true,
        }
    }

    /// Parser for items of an undefined-length UN element
    fn implicit_little_endian() -> Self {
        Self {
            order: Endianness::Little,
            explicit_vr: false,
        }
    }

    /// Parses a whole dataset until the reader is exhausted
    pub fn parse_dataset(&self, reader: &mut ByteReader<'_>) -> Result<ElementTable, FormatError> {
        self.parse_elements(reader, false, 0)
    }

    /// Parses the leading group 0002 elements and stops at the first other group
    pub fn parse_meta_group(&self, reader: &mut ByteReader<'_>) -> Result<ElementTable, FormatError> {
        let mut table = ElementTable::new();
        while let Some(group) = reader.peek(2) {
            if self.order.read_u16(group) != 0x0002 {
                break;
            }
            let header = self.read_header(reader)?;
            let element = self.parse_element(header, reader, 0)?;
            table.insert(element);
        }
        Ok(table)
    }

    fn parse_elements(
        &self,
        reader: &mut ByteReader<'_>,
        until_delimiter: bool,
        depth: usize,
    ) -> Result<ElementTable, FormatError> {
        let mut table = ElementTable::new();

        while !reader.is_empty() {
            let header = self.read_header(reader)?;
            match header.tag {
                ITEM_DELIMITATION if until_delimiter => return Ok(table),
                ITEM_DELIMITATION | SEQUENCE_DELIMITATION => {
                    debug!(
                        "Ignoring stray delimiter {} at offset {}",
                        header.tag, header.offset
                    );
                }
                ITEM => {
                    return Err(FormatError::UnexpectedTag {
                        tag: header.tag,
                        offset: header.offset,
                        expected: "a data element",
                    });
                }
                tag => {
                    let element = self.parse_element(header, reader, depth)?;
                    if table.insert(element).is_some() {
                        debug!("Duplicate element {} replaced at offset {}", tag, header.offset);
                    }
                }
            }
        }

        if until_delimiter {
            return Err(FormatError::Truncated {
                context: "item without delimitation".to_string(),
                offset: reader.position(),
                needed: 8,
                remaining: 0,
            });
        }
        Ok(table)
    }

    pub(crate) fn read_header(&self, reader: &mut ByteReader<'_>) -> Result<Header, FormatError> {
        let offset = reader.position();
        let group = reader.read_u16(self.order, "element header")?;
        let element = reader.read_u16(self.order, "element header")?;
        let tag = Tag(group, element);

        // items and delimiters never carry a VR
        if group == 0xFFFE {
            let len = reader.read_u32(self.order, "item length")?;
            return Ok(Header {
                tag,
                vr: VR::UN,
                len,
                offset,
            });
        }

        if !self.explicit_vr {
            let len = reader.read_u32(self.order, "element length")?;
            return Ok(Header {
                tag,
                vr: implicit_vr(tag),
                len,
                offset,
            });
        }

        let vr_bytes = reader.take(2, || format!("VR of {}", tag))?;
        let vr_chars = [vr_bytes[0], vr_bytes[1]];
        match VR::from_binary(vr_chars) {
            Some(vr) if has_long_length(vr) => {
                reader.take(2, || format!("reserved bytes of {}", tag))?;
                let len = reader.read_u32(self.order, "element length")?;
                Ok(Header {
                    tag,
                    vr,
                    len,
                    offset,
                })
            }
            Some(vr) => {
                let len = reader.read_u16(self.order, "element length")? as u32;
                Ok(Header {
                    tag,
                    vr,
                    len,
                    offset,
                })
            }
            None => {
                // some writers drop into implicit VR mid-stream
                let vr = dictionary_vr(tag).ok_or(FormatError::UnknownVr {
                    tag,
                    vr: vr_chars,
                })?;
                debug!(
                    "Element {} at offset {} has no valid VR, reading it as implicit {}",
                    tag, offset, vr
                );
                reader.rewind(2);
                let len = reader.read_u32(self.order, "element length")?;
                Ok(Header {
                    tag,
                    vr,
                    len,
                    offset,
                })
            }
        }
    }

    fn parse_element(
        &self,
        header: Header,
        reader: &mut ByteReader<'_>,
        depth: usize,
    ) -> Result<DataElement, FormatError> {
        let tag = header.tag;

        let body = if header.is_undefined_length() {
            match header.vr {
                VR::SQ => ElementBody::Sequence(self.parse_items(reader, true, depth + 1)?),
                VR::UN => {
                    let nested = Self::implicit_little_endian();
                    ElementBody::Sequence(nested.parse_items(reader, true, depth + 1)?)
                }
                _ if tag == PIXEL_DATA => ElementBody::Encapsulated(self.parse_fragments(reader)?),
                vr => return Err(FormatError::UndefinedLength { tag, vr }),
            }
        } else if header.vr == VR::SQ {
            let mut items = reader.sub_reader(header.len, || format!("value of {}", tag))?;
            ElementBody::Sequence(self.parse_items(&mut items, false, depth + 1)?)
        } else {
            let bytes = reader.take(header.len as usize, || format!("value of {}", tag))?;
            ElementBody::Primitive(bytes.to_vec())
        };

        Ok(DataElement::new(tag, header.vr, self.order, body))
    }

    fn parse_items(
        &self,
        reader: &mut ByteReader<'_>,
        until_delimiter: bool,
        depth: usize,
    ) -> Result<Vec<ElementTable>, FormatError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(FormatError::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }

        let mut items = Vec::new();
        loop {
            if reader.is_empty() {
                if until_delimiter {
                    return Err(FormatError::Truncated {
                        context: "sequence without delimitation".to_string(),
                        offset: reader.position(),
                        needed: 8,
                        remaining: 0,
                    });
                }
                return Ok(items);
            }

            let header = self.read_header(reader)?;
            match header.tag {
                ITEM if header.is_undefined_length() => {
                    items.push(self.parse_elements(reader, true, depth)?);
                }
                ITEM => {
                    let mut item = reader.sub_reader(header.len, || "sequence item".to_string())?;
                    items.push(self.parse_elements(&mut item, false, depth)?);
                }
                SEQUENCE_DELIMITATION => return Ok(items),
                tag => {
                    return Err(FormatError::UnexpectedTag {
                        tag,
                        offset: header.offset,
                        expected: "a sequence item",
                    })
                }
            }
        }
    }

    fn parse_fragments(&self, reader: &mut ByteReader<'_>) -> Result<PixelFragments, FormatError> {
        let mut pixels = PixelFragments::default();
        let mut first = true;

        loop {
            let header = self.read_header(reader)?;
            match header.tag {
                ITEM if header.is_undefined_length() => {
                    return Err(FormatError::UndefinedLength {
                        tag: ITEM,
                        vr: VR::OB,
                    })
                }
                ITEM => {
                    let bytes = reader.take(header.len as usize, || "pixel data fragment".to_string())?;
                    if first {
                        pixels.offset_table = bytes
                            .chunks_exact(4)
                            .map(|chunk| self.order.read_u32(chunk))
                            .collect();
                        first = false;
                    } else {
                        pixels.fragments.push(bytes.to_vec());
                    }
                }
                SEQUENCE_DELIMITATION => return Ok(pixels),
                tag => {
                    return Err(FormatError::UnexpectedTag {
                        tag,
                        offset: header.offset,
                        expected: "a pixel data item",
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Scalar, Value};

    fn explicit_le() -> DatasetParser {
        DatasetParser::new(&TransferSyntax::explicit_vr_little_endian())
    }

    fn implicit_le() -> DatasetParser {
        DatasetParser::new(&TransferSyntax::implicit_vr_little_endian())
    }

    #[test]
    fn test_read_sequence_explicit() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x18, 0x00, 0x11, 0x60, // (0018,6011) SequenceOfUltrasoundRegions
            b'S', b'Q', 0x00, 0x00,
            0x2e, 0x00, 0x00, 0x00, // length: 46
            0xfe, 0xff, 0x00, 0xe0, // item start
            0x14, 0x00, 0x00, 0x00, // item length: 20
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x01, 0x00,
            0x18, 0x00, 0x14, 0x60, b'U', b'S', 0x02, 0x00, 0x02, 0x00,
            0xfe, 0xff, 0x00, 0xe0, // item start
            0x0a, 0x00, 0x00, 0x00, // item length: 10
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x04, 0x00,
            0x20, 0x00, 0x00, 0x40, b'L', b'T', 0x04, 0x00, // (0020,4000) ImageComments
            b'T', b'E', b'S', b'T',
        ];

        let mut reader = ByteReader::new(DATA, 0);
        let table = explicit_le().parse_dataset(&mut reader).unwrap();
        assert_eq!(table.len(), 2);

        let seq = table.get(Tag(0x0018, 0x6011)).unwrap();
        let items = seq.items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].len(), 2);
        assert_eq!(
            items[1].value(Tag(0x0018, 0x6012)).unwrap().unwrap(),
            Value::Scalar(Scalar::UInt(4))
        );
        assert_eq!(
            table.value(Tag(0x0020, 0x4000)).unwrap().unwrap(),
            Value::Scalar(Scalar::Str("TEST".to_string()))
        );
    }

    #[test]
    fn test_read_undefined_length_sequence_implicit() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x08, 0x00, 0x15, 0x92, // (0008,9215) DerivationCodeSequence
            0xff, 0xff, 0xff, 0xff, // undefined length
            0xfe, 0xff, 0x00, 0xe0, // item start
            0xff, 0xff, 0xff, 0xff, // undefined length
            0x08, 0x00, 0x00, 0x01, // (0008,0100) CodeValue
            0x06, 0x00, 0x00, 0x00,
            b'1', b'1', b'3', b'0', b'7', b'6',
            0xfe, 0xff, 0x0d, 0xe0, // item delimitation
            0x00, 0x00, 0x00, 0x00,
            0xfe, 0xff, 0xdd, 0xe0, // sequence delimitation
            0x00, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x10, 0x00, // (0010,0010) PatientName
            0x08, 0x00, 0x00, 0x00,
            b'D', b'o', b'e', b'^', b'J', b'a', b'n', b'e',
        ];

        let mut reader = ByteReader::new(DATA, 0);
        let table = implicit_le().parse_dataset(&mut reader).unwrap();

        let seq = table.get(Tag(0x0008, 0x9215)).unwrap();
        assert_eq!(seq.vr(), VR::SQ);
        let items = seq.items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].value(Tag(0x0008, 0x0100)).unwrap().unwrap(),
            Value::Scalar(Scalar::Str("113076".to_string()))
        );
        assert_eq!(table.get(Tag(0x0010, 0x0010)).unwrap().vr(), VR::PN);
    }

    #[test]
    fn test_read_encapsulated_pixel_data() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0xe0, 0x7f, 0x10, 0x00, // (7FE0,0010) PixelData
            b'O', b'B', 0x00, 0x00,
            0xff, 0xff, 0xff, 0xff, // undefined length
            0xfe, 0xff, 0x00, 0xe0, // basic offset table
            0x04, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0xfe, 0xff, 0x00, 0xe0, // fragment
            0x04, 0x00, 0x00, 0x00,
            0x99, 0x99, 0x99, 0x99,
            0xfe, 0xff, 0xdd, 0xe0, // sequence delimitation
            0x00, 0x00, 0x00, 0x00,
        ];

        let mut reader = ByteReader::new(DATA, 0);
        let table = explicit_le().parse_dataset(&mut reader).unwrap();
        let pixels = table.get(PIXEL_DATA).unwrap().fragments().unwrap();
        assert_eq!(pixels.offset_table, vec![0]);
        assert_eq!(pixels.fragments, vec![vec![0x99; 4]]);
    }

    #[test]
    fn test_overrunning_length_is_truncated() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x40, 0x00, // declares 64 bytes
            b'D', b'o', b'e',
        ];

        let mut reader = ByteReader::new(DATA, 0);
        let err = explicit_le().parse_dataset(&mut reader).unwrap_err();
        assert!(matches!(
            err,
            FormatError::Truncated {
                needed: 64,
                remaining: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_sequence_length_beyond_data_is_truncated() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x08, 0x00, 0x15, 0x92, b'S', b'Q', 0x00, 0x00,
            0x00, 0x01, 0x00, 0x00, // 256 bytes declared
            0xfe, 0xff, 0x00, 0xe0, 0x00, 0x00, 0x00, 0x00,
        ];

        let mut reader = ByteReader::new(DATA, 0);
        let err = explicit_le().parse_dataset(&mut reader).unwrap_err();
        assert!(matches!(err, FormatError::Truncated { .. }));
    }

    #[test]
    fn test_missing_sequence_delimiter_is_truncated() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x08, 0x00, 0x15, 0x92, b'S', b'Q', 0x00, 0x00,
            0xff, 0xff, 0xff, 0xff,
            0xfe, 0xff, 0x00, 0xe0, 0x00, 0x00, 0x00, 0x00, // empty item, then nothing
        ];

        let mut reader = ByteReader::new(DATA, 0);
        let err = explicit_le().parse_dataset(&mut reader).unwrap_err();
        assert!(matches!(err, FormatError::Truncated { .. }));
    }

    #[test]
    fn test_unknown_vr_without_dictionary_entry() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x09, 0x00, 0x01, 0x10, b'Z', b'Z', 0x02, 0x00, 0x00, 0x00,
        ];

        let mut reader = ByteReader::new(DATA, 0);
        let err = explicit_le().parse_dataset(&mut reader).unwrap_err();
        assert_eq!(
            err,
            FormatError::UnknownVr {
                tag: Tag(0x0009, 0x1001),
                vr: *b"ZZ"
            }
        );
    }

    #[test]
    fn test_undefined_length_on_primitive_is_rejected() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x10, 0x00, 0x10, 0x00, b'U', b'T', 0x00, 0x00, 0xff, 0xff, 0xff, 0xff,
        ];

        let mut reader = ByteReader::new(DATA, 0);
        let err = explicit_le().parse_dataset(&mut reader).unwrap_err();
        assert_eq!(
            err,
            FormatError::UndefinedLength {
                tag: Tag(0x0010, 0x0010),
                vr: VR::UT
            }
        );
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let mut data = Vec::new();
        for _ in 0..=MAX_NESTING_DEPTH {
            data.extend_from_slice(&[0x08, 0x00, 0x15, 0x92, b'S', b'Q', 0x00, 0x00]);
            data.extend_from_slice(&[0xff; 4]);
            data.extend_from_slice(&[0xfe, 0xff, 0x00, 0xe0, 0xff, 0xff, 0xff, 0xff]);
        }

        let mut reader = ByteReader::new(&data, 0);
        let err = explicit_le().parse_dataset(&mut reader).unwrap_err();
        assert_eq!(
            err,
            FormatError::NestingTooDeep {
                max: MAX_NESTING_DEPTH
            }
        );
    }

    #[test]
    fn test_implicit_vr_resolution() {
        assert_eq!(implicit_vr(Tag(0x0028, 0x0010)), VR::US);
        assert_eq!(implicit_vr(Tag(0x0028, 0x0000)), VR::UL);
        assert_eq!(implicit_vr(Tag(0x0029, 0x0010)), VR::LO);
        assert_eq!(implicit_vr(Tag(0x0029, 0x1010)), VR::UN);
        assert_eq!(implicit_vr(PIXEL_DATA), VR::OW);
    }

    #[test]
    fn test_big_endian_header() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x00, 0x28, 0x00, 0x10, b'U', b'S', 0x00, 0x02, 0x02, 0x00,
        ];

        let parser = DatasetParser::new(&TransferSyntax::from_uid("1.2.840.10008.1.2.2"));
        let mut reader = ByteReader::new(DATA, 0);
        let table = parser.parse_dataset(&mut reader).unwrap();
        assert_eq!(
            table.value(Tag(0x0028, 0x0010)).unwrap().unwrap(),
            Value::Scalar(Scalar::UInt(512))
        );
    }
}
