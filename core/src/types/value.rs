use crate::error::TagDecodeError;
use crate::parser::Endianness;
use crate::types::ElementTable;
use dicom_core::{Tag, VR};
use std::fmt;

/// A single decoded value component
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(untagged))]
pub enum Scalar {
    /// Text, including dates, times, names and UIDs
    Str(String),
    /// Signed integer (IS, SS, SL, SV)
    Int(i64),
    /// Unsigned integer (US, UL, UV)
    UInt(u64),
    /// Floating point (FL, FD)
    Float(f64),
    /// Decimal String component, keeping the text it was read from
    Decimal { value: f64, text: String },
    /// Integer String component, keeping the text it was read from
    Integer { value: i64, text: String },
}

impl Scalar {
    /// Whether this component is rendered as quoted text inside lists
    pub fn is_text(&self) -> bool {
        matches!(self, Scalar::Str(_))
    }

    /// Integer view of the component, if it holds a whole number
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(v) => Some(*v),
            Scalar::UInt(v) => i64::try_from(*v).ok(),
            Scalar::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Scalar::Float(_) => None,
            Scalar::Decimal { value, .. } if value.fract() == 0.0 => Some(*value as i64),
            Scalar::Decimal { .. } => None,
            Scalar::Integer { value, .. } => Some(*value),
            Scalar::Str(s) => s.trim().parse().ok(),
        }
    }

    /// Floating point view of the component
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::UInt(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Decimal { value, .. } => Some(*value),
            Scalar::Integer { value, .. } => Some(*value as f64),
            Scalar::Str(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => write!(f, "{}", s),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::UInt(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Decimal { text, .. } | Scalar::Integer { text, .. } => write!(f, "{}", text),
        }
    }
}

/// Decoded form of a data element
///
/// Closed over every shape an element can take, so consumers match
/// exhaustively instead of inspecting types at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// Zero-length value
    Empty,
    /// Exactly one component
    Scalar(Scalar),
    /// Two or more components, in stream order
    Multi(Vec<Scalar>),
    /// Items of a sequence element
    Sequence(&'a [ElementTable]),
    /// Opaque binary payload (OB, OW, UN, ...), by length
    Bytes(usize),
    /// Encapsulated pixel data, by fragment count
    Encapsulated(usize),
}

impl Value<'_> {
    /// First component of a scalar or multi-valued element
    pub fn first(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Multi(v) => v.first(),
            _ => None,
        }
    }

    /// Integer view of the first component
    pub fn first_i64(&self) -> Option<i64> {
        self.first().and_then(Scalar::as_i64)
    }

    /// Floating point view of the first component
    pub fn first_f64(&self) -> Option<f64> {
        self.first().and_then(Scalar::as_f64)
    }

    /// Number of components (items for sequences)
    pub fn multiplicity(&self) -> usize {
        match self {
            Value::Empty => 0,
            Value::Scalar(_) | Value::Bytes(_) | Value::Encapsulated(_) => 1,
            Value::Multi(v) => v.len(),
            Value::Sequence(items) => items.len(),
        }
    }
}

/// Text VRs that may hold several backslash-separated components
fn is_multi_text(vr: VR) -> bool {
    use VR::*;
    matches!(
        vr,
        AE | AS | CS | DA | DS | DT | IS | LO | PN | SH | TM | UC | UI
    )
}

/// Free-text VRs whose leading spaces are significant
fn is_free_text(vr: VR) -> bool {
    matches!(vr, VR::LT | VR::ST | VR::UT | VR::UR)
}

/// Decodes text bytes, falling back to ISO-IR 100 for non UTF-8 input
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn trim_padding(s: &str) -> &str {
    s.trim_end_matches(|c: char| c == ' ' || c == '\0')
}

/// Decodes the raw bytes of a primitive element according to its VR
pub fn decode_primitive(
    vr: VR,
    bytes: &[u8],
    order: Endianness,
) -> Result<Value<'static>, TagDecodeError> {
    if bytes.is_empty() {
        return Ok(Value::Empty);
    }

    use VR::*;
    match vr {
        LT | ST | UT | UR => {
            let text = decode_text(bytes);
            let text = trim_padding(&text);
            if text.is_empty() {
                Ok(Value::Empty)
            } else {
                Ok(Value::Scalar(Scalar::Str(text.to_string())))
            }
        }
        AE | AS | CS | DA | DS | DT | IS | LO | PN | SH | TM | UC | UI => {
            decode_text_components(vr, bytes)
        }
        US => decode_binary(vr, bytes, 2, |b| Scalar::UInt(order.read_u16(b) as u64)),
        SS => decode_binary(vr, bytes, 2, |b| Scalar::Int(order.read_i16(b) as i64)),
        UL => decode_binary(vr, bytes, 4, |b| Scalar::UInt(order.read_u32(b) as u64)),
        SL => decode_binary(vr, bytes, 4, |b| Scalar::Int(order.read_i32(b) as i64)),
        UV => decode_binary(vr, bytes, 8, |b| Scalar::UInt(order.read_u64(b))),
        SV => decode_binary(vr, bytes, 8, |b| Scalar::Int(order.read_i64(b))),
        FL => decode_binary(vr, bytes, 4, |b| Scalar::Float(order.read_f32(b) as f64)),
        FD => decode_binary(vr, bytes, 8, |b| Scalar::Float(order.read_f64(b))),
        AT => decode_binary(vr, bytes, 4, |b| {
            let tag = Tag(order.read_u16(&b[0..2]), order.read_u16(&b[2..4]));
            Scalar::Str(tag.to_string())
        }),
        OB | OD | OF | OL | OV | OW | UN | SQ => Ok(Value::Bytes(bytes.len())),
    }
}

fn decode_text_components(vr: VR, bytes: &[u8]) -> Result<Value<'static>, TagDecodeError> {
    let text = decode_text(bytes);
    let text = trim_padding(&text);
    if text.trim().is_empty() {
        return Ok(Value::Empty);
    }

    let parts: Vec<&str> = if is_multi_text(vr) {
        text.split('\\').collect()
    } else {
        vec![text]
    };

    let mut scalars = parts
        .into_iter()
        .map(|part| decode_text_component(vr, part))
        .collect::<Result<Vec<_>, _>>()?;

    if scalars.len() == 1 {
        Ok(Value::Scalar(scalars.remove(0)))
    } else {
        Ok(Value::Multi(scalars))
    }
}

fn decode_text_component(vr: VR, part: &str) -> Result<Scalar, TagDecodeError> {
    let trimmed = if is_free_text(vr) {
        trim_padding(part)
    } else {
        part.trim_matches(|c: char| c == ' ' || c == '\0')
    };

    match vr {
        VR::DS if !trimmed.is_empty() => match trimmed.parse::<f64>() {
            Ok(value) => Ok(Scalar::Decimal {
                value,
                text: trimmed.to_string(),
            }),
            Err(_) => Err(invalid_number(vr, trimmed)),
        },
        VR::IS if !trimmed.is_empty() => match trimmed.parse::<i64>() {
            Ok(value) => Ok(Scalar::Integer {
                value,
                text: trimmed.to_string(),
            }),
            Err(_) => Err(invalid_number(vr, trimmed)),
        },
        _ => Ok(Scalar::Str(trimmed.to_string())),
    }
}

fn invalid_number(vr: VR, text: &str) -> TagDecodeError {
    TagDecodeError::InvalidNumber {
        vr,
        text: text.to_string(),
    }
}

fn decode_binary<F>(
    vr: VR,
    bytes: &[u8],
    width: usize,
    read: F,
) -> Result<Value<'static>, TagDecodeError>
where
    F: Fn(&[u8]) -> Scalar,
{
    if bytes.len() % width != 0 {
        return Err(TagDecodeError::LengthMismatch {
            vr,
            len: bytes.len(),
            width,
        });
    }

    let mut scalars: Vec<Scalar> = bytes.chunks_exact(width).map(read).collect();
    if scalars.len() == 1 {
        Ok(Value::Scalar(scalars.remove(0)))
    } else {
        Ok(Value::Multi(scalars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LE: Endianness = Endianness::Little;

    fn decimal(value: f64, text: &str) -> Scalar {
        Scalar::Decimal {
            value,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_decode_person_name() {
        let value = decode_primitive(VR::PN, b"Doe^John", LE).unwrap();
        assert_eq!(value, Value::Scalar(Scalar::Str("Doe^John".to_string())));
    }

    #[test]
    fn test_decode_uid_strips_null_padding() {
        let value = decode_primitive(VR::UI, b"1.2.840.10008.1.2\0", LE).unwrap();
        assert_eq!(
            value,
            Value::Scalar(Scalar::Str("1.2.840.10008.1.2".to_string()))
        );
    }

    #[test]
    fn test_decode_multi_valued_decimal() {
        let value = decode_primitive(VR::DS, b"0.5\\0.25", LE).unwrap();
        assert_eq!(
            value,
            Value::Multi(vec![decimal(0.5, "0.5"), decimal(0.25, "0.25")])
        );
    }

    #[test]
    fn test_number_strings_keep_their_text() {
        let value = decode_primitive(VR::DS, b"1.0\\5.00 ", LE).unwrap();
        assert_eq!(
            value,
            Value::Multi(vec![decimal(1.0, "1.0"), decimal(5.0, "5.00")])
        );
        assert_eq!(value.first_f64(), Some(1.0));

        let value = decode_primitive(VR::IS, b"007 ", LE).unwrap();
        assert_eq!(value.first().unwrap().to_string(), "007");
        assert_eq!(value.first_i64(), Some(7));
    }

    #[test]
    fn test_decode_invalid_decimal() {
        let err = decode_primitive(VR::DS, b"abc ", LE).unwrap_err();
        assert_eq!(
            err,
            TagDecodeError::InvalidNumber {
                vr: VR::DS,
                text: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_decode_integer_string_with_padding() {
        let value = decode_primitive(VR::IS, b" 42 ", LE).unwrap();
        assert_eq!(
            value,
            Value::Scalar(Scalar::Integer {
                value: 42,
                text: "42".to_string()
            })
        );
    }

    #[test]
    fn test_decode_binary_unsigned_short() {
        let value = decode_primitive(VR::US, &[0x00, 0x02], LE).unwrap();
        assert_eq!(value, Value::Scalar(Scalar::UInt(512)));

        let value = decode_primitive(VR::US, &[0x02, 0x00], Endianness::Big).unwrap();
        assert_eq!(value, Value::Scalar(Scalar::UInt(512)));
    }

    #[test]
    fn test_decode_binary_length_mismatch() {
        let err = decode_primitive(VR::UL, &[1, 2, 3], LE).unwrap_err();
        assert_eq!(
            err,
            TagDecodeError::LengthMismatch {
                vr: VR::UL,
                len: 3,
                width: 4
            }
        );
    }

    #[test]
    fn test_decode_signed_short() {
        let value = decode_primitive(VR::SS, &(-1024i16).to_le_bytes(), LE).unwrap();
        assert_eq!(value, Value::Scalar(Scalar::Int(-1024)));
    }

    #[test]
    fn test_decode_attribute_tag() {
        let value = decode_primitive(VR::AT, &[0x28, 0x00, 0x10, 0x00], LE).unwrap();
        assert_eq!(value, Value::Scalar(Scalar::Str("(0028,0010)".to_string())));
    }

    #[test]
    fn test_decode_latin1_fallback() {
        let value = decode_primitive(VR::LO, &[b'M', 0xFC, b'l', b'l', b'e', b'r'], LE).unwrap();
        assert_eq!(value, Value::Scalar(Scalar::Str("Müller".to_string())));
    }

    #[test]
    fn test_decode_empty_and_blank() {
        assert_eq!(decode_primitive(VR::LO, b"", LE).unwrap(), Value::Empty);
        assert_eq!(decode_primitive(VR::CS, b"  ", LE).unwrap(), Value::Empty);
    }

    #[test]
    fn test_binary_vr_reports_length() {
        assert_eq!(
            decode_primitive(VR::OB, &[0u8; 10], LE).unwrap(),
            Value::Bytes(10)
        );
    }

    #[test]
    fn test_scalar_views() {
        assert_eq!(Scalar::Float(3.0).as_i64(), Some(3));
        assert_eq!(Scalar::Float(3.5).as_i64(), None);
        assert_eq!(Scalar::Str(" 7 ".to_string()).as_i64(), Some(7));
        assert_eq!(Scalar::UInt(16).as_f64(), Some(16.0));
        assert_eq!(decimal(2.0, "2.0").as_i64(), Some(2));
        assert_eq!(decimal(2.5, "2.5").as_i64(), None);
    }
}
