//! Transfer syntax resolution
//!
//! Maps a Transfer Syntax UID to the byte order, VR explicitness and
//! pixel codec used for the dataset that follows the file meta group.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1.99";
pub const EXPLICIT_VR_BIG_ENDIAN: &str = "1.2.840.10008.1.2.2";
pub const RLE_LOSSLESS: &str = "1.2.840.10008.1.2.5";
pub const JPEG_BASELINE: &str = "1.2.840.10008.1.2.4.50";
pub const JPEG_EXTENDED: &str = "1.2.840.10008.1.2.4.51";
pub const JPEG_LOSSLESS_NON_HIERARCHICAL: &str = "1.2.840.10008.1.2.4.57";
pub const JPEG_LOSSLESS_SV1: &str = "1.2.840.10008.1.2.4.70";

/// Byte order of multi-byte values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
    Big,
}

macro_rules! read_fn {
    ($name:ident, $ty:ty, $method:ident) => {
        pub fn $name(self, buf: &[u8]) -> $ty {
            match self {
                Endianness::Little => LittleEndian::$method(buf),
                Endianness::Big => BigEndian::$method(buf),
            }
        }
    };
}

impl Endianness {
    read_fn!(read_u16, u16, read_u16);
    read_fn!(read_i16, i16, read_i16);
    read_fn!(read_u32, u32, read_u32);
    read_fn!(read_i32, i32, read_i32);
    read_fn!(read_u64, u64, read_u64);
    read_fn!(read_i64, i64, read_i64);
    read_fn!(read_f32, f32, read_f32);
    read_fn!(read_f64, f64, read_f64);
}

/// How the pixel data element of a dataset is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelCodec {
    /// Uncompressed samples in the dataset byte order
    Native,
    /// DICOM RLE Lossless
    RleLossless,
    /// JPEG process 1, 2/4 or 14
    Jpeg,
    /// Any compression this crate does not decode
    Unsupported,
}

/// A resolved transfer syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSyntax {
    uid: String,
    name: &'static str,
    byte_order: Endianness,
    explicit_vr: bool,
    deflated: bool,
    codec: PixelCodec,
}

/// Known transfer syntaxes: (uid, name, byte order, explicit VR, deflated, codec)
static KNOWN_SYNTAXES: &[(&str, &str, Endianness, bool, bool, PixelCodec)] = &[
    (IMPLICIT_VR_LITTLE_ENDIAN, "Implicit VR Little Endian", Endianness::Little, false, false, PixelCodec::Native),
    (EXPLICIT_VR_LITTLE_ENDIAN, "Explicit VR Little Endian", Endianness::Little, true, false, PixelCodec::Native),
    (DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN, "Deflated Explicit VR Little Endian", Endianness::Little, true, true, PixelCodec::Native),
    (EXPLICIT_VR_BIG_ENDIAN, "Explicit VR Big Endian", Endianness::Big, true, false, PixelCodec::Native),
    (RLE_LOSSLESS, "RLE Lossless", Endianness::Little, true, false, PixelCodec::RleLossless),
    (JPEG_BASELINE, "JPEG Baseline (Process 1)", Endianness::Little, true, false, PixelCodec::Jpeg),
    (JPEG_EXTENDED, "JPEG Extended (Process 2 & 4)", Endianness::Little, true, false, PixelCodec::Jpeg),
    (JPEG_LOSSLESS_NON_HIERARCHICAL, "JPEG Lossless, Non-Hierarchical (Process 14)", Endianness::Little, true, false, PixelCodec::Jpeg),
    (JPEG_LOSSLESS_SV1, "JPEG Lossless, Non-Hierarchical, First-Order Prediction", Endianness::Little, true, false, PixelCodec::Jpeg),
    ("1.2.840.10008.1.2.4.80", "JPEG-LS Lossless", Endianness::Little, true, false, PixelCodec::Unsupported),
    ("1.2.840.10008.1.2.4.81", "JPEG-LS Lossy (Near-Lossless)", Endianness::Little, true, false, PixelCodec::Unsupported),
    ("1.2.840.10008.1.2.4.90", "JPEG 2000 Image Compression (Lossless Only)", Endianness::Little, true, false, PixelCodec::Unsupported),
    ("1.2.840.10008.1.2.4.91", "JPEG 2000 Image Compression", Endianness::Little, true, false, PixelCodec::Unsupported),
    ("1.2.840.10008.1.2.4.100", "MPEG2 Main Profile / Main Level", Endianness::Little, true, false, PixelCodec::Unsupported),
    ("1.2.840.10008.1.2.4.102", "MPEG-4 AVC/H.264 High Profile / Level 4.1", Endianness::Little, true, false, PixelCodec::Unsupported),
    ("1.2.840.10008.1.2.4.107", "HEVC/H.265 Main Profile / Level 5.1", Endianness::Little, true, false, PixelCodec::Unsupported),
    ("1.2.840.10008.1.2.4.110", "JPEG XL Lossless", Endianness::Little, true, false, PixelCodec::Unsupported),
    ("1.2.840.10008.1.2.4.112", "JPEG XL", Endianness::Little, true, false, PixelCodec::Unsupported),
];

impl TransferSyntax {
    /// Resolves a transfer syntax from its UID
    ///
    /// Trailing padding is ignored. Unknown UIDs resolve to an explicit VR
    /// little endian dataset whose pixel data cannot be decoded, which is
    /// how every private compressed syntax is laid out.
    pub fn from_uid(uid: &str) -> Self {
        let uid = uid.trim_end_matches(|c: char| c == '\0' || c == ' ').trim();
        match KNOWN_SYNTAXES.iter().find(|entry| entry.0 == uid) {
            Some(&(uid, name, byte_order, explicit_vr, deflated, codec)) => TransferSyntax {
                uid: uid.to_string(),
                name,
                byte_order,
                explicit_vr,
                deflated,
                codec,
            },
            None => TransferSyntax {
                uid: uid.to_string(),
                name: "Unknown",
                byte_order: Endianness::Little,
                explicit_vr: true,
                deflated: false,
                codec: PixelCodec::Unsupported,
            },
        }
    }

    /// Implicit VR little endian, used for raw datasets without meta
    pub fn implicit_vr_little_endian() -> Self {
        Self::from_uid(IMPLICIT_VR_LITTLE_ENDIAN)
    }

    /// Explicit VR little endian, the encoding of the file meta group
    pub fn explicit_vr_little_endian() -> Self {
        Self::from_uid(EXPLICIT_VR_LITTLE_ENDIAN)
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn byte_order(&self) -> Endianness {
        self.byte_order
    }

    pub fn is_explicit_vr(&self) -> bool {
        self.explicit_vr
    }

    pub fn is_deflated(&self) -> bool {
        self.deflated
    }

    pub fn codec(&self) -> PixelCodec {
        self.codec
    }

    /// Whether the pixel data is stored as fragments
    pub fn is_encapsulated(&self) -> bool {
        self.codec != PixelCodec::Native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_syntax() {
        let ts = TransferSyntax::from_uid("1.2.840.10008.1.2.2\0");
        assert_eq!(ts.uid(), EXPLICIT_VR_BIG_ENDIAN);
        assert_eq!(ts.byte_order(), Endianness::Big);
        assert!(ts.is_explicit_vr());
        assert_eq!(ts.codec(), PixelCodec::Native);
    }

    #[test]
    fn test_implicit_syntax() {
        let ts = TransferSyntax::implicit_vr_little_endian();
        assert!(!ts.is_explicit_vr());
        assert!(!ts.is_encapsulated());
    }

    #[test]
    fn test_unknown_syntax_is_explicit_and_unsupported() {
        let ts = TransferSyntax::from_uid("1.2.3.4.5.6");
        assert_eq!(ts.name(), "Unknown");
        assert!(ts.is_explicit_vr());
        assert_eq!(ts.codec(), PixelCodec::Unsupported);
        assert!(ts.is_encapsulated());
    }

    #[test]
    fn test_endianness_reads() {
        assert_eq!(Endianness::Little.read_u16(&[0x01, 0x02]), 0x0201);
        assert_eq!(Endianness::Big.read_u16(&[0x01, 0x02]), 0x0102);
        assert_eq!(Endianness::Little.read_i32(&(-5i32).to_le_bytes()), -5);
    }
}
