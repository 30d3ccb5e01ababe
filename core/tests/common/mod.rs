//! Synthesizes DICOM byte streams for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const IMPLICIT_VR_LE: &str = "1.2.840.10008.1.2";
pub const EXPLICIT_VR_LE: &str = "1.2.840.10008.1.2.1";
pub const DEFLATED_EXPLICIT_VR_LE: &str = "1.2.840.10008.1.2.1.99";
pub const EXPLICIT_VR_BE: &str = "1.2.840.10008.1.2.2";
pub const RLE_LOSSLESS: &str = "1.2.840.10008.1.2.5";
pub const JPEG_2000: &str = "1.2.840.10008.1.2.4.90";

const LONG_LENGTH_VRS: &[&[u8; 2]] = &[
    b"OB", b"OD", b"OF", b"OL", b"OV", b"OW", b"SQ", b"SV", b"UC", b"UN", b"UR", b"UT", b"UV",
];

/// Dataset encoding used by [`DatasetWriter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    ImplicitLittle,
    ExplicitLittle,
    ExplicitBig,
}

impl Encoding {
    pub fn for_syntax(uid: &str) -> Self {
        match uid {
            IMPLICIT_VR_LE => Encoding::ImplicitLittle,
            EXPLICIT_VR_BE => Encoding::ExplicitBig,
            _ => Encoding::ExplicitLittle,
        }
    }
}

/// Builder for an encoded dataset
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    encoding: Encoding,
    bytes: Vec<u8>,
}

impl DatasetWriter {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            bytes: Vec::new(),
        }
    }

    fn big(&self) -> bool {
        self.encoding == Encoding::ExplicitBig
    }

    fn u16_bytes(&self, v: u16) -> [u8; 2] {
        if self.big() {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }

    fn u32_bytes(&self, v: u32) -> [u8; 4] {
        if self.big() {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }

    fn header(&mut self, tag: (u16, u16), vr: &[u8; 2], len: u32) {
        let group = self.u16_bytes(tag.0);
        let element = self.u16_bytes(tag.1);
        self.bytes.extend_from_slice(&group);
        self.bytes.extend_from_slice(&element);
        match self.encoding {
            Encoding::ImplicitLittle => {
                let len = self.u32_bytes(len);
                self.bytes.extend_from_slice(&len);
            }
            _ if LONG_LENGTH_VRS.contains(&vr) => {
                self.bytes.extend_from_slice(vr);
                self.bytes.extend_from_slice(&[0, 0]);
                let len = self.u32_bytes(len);
                self.bytes.extend_from_slice(&len);
            }
            _ => {
                self.bytes.extend_from_slice(vr);
                let len = self.u16_bytes(len as u16);
                self.bytes.extend_from_slice(&len);
            }
        }
    }

    /// Appends an element with raw value bytes, padded to even length
    pub fn raw(mut self, tag: (u16, u16), vr: &[u8; 2], value: &[u8]) -> Self {
        let mut value = value.to_vec();
        if value.len() % 2 == 1 {
            value.push(if vr == b"UI" || vr == b"OB" { 0 } else { b' ' });
        }
        self.header(tag, vr, value.len() as u32);
        self.bytes.extend_from_slice(&value);
        self
    }

    pub fn text(self, tag: (u16, u16), vr: &[u8; 2], value: &str) -> Self {
        self.raw(tag, vr, value.as_bytes())
    }

    pub fn us(self, tag: (u16, u16), value: u16) -> Self {
        let bytes = self.u16_bytes(value);
        self.raw(tag, b"US", &bytes)
    }

    /// Native 16-bit pixel data in the dataset byte order
    pub fn pixels_16(self, samples: &[u16]) -> Self {
        let bytes: Vec<u8> = samples.iter().flat_map(|&v| self.u16_bytes(v)).collect();
        self.raw((0x7FE0, 0x0010), b"OW", &bytes)
    }

    /// Native 8-bit pixel data
    pub fn pixels_8(self, samples: &[u8]) -> Self {
        self.raw((0x7FE0, 0x0010), b"OB", samples)
    }

    /// Defined-length sequence of defined-length items
    pub fn sequence(mut self, tag: (u16, u16), items: Vec<DatasetWriter>) -> Self {
        let mut body = Vec::new();
        for item in items {
            let item = item.into_bytes();
            body.extend_from_slice(&self.u16_bytes(0xFFFE));
            body.extend_from_slice(&self.u16_bytes(0xE000));
            body.extend_from_slice(&self.u32_bytes(item.len() as u32));
            body.extend_from_slice(&item);
        }
        self.header(tag, b"SQ", body.len() as u32);
        self.bytes.extend_from_slice(&body);
        self
    }

    /// Encapsulated pixel data with an empty offset table
    pub fn encapsulated(mut self, fragments: &[Vec<u8>]) -> Self {
        self.header((0x7FE0, 0x0010), b"OB", 0xFFFF_FFFF);
        self.bytes.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 0, 0, 0, 0]);
        for fragment in fragments {
            let mut fragment = fragment.clone();
            if fragment.len() % 2 == 1 {
                fragment.push(0);
            }
            self.bytes.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0]);
            self.bytes
                .extend_from_slice(&(fragment.len() as u32).to_le_bytes());
            self.bytes.extend_from_slice(&fragment);
        }
        self.bytes.extend_from_slice(&[0xFE, 0xFF, 0xDD, 0xE0, 0, 0, 0, 0]);
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Preamble, marker and a meta group naming `transfer_syntax`
pub fn file_header(transfer_syntax: &str) -> Vec<u8> {
    let meta = DatasetWriter::new(Encoding::ExplicitLittle)
        .raw((0x0002, 0x0001), b"OB", &[0x00, 0x01])
        .text((0x0002, 0x0010), b"UI", transfer_syntax)
        .into_bytes();

    let mut out = vec![0u8; 128];
    out.extend_from_slice(b"DICM");
    out.extend_from_slice(&meta);
    out
}

/// Complete file bytes for a dataset
pub fn dicom_file(transfer_syntax: &str, dataset: DatasetWriter) -> Vec<u8> {
    let mut out = file_header(transfer_syntax);
    out.extend_from_slice(&dataset.into_bytes());
    out
}

/// A small CT slice: 2x2, signed 16-bit, with identification tags
pub fn ct_slice(transfer_syntax: &str, instance: u16) -> Vec<u8> {
    let dataset = DatasetWriter::new(Encoding::for_syntax(transfer_syntax))
        .text((0x0008, 0x0008), b"CS", "ORIGINAL\\PRIMARY\\AXIAL")
        .text((0x0008, 0x0018), b"UI", &format!("1.2.826.0.1.3680043.2.1125.{}", instance))
        .text((0x0008, 0x0060), b"CS", "CT")
        .text((0x0010, 0x0010), b"PN", "Doe^Jane")
        .text((0x0020, 0x000D), b"UI", "1.2.826.0.1.3680043.2.1125.1")
        .text((0x0020, 0x0013), b"IS", &instance.to_string())
        .us((0x0028, 0x0002), 1)
        .text((0x0028, 0x0004), b"CS", "MONOCHROME2")
        .us((0x0028, 0x0010), 2)
        .us((0x0028, 0x0011), 2)
        .text((0x0028, 0x0030), b"DS", "0.703125\\0.703125")
        .us((0x0028, 0x0100), 16)
        .us((0x0028, 0x0101), 16)
        .us((0x0028, 0x0103), 1)
        .text((0x0028, 0x1052), b"DS", "-1024")
        .text((0x0028, 0x1053), b"DS", "1")
        .pixels_16(&[0xFC18, 0x0000, 0x0028, 0x03E8]); // -1000, 0, 40, 1000
    dicom_file(transfer_syntax, dataset)
}

/// Writes `bytes` to `dir/name`
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).expect("failed to write fixture");
    path
}
