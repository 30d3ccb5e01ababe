use crate::error::PixelDecodeError;
use crate::parser::Endianness;
use crate::pixel::PixelGeometry;
use dicom_core::VR;
use std::borrow::Cow;

/// Reads uncompressed pixel data into interleaved sample words
///
/// Trailing padding beyond the samples the geometry describes is ignored.
pub(crate) fn decode(
    bytes: &[u8],
    geometry: &PixelGeometry,
    order: Endianness,
    vr: VR,
) -> Result<Vec<u32>, PixelDecodeError> {
    let count = geometry.sample_count();

    let words = match geometry.bits_allocated {
        1 => unpack_bits(bytes, count)?,
        8 => {
            check_len(bytes, count)?;
            let bytes = if order == Endianness::Big && vr == VR::OW {
                Cow::Owned(swap_pairs(bytes))
            } else {
                Cow::Borrowed(bytes)
            };
            bytes[..count].iter().map(|&b| u32::from(b)).collect()
        }
        16 => {
            check_len(bytes, count.saturating_mul(2))?;
            bytes
                .chunks_exact(2)
                .take(count)
                .map(|chunk| u32::from(order.read_u16(chunk)))
                .collect()
        }
        32 => {
            check_len(bytes, count.saturating_mul(4))?;
            bytes
                .chunks_exact(4)
                .take(count)
                .map(|chunk| order.read_u32(chunk))
                .collect()
        }
        other => {
            return Err(PixelDecodeError::UnsupportedLayout(format!(
                "{} bits allocated",
                other
            )))
        }
    };

    if geometry.planar && geometry.samples_per_pixel > 1 {
        Ok(interleave_planes(&words, geometry))
    } else {
        Ok(words)
    }
}

fn check_len(bytes: &[u8], expected: usize) -> Result<(), PixelDecodeError> {
    if bytes.len() < expected {
        return Err(PixelDecodeError::InsufficientData {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// 1-bit samples, least significant bit first
fn unpack_bits(bytes: &[u8], count: usize) -> Result<Vec<u32>, PixelDecodeError> {
    check_len(bytes, count.div_ceil(8))?;
    Ok((0..count)
        .map(|i| u32::from((bytes[i / 8] >> (i % 8)) & 1))
        .collect())
}

/// Undoes the 16-bit word swap of OW data read in big endian
fn swap_pairs(bytes: &[u8]) -> Vec<u8> {
    let mut swapped = bytes.to_vec();
    for pair in swapped.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
    swapped
}

/// Reorders `RRR..GGG..BBB..` frames into `RGBRGB..`
pub(crate) fn interleave_planes(words: &[u32], geometry: &PixelGeometry) -> Vec<u32> {
    let samples = geometry.samples_per_pixel;
    let plane = geometry.rows * geometry.columns;
    let mut out = Vec::with_capacity(words.len());
    for frame in words.chunks(plane * samples) {
        for pixel in 0..plane {
            for sample in 0..samples {
                out.push(frame[sample * plane + pixel]);
            }
        }
    }
    out
}
