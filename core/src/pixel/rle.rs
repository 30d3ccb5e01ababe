use crate::error::PixelDecodeError;
use crate::parser::Endianness;
use crate::pixel::{frame_data, PixelGeometry};
use crate::types::PixelFragments;

const HEADER_LEN: usize = 64;
const MAX_SEGMENTS: usize = 15;
/// Most bytes one encoded byte can yield: a two-byte run replicates 128
const MAX_EXPANSION: usize = 64;

/// Decodes RLE Lossless frames into interleaved sample words
pub(crate) fn decode(
    pixels: &PixelFragments,
    geometry: &PixelGeometry,
) -> Result<Vec<u32>, PixelDecodeError> {
    let bytes_per_sample = match geometry.bits_allocated {
        8 => 1,
        16 => 2,
        32 => 4,
        other => {
            return Err(PixelDecodeError::UnsupportedLayout(format!(
                "RLE with {} bits allocated",
                other
            )))
        }
    };

    let frames = frame_data(pixels, geometry.frames)?;
    let encoded: usize = frames.iter().map(Vec::len).sum();
    let mut words =
        Vec::with_capacity(geometry.sample_count().min(encoded.saturating_mul(MAX_EXPANSION)));
    for (index, frame) in frames.iter().enumerate() {
        decode_frame(frame, geometry, bytes_per_sample, &mut words)
            .map_err(|e| PixelDecodeError::Rle(format!("frame {}: {}", index, e)))?;
    }
    Ok(words)
}

fn decode_frame(
    frame: &[u8],
    geometry: &PixelGeometry,
    bytes_per_sample: usize,
    out: &mut Vec<u32>,
) -> Result<(), String> {
    let offsets = read_header(frame)?;
    let expected_segments = geometry.samples_per_pixel * bytes_per_sample;
    if offsets.len() != expected_segments {
        return Err(format!(
            "{} segments, expected {}",
            offsets.len(),
            expected_segments
        ));
    }

    let pixel_count = geometry.rows.saturating_mul(geometry.columns);
    let mut segments = Vec::with_capacity(offsets.len());
    for (i, &start) in offsets.iter().enumerate() {
        let end = offsets.get(i + 1).copied().unwrap_or(frame.len());
        if start < HEADER_LEN || start > end || end > frame.len() {
            return Err(format!("segment {} spans invalid range {}..{}", i, start, end));
        }
        let segment = &frame[start..end];
        if pixel_count > segment.len().saturating_mul(MAX_EXPANSION) {
            return Err(format!(
                "segment {} of {} bytes cannot hold {} pixels",
                i,
                segment.len(),
                pixel_count
            ));
        }
        segments.push(unpack_bits(segment, pixel_count)?);
    }

    // segments hold each sample's bytes, most significant first
    for pixel in 0..pixel_count {
        for sample in 0..geometry.samples_per_pixel {
            let first = sample * bytes_per_sample;
            let word = segments[first..first + bytes_per_sample]
                .iter()
                .fold(0u32, |acc, segment| (acc << 8) | u32::from(segment[pixel]));
            out.push(word);
        }
    }
    Ok(())
}

fn read_header(frame: &[u8]) -> Result<Vec<usize>, String> {
    if frame.len() < HEADER_LEN {
        return Err(format!("{} bytes is too short for the RLE header", frame.len()));
    }
    let order = Endianness::Little;
    let count = order.read_u32(&frame[0..4]) as usize;
    if count == 0 || count > MAX_SEGMENTS {
        return Err(format!("invalid segment count {}", count));
    }
    Ok((0..count)
        .map(|i| order.read_u32(&frame[4 + i * 4..8 + i * 4]) as usize)
        .collect())
}

/// Decodes one PackBits segment, stopping once `expected` bytes are out
fn unpack_bits(segment: &[u8], expected: usize) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(expected);
    let mut pos = 0;

    while out.len() < expected && pos < segment.len() {
        let header = segment[pos] as i8;
        pos += 1;
        match header {
            0..=127 => {
                let len = header as usize + 1;
                let literal = segment
                    .get(pos..pos + len)
                    .ok_or_else(|| format!("literal run of {} overruns segment", len))?;
                out.extend_from_slice(literal);
                pos += len;
            }
            -127..=-1 => {
                let value = *segment
                    .get(pos)
                    .ok_or_else(|| "replicate run without a value".to_string())?;
                let len = (1 - header as isize) as usize;
                out.resize(out.len() + len, value);
                pos += 1;
            }
            // -128 is a no-op
            _ => {}
        }
    }

    if out.len() < expected {
        return Err(format!(
            "segment decoded to {} bytes, expected {}",
            out.len(),
            expected
        ));
    }
    out.truncate(expected);
    Ok(out)
}
