use crate::error::PixelDecodeError;
use crate::pixel::{frame_data, PixelGeometry};
use crate::types::PixelFragments;
use jpeg_decoder::{Decoder, PixelFormat};

/// Decodes JPEG baseline, extended and lossless frames
pub(crate) fn decode(
    pixels: &PixelFragments,
    geometry: &PixelGeometry,
) -> Result<Vec<u32>, PixelDecodeError> {
    let frames = frame_data(pixels, geometry.frames)?;
    let mut words = Vec::new();
    for (index, frame) in frames.iter().enumerate() {
        decode_frame(frame, index, geometry, &mut words)?;
    }
    Ok(words)
}

fn decode_frame(
    frame: &[u8],
    index: usize,
    geometry: &PixelGeometry,
    out: &mut Vec<u32>,
) -> Result<(), PixelDecodeError> {
    let mut decoder = Decoder::new(frame);
    let decoded = decoder
        .decode()
        .map_err(|e| PixelDecodeError::Jpeg(format!("frame {}: {}", index, e)))?;
    let info = decoder
        .info()
        .ok_or_else(|| PixelDecodeError::Jpeg(format!("frame {}: no image header", index)))?;

    if usize::from(info.width) != geometry.columns || usize::from(info.height) != geometry.rows {
        return Err(PixelDecodeError::Jpeg(format!(
            "frame {} is {}x{}, expected {}x{}",
            index, info.width, info.height, geometry.columns, geometry.rows
        )));
    }

    let start = out.len();
    out.reserve(decoded.len());
    match info.pixel_format {
        PixelFormat::L8 | PixelFormat::RGB24 => out.extend(decoded.iter().map(|&b| u32::from(b))),
        // 16-bit output is big endian
        PixelFormat::L16 => out.extend(
            decoded
                .chunks_exact(2)
                .map(|pair| u32::from(u16::from_be_bytes([pair[0], pair[1]]))),
        ),
        other => {
            return Err(PixelDecodeError::UnsupportedLayout(format!(
                "JPEG pixel format {:?}",
                other
            )))
        }
    }

    let produced = out.len() - start;
    if produced != geometry.frame_len() {
        return Err(PixelDecodeError::InsufficientData {
            expected: geometry.frame_len(),
            actual: produced,
        });
    }
    Ok(())
}
