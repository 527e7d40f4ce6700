//! Lossless single-frame byte codecs.

use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};
use mocomp_core::{CodecError, Frame, FrameDims, ResidualFrame, Result};

/// Offset-binary bias applied to residual samples before 16-bit storage.
const RESIDUAL_BIAS: i32 = 32768;

/// Serializes frames and residuals to bytes and back.
///
/// Implementations must be bijective for every raster they accept.
pub trait FrameByteCodec: Send + Sync {
    fn name(&self) -> &'static str;

    fn encode_frame(&self, frame: &Frame) -> Result<Vec<u8>>;

    fn decode_frame(&self, bytes: &[u8]) -> Result<Frame>;

    fn encode_residual(&self, residual: &ResidualFrame) -> Result<Vec<u8>>;

    fn decode_residual(&self, bytes: &[u8]) -> Result<ResidualFrame>;
}

/// PNG storage: 8-bit frames, offset-binary 16-bit residuals.
///
/// One to four channels map to L, LA, RGB and RGBA images.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngCodec;

fn color_type(channels: u8, sixteen_bit: bool) -> Result<ExtendedColorType> {
    Ok(match (channels, sixteen_bit) {
        (1, false) => ExtendedColorType::L8,
        (2, false) => ExtendedColorType::La8,
        (3, false) => ExtendedColorType::Rgb8,
        (4, false) => ExtendedColorType::Rgba8,
        (1, true) => ExtendedColorType::L16,
        (2, true) => ExtendedColorType::La16,
        (3, true) => ExtendedColorType::Rgb16,
        (4, true) => ExtendedColorType::Rgba16,
        _ => {
            return Err(CodecError::InvalidParameter(format!(
                "PNG supports 1-4 channels, got {channels}"
            )))
        }
    })
}

fn write_png(dims: FrameDims, bytes: &[u8], sixteen_bit: bool) -> Result<Vec<u8>> {
    let color = color_type(dims.channels, sixteen_bit)?;
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(bytes, dims.width, dims.height, color)
        .map_err(|e| CodecError::Serialization(e.to_string()))?;
    Ok(buffer)
}

enum Decoded {
    Eight(FrameDims, Vec<u8>),
    Sixteen(FrameDims, Vec<u16>),
}

fn read_png(bytes: &[u8]) -> Result<Decoded> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| CodecError::Serialization(e.to_string()))?;

    let decoded = match img {
        DynamicImage::ImageLuma8(buf) => {
            Decoded::Eight(FrameDims::new(buf.width(), buf.height(), 1), buf.into_raw())
        }
        DynamicImage::ImageLumaA8(buf) => {
            Decoded::Eight(FrameDims::new(buf.width(), buf.height(), 2), buf.into_raw())
        }
        DynamicImage::ImageRgb8(buf) => {
            Decoded::Eight(FrameDims::new(buf.width(), buf.height(), 3), buf.into_raw())
        }
        DynamicImage::ImageRgba8(buf) => {
            Decoded::Eight(FrameDims::new(buf.width(), buf.height(), 4), buf.into_raw())
        }
        DynamicImage::ImageLuma16(buf) => {
            Decoded::Sixteen(FrameDims::new(buf.width(), buf.height(), 1), buf.into_raw())
        }
        DynamicImage::ImageLumaA16(buf) => {
            Decoded::Sixteen(FrameDims::new(buf.width(), buf.height(), 2), buf.into_raw())
        }
        DynamicImage::ImageRgb16(buf) => {
            Decoded::Sixteen(FrameDims::new(buf.width(), buf.height(), 3), buf.into_raw())
        }
        DynamicImage::ImageRgba16(buf) => {
            Decoded::Sixteen(FrameDims::new(buf.width(), buf.height(), 4), buf.into_raw())
        }
        other => {
            return Err(CodecError::InvalidData(format!(
                "unsupported PNG color type {:?}",
                other.color()
            )))
        }
    };
    Ok(decoded)
}

impl FrameByteCodec for PngCodec {
    fn name(&self) -> &'static str {
        "png"
    }

    fn encode_frame(&self, frame: &Frame) -> Result<Vec<u8>> {
        write_png(frame.dims(), frame.data(), false)
    }

    fn decode_frame(&self, bytes: &[u8]) -> Result<Frame> {
        match read_png(bytes)? {
            Decoded::Eight(dims, data) => Frame::from_raw(dims, data),
            Decoded::Sixteen(..) => Err(CodecError::InvalidData(
                "expected an 8-bit frame, found 16-bit samples".into(),
            )),
        }
    }

    fn encode_residual(&self, residual: &ResidualFrame) -> Result<Vec<u8>> {
        let raw: Vec<u8> = residual
            .data()
            .iter()
            .flat_map(|&r| ((i32::from(r) + RESIDUAL_BIAS) as u16).to_ne_bytes())
            .collect();
        write_png(residual.dims(), &raw, true)
    }

    fn decode_residual(&self, bytes: &[u8]) -> Result<ResidualFrame> {
        match read_png(bytes)? {
            Decoded::Sixteen(dims, data) => {
                let samples = data
                    .into_iter()
                    .map(|v| (i32::from(v) - RESIDUAL_BIAS) as i16)
                    .collect();
                ResidualFrame::from_raw(dims, samples)
            }
            Decoded::Eight(..) => Err(CodecError::InvalidData(
                "expected a 16-bit residual, found 8-bit samples".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_round_trip_all_channel_counts() {
        for channels in 1..=4u8 {
            let frame = Frame::test_pattern(24, 10, channels);
            let bytes = PngCodec.encode_frame(&frame).unwrap();
            assert_eq!(&bytes[1..4], b"PNG");
            assert_eq!(PngCodec.decode_frame(&bytes).unwrap(), frame);
        }
    }

    #[test]
    fn test_residual_extremes_survive() {
        let dims = FrameDims::new(4, 2, 3);
        let data: Vec<i16> = (0..dims.sample_count())
            .map(|i| match i % 4 {
                0 => -255,
                1 => 255,
                2 => 0,
                _ => -1,
            })
            .collect();
        let residual = ResidualFrame::from_raw(dims, data).unwrap();
        let bytes = PngCodec.encode_residual(&residual).unwrap();
        assert_eq!(PngCodec.decode_residual(&bytes).unwrap(), residual);
    }

    #[test]
    fn test_full_i16_range() {
        let dims = FrameDims::new(2, 1, 1);
        let residual = ResidualFrame::from_raw(dims, vec![i16::MIN, i16::MAX]).unwrap();
        let bytes = PngCodec.encode_residual(&residual).unwrap();
        assert_eq!(PngCodec.decode_residual(&bytes).unwrap(), residual);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let frame = Frame::test_pattern(8, 8, 1);
        let bytes = PngCodec.encode_frame(&frame).unwrap();
        assert!(PngCodec.decode_residual(&bytes).is_err());
    }

    #[test]
    fn test_five_channels_rejected() {
        let frame = Frame::new(FrameDims::new(2, 2, 5));
        assert!(matches!(
            PngCodec.encode_frame(&frame),
            Err(CodecError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(PngCodec.decode_frame(b"not a png").is_err());
    }
}
