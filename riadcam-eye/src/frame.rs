//! Captured frames and JPEG encoding

use crate::error::{CameraError, Result};
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;

/// Quality used for frames sent to the vision endpoint and written by snapshots.
pub const JPEG_QUALITY: u8 = 90;

/// One captured bitmap, interleaved 8-bit samples in BGR(A) order.
///
/// Frames are owned values; the store hands out clones so a caller can
/// mutate its copy freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// 1 (gray), 3 (BGR) or 4 (BGRA)
    pub channels: u32,
    pub data: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    /// Wrap raw BGR(A) bytes, stamped with the current time.
    pub fn new(width: u32, height: u32, channels: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            data,
            captured_at: Utc::now(),
        }
    }

    /// A frame filled with one BGR color
    pub fn solid(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&bgr);
        }
        Self::new(width, height, 3, data)
    }

    /// Number of bytes the dimensions call for, `None` on overflow.
    pub fn expected_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.channels as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    fn check_layout(&self) -> Result<()> {
        if self.is_empty() {
            return Err(CameraError::Encode("Frame is empty".to_string()));
        }
        if !matches!(self.channels, 1 | 3 | 4) {
            return Err(CameraError::Encode(format!(
                "Unsupported channel count: {}",
                self.channels
            )));
        }
        match self.expected_len() {
            Some(len) if len == self.data.len() => Ok(()),
            Some(len) => Err(CameraError::Encode(format!(
                "Frame buffer holds {} bytes, {}x{}x{} needs {}",
                self.data.len(),
                self.width,
                self.height,
                self.channels,
                len
            ))),
            None => Err(CameraError::Encode("Frame dimensions overflow".to_string())),
        }
    }

    /// Swap to RGB sample order, dropping alpha. Gray frames are returned as-is.
    fn to_rgb_samples(&self) -> (Vec<u8>, ColorType) {
        match self.channels {
            1 => (self.data.clone(), ColorType::L8),
            n => {
                let n = n as usize;
                let mut rgb = Vec::with_capacity(self.data.len() / n * 3);
                for px in self.data.chunks_exact(n) {
                    rgb.extend_from_slice(&[px[2], px[1], px[0]]);
                }
                (rgb, ColorType::Rgb8)
            }
        }
    }

    /// Encode as a baseline JPEG.
    pub fn encode_jpeg(&self) -> Result<Vec<u8>> {
        self.encode_jpeg_with_quality(JPEG_QUALITY)
    }

    pub fn encode_jpeg_with_quality(&self, quality: u8) -> Result<Vec<u8>> {
        self.check_layout()?;
        let (samples, color) = self.to_rgb_samples();

        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
            .encode(&samples, self.width, self.height, color)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_frame_layout() {
        let frame = Frame::solid(4, 2, [1, 2, 3]);
        assert_eq!(frame.channels, 3);
        assert_eq!(frame.data.len(), 24);
        assert_eq!(frame.expected_len(), Some(24));
        assert_eq!(&frame.data[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_bgr_to_rgb_swap() {
        let frame = Frame::new(1, 1, 3, vec![10, 20, 30]);
        let (rgb, color) = frame.to_rgb_samples();
        assert_eq!(rgb, vec![30, 20, 10]);
        assert_eq!(color, ColorType::Rgb8);
    }

    #[test]
    fn test_bgra_drops_alpha() {
        let frame = Frame::new(2, 1, 4, vec![1, 2, 3, 255, 4, 5, 6, 255]);
        let (rgb, _) = frame.to_rgb_samples();
        assert_eq!(rgb, vec![3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn test_encode_jpeg_produces_jpeg_markers() {
        let jpeg = Frame::solid(16, 8, [0, 128, 255]).encode_jpeg().unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_gray_frame() {
        let frame = Frame::new(8, 8, 1, vec![200; 64]);
        assert!(frame.encode_jpeg().is_ok());
    }

    #[test]
    fn test_encode_rejects_short_buffer() {
        let frame = Frame::new(4, 4, 3, vec![0; 10]);
        assert!(matches!(frame.encode_jpeg(), Err(CameraError::Encode(_))));
    }

    #[test]
    fn test_encode_rejects_empty_and_bad_channels() {
        assert!(Frame::new(0, 4, 3, vec![]).encode_jpeg().is_err());
        assert!(Frame::new(2, 2, 2, vec![0; 8]).encode_jpeg().is_err());
    }
}
