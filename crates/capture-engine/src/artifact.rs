//! Capture results: raw frames from a strategy and the published artifacts.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Local};
use image::{ImageFormat, RgbaImage};

use livecap_common::error::CaptureError;

/// PNG-encoded frame returned by a capture strategy. Not yet persisted.
#[derive(Debug, Clone)]
pub struct RawCapture {
    png: Bytes,
    width: u32,
    height: u32,
}

impl RawCapture {
    /// Encode an RGBA frame as PNG.
    pub fn encode(frame: &RgbaImage) -> Result<Self, CaptureError> {
        let mut buffer = Cursor::new(Vec::new());
        frame
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| CaptureError::failed(format!("PNG encoding failed: {e}")))?;
        Ok(Self {
            png: Bytes::from(buffer.into_inner()),
            width: frame.width(),
            height: frame.height(),
        })
    }

    /// Wrap bytes that are already PNG-encoded.
    pub fn from_png(png: impl Into<Bytes>, width: u32, height: u32) -> Self {
        Self {
            png: png.into(),
            width,
            height,
        }
    }

    pub fn png(&self) -> &Bytes {
        &self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn into_parts(self) -> (Bytes, u32, u32) {
        (self.png, self.width, self.height)
    }
}

/// The outcome of one successful, persisted capture. Never mutated.
#[derive(Debug)]
pub struct ScreenshotArtifact {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Local>,
    pub path: PathBuf,
}

impl ScreenshotArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `WIDTHxHEIGHT`, as shown to users.
    pub fn dimensions(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// A consistent view of the store: one artifact and the sequence number it
/// was published under.
#[derive(Debug, Clone)]
pub struct Published {
    pub artifact: Arc<ScreenshotArtifact>,
    pub sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn encode_produces_png_with_frame_dimensions() {
        let frame = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
        let capture = RawCapture::encode(&frame).unwrap();

        assert_eq!((capture.width(), capture.height()), (4, 3));
        assert!(capture.png().starts_with(b"\x89PNG\r\n\x1a\n"));

        let decoded = image::load_from_memory(capture.png()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }
}
