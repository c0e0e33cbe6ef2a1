//! Derivative images: display copies and thumbnails.
//!
//! Dimension math lives in [`target_dimensions`] and is pure. A
//! [`SourceImage`] is decoded once and then resampled and JPEG-encoded per
//! derivative.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ImageReader, RgbImage};
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tempfile::TempPath;
use tracing::debug;

use crate::error::{GalleryError, Result};

/// JPEG quality for every derivative
pub const JPEG_QUALITY: u8 = 90;

/// How a derivative is bounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMode {
    /// Output height is exactly the size; width follows the aspect ratio
    ConstrainHeight(u32),
    /// The longer side is exactly the size (height for portraits, width otherwise)
    ConstrainLongerDimension(u32),
}

impl FromStr for SizeMode {
    type Err = GalleryError;

    /// Parse `<mode>:<pixels>`, e.g. `height:66` or `any:2048`
    fn from_str(s: &str) -> Result<Self> {
        let unsupported = || GalleryError::UnsupportedDimensionMode(s.to_string());

        let (mode, size) = s.split_once(':').ok_or_else(unsupported)?;
        let size: u32 = size.trim().parse().map_err(|_| unsupported())?;
        if size == 0 {
            return Err(unsupported());
        }

        match mode.trim().to_ascii_lowercase().as_str() {
            "height" => Ok(Self::ConstrainHeight(size)),
            "any" | "longer" => Ok(Self::ConstrainLongerDimension(size)),
            _ => Err(unsupported()),
        }
    }
}

impl fmt::Display for SizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConstrainHeight(size) => write!(f, "height:{}", size),
            Self::ConstrainLongerDimension(size) => write!(f, "any:{}", size),
        }
    }
}

/// Output `(width, height)` for a `width`×`height` source
///
/// The free side is rounded to the nearest pixel and never drops below 1.
pub fn target_dimensions(width: u32, height: u32, mode: SizeMode) -> (u32, u32) {
    let scale = |side: u32, size: u32, over: u32| -> u32 {
        ((side as f64 * size as f64 / over as f64).round() as u32).max(1)
    };

    match mode {
        SizeMode::ConstrainHeight(size) => (scale(width, size, height), size),
        SizeMode::ConstrainLongerDimension(size) if height > width => {
            (scale(width, size, height), size)
        }
        SizeMode::ConstrainLongerDimension(size) => (size, scale(height, size, width)),
    }
}

/// A decoded source image, ready to produce any number of derivatives
pub struct SourceImage<'a> {
    path: &'a Path,
    pixels: RgbImage,
}

impl<'a> SourceImage<'a> {
    /// Decode `path` once
    pub fn open(path: &'a Path) -> Result<Self> {
        let pixels = ImageReader::open(path)
            .map_err(|e| decode_failed(path, e))?
            .with_guessed_format()
            .map_err(|e| decode_failed(path, e))?
            .decode()
            .map_err(|e| decode_failed(path, e))?
            .into_rgb8();
        Ok(Self { path, pixels })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Resample per `mode` and write a JPEG to a temp file
    ///
    /// The temp file is removed when the returned [`TempPath`] is dropped.
    pub fn derive(&self, mode: SizeMode) -> Result<TempPath> {
        let (source_width, source_height) = self.dimensions();
        let (width, height) = target_dimensions(source_width, source_height, mode);
        debug!(
            "Resizing {} from {}x{} to {}x{}",
            self.path.display(),
            source_width,
            source_height,
            width,
            height
        );

        let resized = image::imageops::resize(&self.pixels, width, height, FilterType::Triangle);

        let encode_failed = |e: &dyn fmt::Display| {
            decode_failed(self.path, format!("cannot write resized image: {}", e))
        };

        let tmp = tempfile::Builder::new()
            .prefix("images")
            .suffix(".jpg")
            .tempfile()
            .map_err(|e| encode_failed(&e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            resized
                .write_with_encoder(encoder)
                .map_err(|e| encode_failed(&e))?;
            writer.flush().map_err(|e| encode_failed(&e))?;
        }

        Ok(tmp.into_temp_path())
    }
}

fn decode_failed(path: &Path, message: impl fmt::Display) -> GalleryError {
    GalleryError::DecodeFailed {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}
