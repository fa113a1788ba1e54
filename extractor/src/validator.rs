//! Image validation

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use image::{ImageReader, Limits};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

use crate::error::*;

/// Largest side accepted before decoding
const MAX_DIMENSION: u32 = 16_384;

/// Supported raster formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
            ImageFormat::Bmp => "bmp",
        }
    }

    fn from_image(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
            image::ImageFormat::Png => Some(ImageFormat::Png),
            image::ImageFormat::Gif => Some(ImageFormat::Gif),
            image::ImageFormat::WebP => Some(ImageFormat::Webp),
            image::ImageFormat::Bmp => Some(ImageFormat::Bmp),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMeta {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ImageMeta {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("empty image body")]
    Empty,
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error("unsupported image format: {0:?}")]
    Unsupported(image::ImageFormat),
    #[error("image does not decode: {0}")]
    Decode(String),
    #[error("image too small: {width}x{height}, need at least {min}x{min}")]
    TooSmall { width: u32, height: u32, min: u32 },
}

impl From<ValidationError> for Failure {
    fn from(e: ValidationError) -> Self {
        Failure::new(FailureReason::InvalidImage, e.to_string())
    }
}

type Detected<'a> = (ImageReader<Cursor<&'a [u8]>>, ImageFormat);

fn detect(bytes: &[u8]) -> std::result::Result<Detected<'_>, ValidationError> {
    if bytes.is_empty() {
        return Err(ValidationError::Empty);
    }
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ValidationError::Decode(e.to_string()))?;
    let format = reader.format().ok_or(ValidationError::UnknownFormat)?;
    let format = ImageFormat::from_image(format).ok_or(ValidationError::Unsupported(format))?;
    Ok((reader, format))
}

/// Confirm the bytes decode as a supported raster image of at least `min_dimension` per side
pub fn validate(
    bytes: &[u8],
    min_dimension: u32,
) -> std::result::Result<ImageMeta, ValidationError> {
    let (mut reader, format) = detect(bytes)?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DIMENSION);
    limits.max_image_height = Some(MAX_DIMENSION);
    reader.limits(limits);

    let decoded = reader
        .decode()
        .map_err(|e| ValidationError::Decode(e.to_string()))?;
    let (width, height) = (decoded.width(), decoded.height());
    if width < min_dimension || height < min_dimension {
        return Err(ValidationError::TooSmall {
            width,
            height,
            min: min_dimension,
        });
    }

    Ok(ImageMeta {
        format,
        width,
        height,
    })
}

/// Read dimensions from a (possibly truncated) header without decoding pixels
pub fn peek_dimensions(bytes: &[u8]) -> std::result::Result<ImageMeta, ValidationError> {
    let (reader, format) = detect(bytes)?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ValidationError::Decode(e.to_string()))?;
    Ok(ImageMeta {
        format,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{jpeg, png};

    #[test]
    fn test_validate_png() {
        let meta = validate(&png(64, 48), 16).unwrap();
        assert_eq!(
            meta,
            ImageMeta {
                format: ImageFormat::Png,
                width: 64,
                height: 48,
            }
        );
        assert_eq!(meta.area(), 64 * 48);
    }

    #[test]
    fn test_validate_jpeg() {
        let meta = validate(&jpeg(32, 32), 16).unwrap();
        assert_eq!(meta.format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_rejects_tracking_pixel() {
        let err = validate(&png(1, 1), 16).unwrap_err();
        assert!(matches!(err, ValidationError::TooSmall { width: 1, height: 1, .. }));
        assert_eq!(Failure::from(err).reason, FailureReason::InvalidImage);
    }

    #[test]
    fn test_rejects_non_image() {
        assert!(matches!(validate(b"", 1), Err(ValidationError::Empty)));
        assert!(matches!(
            validate(b"<html><body>not found</body></html>", 1),
            Err(ValidationError::UnknownFormat)
        ));
    }

    #[test]
    fn test_rejects_truncated() {
        let bytes = png(64, 64);
        assert!(matches!(
            validate(&bytes[..bytes.len() / 2], 1),
            Err(ValidationError::Decode(_))
        ));
    }

    #[test]
    fn test_peek_truncated_header() {
        let bytes = png(300, 200);
        let meta = peek_dimensions(&bytes[..128]).unwrap();
        assert_eq!((meta.width, meta.height), (300, 200));
    }
}
