//! Normalizes uploaded images before any blob store sees them.
//!
//! Shared by every `BlobStore` strategy so that local and S3 storage hold the
//! same bytes for the same upload.

use std::io::Cursor;

use bytes::Bytes;
use domains::{BlobMetadata, UploadError};
use image::{imageops::FilterType, ImageFormat, ImageReader};
use sha2::{Digest, Sha256};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_DIMENSION: u32 = 1080;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePolicy {
    pub max_upload_bytes: usize,
    /// Longest allowed side in pixels; larger images are downscaled.
    pub max_dimension: u32,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

/// An accepted image, ready to be written.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub bytes: Bytes,
    pub format: ImageFormat,
    /// Hex SHA-256 of `bytes`; used as the content address.
    pub hash: String,
}

impl PreparedImage {
    pub fn extension(&self) -> &'static str {
        match self.format {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            _ => "webp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self.format {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            _ => "image/webp",
        }
    }

    /// `<hash>.<ext>`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.hash, self.extension())
    }
}

/// Validates and normalizes an upload.
///
/// The format is sniffed from the bytes; the declared content type (or the
/// one guessed from the filename) only has to claim to be an image.
pub fn prepare(
    data: Bytes,
    meta: &BlobMetadata,
    policy: &ImagePolicy,
) -> Result<PreparedImage, UploadError> {
    if data.len() > policy.max_upload_bytes {
        return Err(UploadError::TooLarge {
            limit: policy.max_upload_bytes,
            actual: data.len(),
        });
    }

    let declared = meta.content_type.clone().or_else(|| {
        meta.filename
            .as_deref()
            .and_then(|name| mime_guess::from_path(name).first())
    });
    if let Some(declared) = declared {
        if declared.type_() != mime::IMAGE {
            return Err(UploadError::NotAnImage);
        }
    }

    let format = image::guess_format(&data).map_err(|_| UploadError::NotAnImage)?;
    match format {
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP => {}
        other => return Err(UploadError::UnsupportedFormat(format!("{other:?}"))),
    }

    let bytes = if format == ImageFormat::Gif {
        // Re-encoding would drop animation frames.
        data
    } else {
        let resized = downscale(&data, format, policy.max_dimension)?;
        let bytes = resized.unwrap_or(data);
        if format == ImageFormat::Png {
            optimize_png(bytes)
        } else {
            bytes
        }
    };

    let hash = hex::encode(Sha256::digest(&bytes));
    Ok(PreparedImage { bytes, format, hash })
}

/// Returns `None` when the image already fits.
fn downscale(data: &[u8], format: ImageFormat, max: u32) -> Result<Option<Bytes>, UploadError> {
    let (width, height) = ImageReader::with_format(Cursor::new(data), format)
        .into_dimensions()
        .map_err(|e| UploadError::Processing(e.to_string()))?;
    if width <= max && height <= max {
        return Ok(None);
    }

    let img = image::load_from_memory_with_format(data, format)
        .map_err(|e| UploadError::Processing(e.to_string()))?;
    let resized = img.resize(max, max, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, format)
        .map_err(|e| UploadError::Processing(e.to_string()))?;
    tracing::debug!(width, height, max, "downscaled upload");
    Ok(Some(Bytes::from(out.into_inner())))
}

fn optimize_png(bytes: Bytes) -> Bytes {
    match oxipng::optimize_from_memory(&bytes, &oxipng::Options::default()) {
        Ok(optimized) if optimized.len() < bytes.len() => Bytes::from(optimized),
        Ok(_) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "png optimization failed, keeping original");
            bytes
        }
    }
}
