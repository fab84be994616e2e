//! Photo content type with header-only dimension parsing
//!
//! A [`Photo`] carries the raw file bytes plus the format and pixel
//! dimensions read from the file header. No pixel decoding happens
//! here; codecs are external collaborators, and everything the built-in
//! stages need (orientation, size annotations, byte-for-byte export)
//! is available from the headers alone.

use std::path::Path;

use photoflow_core::{Loader, Observation};

use crate::error::{Error, Result};

/// Extensions recognized by the directory scanner
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp"];

/// Photo file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoFormat {
    /// JPEG format
    Jpeg,
    /// PNG format
    Png,
    /// GIF format
    Gif,
    /// BMP format
    Bmp,
    /// TIFF format
    Tiff,
    /// WebP format
    WebP,
    /// Unknown format
    Unknown,
}

impl PhotoFormat {
    /// Detect photo format from file extension
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => PhotoFormat::Jpeg,
            "png" => PhotoFormat::Png,
            "gif" => PhotoFormat::Gif,
            "bmp" => PhotoFormat::Bmp,
            "tiff" | "tif" => PhotoFormat::Tiff,
            "webp" => PhotoFormat::WebP,
            _ => PhotoFormat::Unknown,
        }
    }

    /// Detect photo format from magic bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.len() < 12 {
            return PhotoFormat::Unknown;
        }

        match bytes {
            // JPEG: FF D8 FF
            [0xFF, 0xD8, 0xFF, ..] => PhotoFormat::Jpeg,

            // PNG: 89 50 4E 47 0D 0A 1A 0A
            [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, ..] => PhotoFormat::Png,

            // GIF: 47 49 46 38 ("GIF8")
            [0x47, 0x49, 0x46, 0x38, ..] => PhotoFormat::Gif,

            // BMP: 42 4D ("BM")
            [0x42, 0x4D, ..] => PhotoFormat::Bmp,

            // TIFF: 49 49 2A 00 or 4D 4D 00 2A
            [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => PhotoFormat::Tiff,

            // WebP: 52 49 46 46 ?? ?? ?? ?? 57 45 42 50
            [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => PhotoFormat::WebP,

            _ => PhotoFormat::Unknown,
        }
    }
}

/// A photo under attention: raw bytes plus header-derived dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    bytes: Vec<u8>,
    format: PhotoFormat,
    width: u32,
    height: u32,
}

impl Photo {
    /// Parse a photo from raw file bytes.
    ///
    /// Format is detected from magic bytes first, falling back to the
    /// supplied extension hint. Fails if the header is malformed or the
    /// format carries no parseable dimensions.
    pub fn from_bytes(bytes: Vec<u8>, extension_hint: Option<&str>) -> Result<Self> {
        let mut format = PhotoFormat::from_bytes(&bytes);
        if format == PhotoFormat::Unknown {
            if let Some(ext) = extension_hint {
                format = PhotoFormat::from_extension(ext);
            }
        }

        let (width, height) = parse_dimensions(&bytes, format)?;
        Ok(Self {
            bytes,
            format,
            width,
            height,
        })
    }

    /// The raw file bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The detected format
    pub fn format(&self) -> PhotoFormat {
        self.format
    }

    /// Pixel width from the header
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Pixel height from the header
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the photo is wider than it is tall
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

/// Read a photo from disk: the content loader handed to observations
pub fn load_photo(path: &Path) -> anyhow::Result<Photo> {
    let bytes = std::fs::read(path)?;
    let extension = path.extension().and_then(|e| e.to_str());
    Ok(Photo::from_bytes(bytes, extension)?)
}

/// Shared loader capability wrapping [`load_photo`]
pub fn photo_loader() -> Loader<Photo> {
    std::sync::Arc::new(|path: &Path| load_photo(path))
}

/// An observation over a photo file
pub type PhotoObservation = Observation<Photo>;

fn parse_dimensions(bytes: &[u8], format: PhotoFormat) -> Result<(u32, u32)> {
    match format {
        PhotoFormat::Png => parse_png_dimensions(bytes),
        PhotoFormat::Jpeg => parse_jpeg_dimensions(bytes),
        PhotoFormat::Gif => parse_gif_dimensions(bytes),
        PhotoFormat::Bmp => parse_bmp_dimensions(bytes),
        PhotoFormat::Tiff | PhotoFormat::WebP | PhotoFormat::Unknown => Err(Error::Format(
            format!("no dimension parser for {format:?}"),
        )),
    }
}

/// PNG: IHDR is the first chunk after the 8-byte signature; width and
/// height are big-endian u32 at its start.
fn parse_png_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    if bytes.len() < 24 || &bytes[12..16] != b"IHDR" {
        return Err(Error::Format("PNG missing IHDR chunk".to_string()));
    }
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
    Ok((width, height))
}

/// JPEG: walk the marker segments until a start-of-frame; height and
/// width are big-endian u16 after the precision byte.
fn parse_jpeg_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let mut pos = 2; // past SOI
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return Err(Error::Format("JPEG marker stream desynchronized".to_string()));
        }
        let marker = bytes[pos + 1];

        // Standalone markers carry no length
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if (0xD0..=0xD9).contains(&marker) {
            pos += 2;
            continue;
        }

        let length = usize::from(u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]));
        if length < 2 {
            return Err(Error::Format("JPEG segment length undersized".to_string()));
        }
        if is_sof_marker(marker) {
            if pos + 9 > bytes.len() {
                break;
            }
            let height = u32::from(u16::from_be_bytes([bytes[pos + 5], bytes[pos + 6]]));
            let width = u32::from(u16::from_be_bytes([bytes[pos + 7], bytes[pos + 8]]));
            return Ok((width, height));
        }
        if marker == 0xDA {
            // Entropy-coded data follows; no frame header was seen
            break;
        }
        pos += 2 + length;
    }
    Err(Error::Format("JPEG start-of-frame not found".to_string()))
}

/// SOF0-SOF15, excluding DHT (C4), JPG (C8) and DAC (CC)
fn is_sof_marker(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

/// GIF: logical screen descriptor, little-endian u16 pair at offset 6
fn parse_gif_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    if bytes.len() < 10 {
        return Err(Error::Format("GIF header truncated".to_string()));
    }
    let width = u32::from(u16::from_le_bytes([bytes[6], bytes[7]]));
    let height = u32::from(u16::from_le_bytes([bytes[8], bytes[9]]));
    Ok((width, height))
}

/// BMP: BITMAPINFOHEADER, little-endian i32 pair at offset 18. Height
/// may be negative for top-down bitmaps.
fn parse_bmp_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    if bytes.len() < 26 {
        return Err(Error::Format("BMP header truncated".to_string()));
    }
    let width = i32::from_le_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]);
    let height = i32::from_le_bytes([bytes[22], bytes[23], bytes[24], bytes[25]]);
    Ok((width.unsigned_abs(), height.unsigned_abs()))
}
