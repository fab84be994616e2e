//! Minimal EXIF date extraction
//!
//! Walks a JPEG's APP1 segment for the TIFF block and reads
//! `DateTimeOriginal` from the Exif IFD, falling back to IFD0's
//! `DateTime`. Only what the date filter needs; anything absent or
//! malformed yields `None`, never an error.

use chrono::NaiveDateTime;

/// EXIF timestamp format, colons and all
pub const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

const TAG_EXIF_IFD_POINTER: u16 = 0x8769;
const TAG_DATETIME_ORIGINAL: u16 = 0x9003;
const TAG_DATETIME: u16 = 0x0132;

const TYPE_ASCII: u16 = 2;
const TYPE_LONG: u16 = 4;

/// Extract the capture timestamp from a JPEG's EXIF data.
///
/// Prefers `DateTimeOriginal` from the Exif IFD; falls back to the
/// IFD0 `DateTime`. Returns `None` when no APP1/Exif block exists or
/// the data is malformed.
pub fn datetime_original(jpeg: &[u8]) -> Option<NaiveDateTime> {
    let tiff = find_app1_tiff(jpeg)?;
    let reader = TiffReader::new(tiff)?;

    let ifd0 = reader.u32_at(4)? as usize;

    let from_exif_ifd = reader
        .find_entry(ifd0, TAG_EXIF_IFD_POINTER)
        .filter(|e| e.field_type == TYPE_LONG)
        .and_then(|e| reader.u32_at(e.value_offset))
        .and_then(|exif_ifd| reader.find_entry(exif_ifd as usize, TAG_DATETIME_ORIGINAL))
        .and_then(|e| reader.ascii_value(&e));

    let date_str = from_exif_ifd.or_else(|| {
        reader
            .find_entry(ifd0, TAG_DATETIME)
            .and_then(|e| reader.ascii_value(&e))
    })?;

    NaiveDateTime::parse_from_str(date_str.trim_end_matches('\0').trim(), EXIF_DATE_FORMAT).ok()
}

/// Locate the TIFF block inside the first APP1 segment carrying an
/// `Exif\0\0` identifier.
fn find_app1_tiff(jpeg: &[u8]) -> Option<&[u8]> {
    if !jpeg.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut pos = 2;
    while pos + 4 <= jpeg.len() {
        if jpeg[pos] != 0xFF {
            return None;
        }
        let marker = jpeg[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if (0xD0..=0xD9).contains(&marker) {
            pos += 2;
            continue;
        }
        if marker == 0xDA {
            return None;
        }

        let length = usize::from(u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]));
        // The declared length covers its own two bytes; anything
        // shorter is a corrupt segment.
        if length < 2 {
            return None;
        }
        let payload_start = pos + 4;
        let payload_end = pos + 2 + length;
        if payload_end > jpeg.len() {
            return None;
        }
        if marker == 0xE1 {
            let payload = &jpeg[payload_start..payload_end];
            if let Some(tiff) = payload.strip_prefix(b"Exif\0\0") {
                return Some(tiff);
            }
        }
        pos = payload_end;
    }
    None
}

/// An IFD entry's type and the offset of its 4-byte value field
struct IfdEntry {
    field_type: u16,
    count: u32,
    value_offset: usize,
}

/// Byte-order aware reader over a TIFF block
struct TiffReader<'a> {
    data: &'a [u8],
    big_endian: bool,
}

impl<'a> TiffReader<'a> {
    fn new(data: &'a [u8]) -> Option<Self> {
        let big_endian = match data.get(..2)? {
            b"II" => false,
            b"MM" => true,
            _ => return None,
        };
        let reader = Self { data, big_endian };
        // 42, the TIFF magic
        if reader.u16_at(2)? != 42 {
            return None;
        }
        Some(reader)
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        let raw: [u8; 2] = self.data.get(offset..offset + 2)?.try_into().ok()?;
        Some(if self.big_endian {
            u16::from_be_bytes(raw)
        } else {
            u16::from_le_bytes(raw)
        })
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let raw: [u8; 4] = self.data.get(offset..offset + 4)?.try_into().ok()?;
        Some(if self.big_endian {
            u32::from_be_bytes(raw)
        } else {
            u32::from_le_bytes(raw)
        })
    }

    /// Scan one IFD for a tag
    fn find_entry(&self, ifd_offset: usize, tag: u16) -> Option<IfdEntry> {
        let count = usize::from(self.u16_at(ifd_offset)?);
        for i in 0..count {
            let base = ifd_offset + 2 + i * 12;
            if self.u16_at(base)? == tag {
                return Some(IfdEntry {
                    field_type: self.u16_at(base + 2)?,
                    count: self.u32_at(base + 4)?,
                    value_offset: base + 8,
                });
            }
        }
        None
    }

    /// Resolve an ASCII entry's string, inline or offset-addressed
    fn ascii_value(&self, entry: &IfdEntry) -> Option<&str> {
        if entry.field_type != TYPE_ASCII {
            return None;
        }
        let len = entry.count as usize;
        let bytes = if len <= 4 {
            self.data.get(entry.value_offset..entry.value_offset + len)?
        } else {
            let offset = self.u32_at(entry.value_offset)? as usize;
            self.data.get(offset..offset + len)?
        };
        std::str::from_utf8(bytes).ok()
    }
}
