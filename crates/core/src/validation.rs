//! Upload validation: file type by magic bytes, size against a ceiling.
//!
//! Detection looks at content, never at the client-supplied filename or
//! extension. JPEG and PNG are identified by their leading signatures;
//! HEIC by an `ftyp` box at offset 4 followed by a known brand.

use crate::error::ConvertError;
use crate::job::ImageFormat;

/// Default upload size ceiling (10 MiB), matching `MAX_UPLOAD_MB`'s
/// default.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// HEIC/HEIF brand identifiers that may follow the `ftyp` marker.
const HEIC_BRANDS: [&[u8; 4]; 6] = [b"heic", b"heix", b"hevc", b"hevx", b"mif1", b"msf1"];

/// Identify the raster format of `content` from its magic bytes.
pub fn detect_format(content: &[u8]) -> Result<ImageFormat, ConvertError> {
    if content.len() < 12 {
        return Err(ConvertError::InvalidFileType(
            "file too small to identify".to_string(),
        ));
    }

    if content.starts_with(JPEG_MAGIC) {
        return Ok(ImageFormat::Jpeg);
    }
    if content.starts_with(PNG_MAGIC) {
        return Ok(ImageFormat::Png);
    }

    // HEIC: "ftyp" at bytes 4..8, brand at 8..12.
    if &content[4..8] == b"ftyp" {
        let brand = &content[8..12];
        if HEIC_BRANDS.iter().any(|b| *b as &[u8] == brand) {
            return Ok(ImageFormat::Heic);
        }
    }

    Err(ConvertError::InvalidFileType(
        "unrecognized image signature".to_string(),
    ))
}

/// Validate the upload size against the ceiling. Returns the size.
///
/// Empty uploads are rejected as an invalid file type, mirroring the
/// detection path (nothing to identify).
pub fn validate_size(content: &[u8], max_bytes: u64) -> Result<u64, ConvertError> {
    let size = content.len() as u64;
    if size == 0 {
        return Err(ConvertError::InvalidFileType("file is empty".to_string()));
    }
    if size > max_bytes {
        return Err(ConvertError::FileTooLarge {
            actual_bytes: size,
            max_bytes,
        });
    }
    Ok(size)
}
