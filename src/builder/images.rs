//! Image renderer: pass-through read plus optional recompression
//!
//! With `compressImages` enabled, decodable images are re-encoded in
//! their own format, which normalizes encoder output and strips ancillary
//! data. Bytes the decoder does not recognize pass through untouched, so
//! a mixed asset directory never fails the build over one odd file.

use super::{BuildError, TypeBuilder};
use crate::build::file::BuildFile;
use image::ImageOutputFormat;
use std::io::Cursor;

/// Read each matched image; recompress when enabled and decodable.
pub(crate) fn render(
    builder: &TypeBuilder,
    mut files: Vec<BuildFile>,
) -> Result<Vec<BuildFile>, BuildError> {
    let compress = builder.is_enabled("compressImages");

    for file in &mut files {
        let bytes = builder.read_source(file)?;

        file.buffer = if compress {
            recompress(&bytes).unwrap_or(bytes)
        } else {
            bytes
        };
    }

    Ok(files)
}

/// Decode and re-encode in the same format. None when the input is not a
/// recognized or re-encodable image.
fn recompress(bytes: &[u8]) -> Option<Vec<u8>> {
    let format = image::guess_format(bytes).ok()?;
    let decoded = image::load_from_memory_with_format(bytes, format).ok()?;

    let mut out = Cursor::new(Vec::new());
    decoded.write_to(&mut out, ImageOutputFormat::from(format)).ok()?;

    Some(out.into_inner())
}
