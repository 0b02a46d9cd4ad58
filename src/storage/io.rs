//! Shared byte-moving helpers
//!
//! Used by every medium so seek checks, short reads and write
//! verification behave the same regardless of what backs the bytes.

use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use crate::error::{NvmError, Result};

/// Position `handle` at `offset`, refusing offsets past the end
pub(crate) fn seek_to<S: Seek>(handle: &mut S, offset: u32, medium_len: u64) -> Result<()> {
    if u64::from(offset) > medium_len {
        return Err(NvmError::Seek { offset, medium_len });
    }
    handle.seek(SeekFrom::Start(u64::from(offset)))?;
    Ok(())
}

/// Read exactly `len` bytes from the current position
pub(crate) fn read_counted<R: Read>(handle: &mut R, offset: u32, len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len);
    handle.by_ref().take(len as u64).read_to_end(&mut buf)?;

    if buf.len() != len {
        return Err(NvmError::ShortRead {
            offset,
            expected: len,
            actual: buf.len(),
        });
    }
    Ok(buf)
}

/// Write all of `bytes` at the current position
pub(crate) fn write_bytes<W: Write>(handle: &mut W, offset: u32, bytes: &[u8]) -> Result<()> {
    handle.write_all(bytes).map_err(|e| match e.kind() {
        ErrorKind::WriteZero => NvmError::ShortWrite {
            offset,
            expected: bytes.len(),
        },
        _ => NvmError::Io(e),
    })?;
    handle.flush()?;
    Ok(())
}

/// Re-read `expected.len()` bytes at `offset` and compare them with what
/// was just written
///
/// Any failure along the way (seek, short read, mismatch) is reported as
/// `VerificationFailed`.
pub(crate) fn verify_written<H: Read + Seek>(
    handle: &mut H,
    offset: u32,
    expected: &[u8],
) -> Result<()> {
    let failed = |detail: String| NvmError::VerificationFailed { offset, detail };

    handle
        .seek(SeekFrom::Start(u64::from(offset)))
        .map_err(|e| failed(format!("seek failed: {}", e)))?;

    let actual = read_counted(handle, offset, expected.len()).map_err(|e| failed(e.to_string()))?;

    if let Some(pos) = actual.iter().zip(expected).position(|(a, b)| a != b) {
        return Err(failed(format!(
            "byte {} reads back as {:#04x}, wrote {:#04x}",
            pos, actual[pos], expected[pos]
        )));
    }

    Ok(())
}
