//! Small helpers for reading fixed-width, big-endian fields out of a byte
//! slice without heap allocation.
//!
//! This plays the role the teacher's `BytesExt` iterator trait plays for
//! owned byte iterators, adapted to borrowed slices: decoders here never
//! take ownership of the input, so reads are bounds-checked slice indexing
//! rather than iterator consumption.

/// Reads a big-endian `u16` at `offset`, or `None` if it would run past the
/// end of `bytes`.
pub(crate) fn u16_be(bytes: &[u8], offset: usize) -> Option<u16> {
    let slice = bytes.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([slice[0], slice[1]]))
}

/// Reads a big-endian `u32` at `offset`, or `None` if it would run past the
/// end of `bytes`.
pub(crate) fn u32_be(bytes: &[u8], offset: usize) -> Option<u32> {
    let slice = bytes.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

/// Reads `N` raw bytes at `offset`, or `None` if it would run past the end
/// of `bytes`.
pub(crate) fn array<const N: usize>(bytes: &[u8], offset: usize) -> Option<[u8; N]> {
    let slice = bytes.get(offset..offset + N)?;
    slice.try_into().ok()
}
