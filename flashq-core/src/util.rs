//! Byte Utilities (spec.md 2): fill-memory and copy-memory primitives, kept
//! as named functions rather than inlined at call sites because spec.md
//! calls these out as a distinct, swappable collaborator — an embedded
//! target might supply DMA-backed versions of both.

/// Fill `dst` entirely with `value`.
pub fn fill(dst: &mut [u8], value: u8) {
    dst.fill(value);
}

/// Copy `min(src.len(), dst.len())` bytes from `src` into `dst`, returning
/// the number of bytes copied.
pub fn copy(dst: &mut [u8], src: &[u8]) -> usize {
    let n = dst.len().min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
    n
}
