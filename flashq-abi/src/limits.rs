//! Fixed sizes that define the on-disk layout. These are constants, not
//! configuration — widening `LUT_ENTRY_SIZE` or `HEADER_SIZE` changes the
//! on-disk format and is a breaking change for existing queue directories.

/// Width in bytes (== ASCII decimal digits) of a LUT slot / payload filename.
pub const LUT_ENTRY_SIZE: usize = 4;

/// Largest `max_entries` a LUT slot width of [`LUT_ENTRY_SIZE`] can name
/// uniquely without the reference-count wraparound collision noted in
/// spec.md's REDESIGN FLAGS. `10^LUT_ENTRY_SIZE - 1`.
pub const MAX_LIVE_ENTRIES_FOR_ENTRY_SIZE: u32 = 9_999;

/// Upper bound on `max_entries` the LUT array itself can hold (a `u8` index
/// space, per spec.md's header field width).
pub const LUT_CAPACITY_MAX: usize = 255;

/// `LUT_CAPACITY_MAX * LUT_ENTRY_SIZE`, the bound on the original embedded
/// target's configuration (spec.md 4.1).
pub const LUT_FILE_SIZE_MAX: usize = LUT_CAPACITY_MAX * LUT_ENTRY_SIZE;

/// Size in bytes of the encoded `.header` record.
pub const HEADER_SIZE: usize = 24;

/// Magic value stamped into a freshly created header, `"FLHQ"` read as a
/// little-endian u32. Used only to distinguish a valid header from a
/// truncated/garbage one on load; it is not part of spec.md's invariants.
pub const HEADER_MAGIC: u32 = u32::from_le_bytes(*b"FLHQ");

/// Maximum byte length of a queue name (spec.md 3: "recommended <= 31 bytes").
pub const MAX_NAME_LEN: usize = 31;

/// Capacity of the process-local handle table (spec.md 4.3).
pub const HANDLE_LIST_MAX: usize = 10;

/// Fixed filenames used inside every queue directory.
pub const HEADER_FILE_NAME: &str = ".header";
pub const LUT_FILE_NAME: &str = ".lut";
pub const RO_LOCK_FILE_NAME: &str = ".rolock";
pub const WO_LOCK_FILE_NAME: &str = ".wolock";
pub const RW_LOCK_FILE_NAME: &str = ".rwlock";
