//! On-disk Layout Manager (spec.md 4.1): encode/decode of the `.header`
//! record and the `.lut` array, plus payload filename minting.
//!
//! Mirrors the shape of `slopos-fs`'s `Ext2Fs` superblock handling: a fixed
//! binary record is the single source of truth for queue state, read whole
//! and written whole on every mutation, with an explicit magic check on
//! load instead of trusting whatever bytes happen to be on disk.

use flashq_abi::{
    HEADER_MAGIC, HEADER_SIZE, LUT_CAPACITY_MAX, LUT_ENTRY_SIZE, QueueError, QueueFlags,
};

/// The `.header` record, little-endian, no implicit padding (spec.md 6.4's
/// redesign note: "a reimplementation should adopt explicit little-endian
/// with no padding").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub max_entry_size: u16,
    pub max_entries: u8,
    pub num_of_entries: u8,
    pub head_lut_offs: u8,
    pub tail_lut_offs: u8,
    pub seek_lut_offs: u8,
    pub reference_count: u32,
    pub flags: QueueFlags,
}

impl Header {
    /// A freshly zeroed header for `Create`, per spec.md 4.4.1: all offsets
    /// and counts zero, `max_entry_size`/`max_entries`/`flags` as supplied.
    pub fn new(max_entry_size: u16, max_entries: u8, flags: QueueFlags) -> Self {
        Self {
            max_entry_size,
            max_entries,
            num_of_entries: 0,
            head_lut_offs: 0,
            tail_lut_offs: 0,
            seek_lut_offs: 0,
            reference_count: 0,
            flags,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&HEADER_MAGIC.to_le_bytes());
        out[4..6].copy_from_slice(&self.max_entry_size.to_le_bytes());
        out[6] = self.max_entries;
        out[7] = self.num_of_entries;
        out[8] = self.head_lut_offs;
        out[9] = self.tail_lut_offs;
        out[10] = self.seek_lut_offs;
        // out[11] is the explicit padding byte, left zero.
        out[12..16].copy_from_slice(&self.reference_count.to_le_bytes());
        out[16..18].copy_from_slice(&self.flags.bits().to_le_bytes());
        // out[18..24] is explicit reserved space, left zero.
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, QueueError> {
        if bytes.len() != HEADER_SIZE {
            return Err(QueueError::FsAccessFail);
        }
        let magic = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        if magic != HEADER_MAGIC {
            return Err(QueueError::FsAccessFail);
        }
        let max_entry_size = u16::from_le_bytes(bytes[4..6].try_into().unwrap());
        let max_entries = bytes[6];
        let num_of_entries = bytes[7];
        let head_lut_offs = bytes[8];
        let tail_lut_offs = bytes[9];
        let seek_lut_offs = bytes[10];
        let reference_count = u32::from_le_bytes(bytes[12..16].try_into().unwrap());
        let raw_flags = u16::from_le_bytes(bytes[16..18].try_into().unwrap());
        let flags = QueueFlags::from_bits_truncate(raw_flags);

        Ok(Self {
            max_entry_size,
            max_entries,
            num_of_entries,
            head_lut_offs,
            tail_lut_offs,
            seek_lut_offs,
            reference_count,
            flags,
        })
    }
}

/// The `.lut` array: `max_entries` fixed-width slots, each either a
/// zero-padded decimal reference string or all-zero bytes for "empty"
/// (spec.md 4.1). Backed by a fixed-capacity array — no heap allocation —
/// matching the teacher's fixed `[FileDescriptor; N]` handle tables.
#[derive(Debug, Clone, Copy)]
pub struct Lut {
    slots: [[u8; LUT_ENTRY_SIZE]; LUT_CAPACITY_MAX],
    len: u8,
}

impl Lut {
    pub fn zeroed(len: u8) -> Self {
        Self {
            slots: [[0u8; LUT_ENTRY_SIZE]; LUT_CAPACITY_MAX],
            len,
        }
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn byte_len(&self) -> usize {
        self.len as usize * LUT_ENTRY_SIZE
    }

    /// Decode a `.lut` file's raw bytes (`len * LUT_ENTRY_SIZE` bytes)
    /// into slots.
    pub fn decode(len: u8, bytes: &[u8]) -> Result<Self, QueueError> {
        if bytes.len() != len as usize * LUT_ENTRY_SIZE {
            return Err(QueueError::FsAccessFail);
        }
        let mut lut = Self::zeroed(len);
        for (i, slot) in lut.slots[..len as usize].iter_mut().enumerate() {
            let start = i * LUT_ENTRY_SIZE;
            slot.copy_from_slice(&bytes[start..start + LUT_ENTRY_SIZE]);
        }
        Ok(lut)
    }

    /// Encode the live portion of the LUT into `out`, which must be exactly
    /// [`Lut::byte_len`] bytes.
    pub fn encode_into(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.byte_len());
        for (i, slot) in self.slots[..self.len as usize].iter().enumerate() {
            let start = i * LUT_ENTRY_SIZE;
            out[start..start + LUT_ENTRY_SIZE].copy_from_slice(slot);
        }
    }

    pub fn slot(&self, index: u8) -> &[u8; LUT_ENTRY_SIZE] {
        &self.slots[index as usize]
    }

    pub fn set_slot(&mut self, index: u8, value: [u8; LUT_ENTRY_SIZE]) {
        self.slots[index as usize] = value;
    }

    pub fn clear_slot(&mut self, index: u8) {
        self.slots[index as usize] = [0u8; LUT_ENTRY_SIZE];
    }

    pub fn is_slot_empty(&self, index: u8) -> bool {
        self.slots[index as usize] == [0u8; LUT_ENTRY_SIZE]
    }
}

/// Render `reference_count`'s low `LUT_ENTRY_SIZE` decimal digits as a
/// zero-padded ASCII string (spec.md 4.1). The caller increments
/// `reference_count` first; this function is pure.
pub fn mint_reference(reference_count: u32) -> [u8; LUT_ENTRY_SIZE] {
    let modulus = 10u32.pow(LUT_ENTRY_SIZE as u32);
    let mut value = reference_count % modulus;
    let mut out = [b'0'; LUT_ENTRY_SIZE];
    for i in (0..LUT_ENTRY_SIZE).rev() {
        out[i] = b'0' + (value % 10) as u8;
        value /= 10;
    }
    out
}

/// Render a reference as the payload filename string it also serves as.
pub fn reference_to_name(reference: &[u8; LUT_ENTRY_SIZE]) -> heapless::String<LUT_ENTRY_SIZE> {
    let mut name = heapless::String::new();
    // `reference` is always ASCII decimal digits by construction; the
    // `unwrap` can only fail if something upstream corrupted the LUT.
    name.push_str(core::str::from_utf8(reference).unwrap_or("0000"))
        .ok();
    name
}
