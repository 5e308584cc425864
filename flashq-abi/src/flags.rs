use bitflags::bitflags;

bitflags! {
    /// Per-queue capability flags stored in the header (spec.md 3).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct QueueFlags: u16 {
        /// Entries are newline-delimited text records rather than opaque
        /// binary blobs. Purely advisory to callers; see [`crate::AccessMode::MessageLog`].
        const MESSAGE_LOG   = 1 << 0;
        /// `Seek`/`GetEntry` are permitted. Without this flag `Seek` returns
        /// `QueueNotSeekable` (spec.md 4.4.7).
        const RANDOM_ACCESS = 1 << 1;
    }
}

impl Default for QueueFlags {
    fn default() -> Self {
        QueueFlags::empty()
    }
}
