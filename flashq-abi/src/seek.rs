/// How `Seek` interprets its `position` argument (spec.md 4.4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekType {
    /// Seek to the oldest live entry.
    Head,
    /// Seek to the newest live entry.
    Tail,
    /// Seek to the entry `position` slots after head, `0 <= position < num_of_entries`.
    Position,
}
