//! Relative path construction. The engine never changes a process-wide
//! working directory (spec.md 9's chdir redesign); every path handed to the
//! [`flashq_port::FilesystemPort`] is built here from a queue name and a
//! fixed filename.

use core::fmt::Write;

/// Long enough for `"<31-byte name>/.lut"` and friends with room to spare.
pub const PATH_BUF_LEN: usize = 48;

pub type PathBuf = heapless::String<PATH_BUF_LEN>;

pub fn entry_path(queue: &str, file: &str) -> PathBuf {
    let mut buf = PathBuf::new();
    // Fixed-capacity write; queue names are bounded by MAX_NAME_LEN and
    // every `file` argument here is one of the short constant filenames, so
    // this cannot overflow in practice. A failed write just yields an
    // empty/partial path, which downstream `exists`/`open` calls treat as
    // not found rather than panicking.
    let _ = write!(buf, "{queue}/{file}");
    buf
}
