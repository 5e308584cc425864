//! Handle Table (spec.md 4.3): a fixed-capacity, process-local registry
//! mapping open handles to `{name, access, mode}`.
//!
//! spec.md's REDESIGN FLAGS call out that the original source hands back a
//! raw pointer into this table, which lets a caller use a handle after its
//! slot has been reassigned to a different queue. [`QueueHandle`] closes
//! that hole the way the note prescribes: it carries a generation counter
//! alongside the slot index, and [`HandleTable::validate`] checks both.

use flashq_abi::{AccessMode, AccessType, MAX_NAME_LEN, QueueError};
use heapless::String;

/// An opaque reference to an open queue. Only ever constructed by
/// [`HandleTable::reserve`]; valid only until the matching
/// [`HandleTable::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueHandle {
    pub(crate) index: u16,
    pub(crate) generation: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct HandleEntry {
    pub name: String<MAX_NAME_LEN>,
    pub access: AccessType,
    pub mode: AccessMode,
}

#[derive(Clone)]
struct Slot {
    generation: u32,
    entry: Option<HandleEntry>,
}

/// Fixed-capacity table of `N` rows, linearly scanned (spec.md 4.3: "The
/// table is looked up by linear scan"). `N` is `HANDLE_LIST_MAX` in
/// production; tests use smaller values to exercise `HandleNotAvail`
/// cheaply.
pub struct HandleTable<const N: usize> {
    slots: [Slot; N],
}

impl<const N: usize> HandleTable<N> {
    /// Every slot starts free, as spec.md 4.3 requires at process start.
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| Slot {
                generation: 0,
                entry: None,
            }),
        }
    }

    /// Find the row bound to `name`, if any.
    pub fn find_by_name(&self, name: &str) -> Option<(QueueHandle, &HandleEntry)> {
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(entry) = &slot.entry {
                if entry.name.as_str() == name {
                    let handle = QueueHandle {
                        index: index as u16,
                        generation: slot.generation,
                    };
                    return Some((handle, entry));
                }
            }
        }
        None
    }

    /// Bind `entry` into the first free row, returning the new handle.
    pub fn reserve(&mut self, entry: HandleEntry) -> Result<QueueHandle, QueueError> {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.is_none() {
                slot.entry = Some(entry);
                return Ok(QueueHandle {
                    index: index as u16,
                    generation: slot.generation,
                });
            }
        }
        Err(QueueError::HandleNotAvail)
    }

    /// Confirm `handle` still points at a live row and return it.
    pub fn validate(&self, handle: QueueHandle) -> Result<&HandleEntry, QueueError> {
        let slot = self
            .slots
            .get(handle.index as usize)
            .ok_or(QueueError::InvalidHandle)?;
        if slot.generation != handle.generation {
            return Err(QueueError::InvalidHandle);
        }
        slot.entry.as_ref().ok_or(QueueError::InvalidHandle)
    }

    /// Free `handle`'s row, bumping its generation so any copy of the old
    /// handle fails [`HandleTable::validate`] from then on.
    pub fn release(&mut self, handle: QueueHandle) -> Result<(), QueueError> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .ok_or(QueueError::InvalidHandle)?;
        if slot.generation != handle.generation || slot.entry.is_none() {
            return Err(QueueError::InvalidHandle);
        }
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        Ok(())
    }
}

impl<const N: usize> Default for HandleTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> HandleEntry {
        HandleEntry {
            name: name.parse().unwrap(),
            access: AccessType::ReadWrite,
            mode: AccessMode::BinaryPacked,
        }
    }

    #[test]
    fn reserve_then_validate() {
        let mut table: HandleTable<4> = HandleTable::new();
        let h = table.reserve(entry("orders")).unwrap();
        assert!(table.validate(h).is_ok());
    }

    #[test]
    fn find_by_name_after_reserve() {
        let mut table: HandleTable<4> = HandleTable::new();
        let h = table.reserve(entry("orders")).unwrap();
        let (found, _) = table.find_by_name("orders").unwrap();
        assert_eq!(found, h);
        assert!(table.find_by_name("missing").is_none());
    }

    #[test]
    fn release_invalidates_old_handle_even_if_slot_reused() {
        let mut table: HandleTable<1> = HandleTable::new();
        let h1 = table.reserve(entry("a")).unwrap();
        table.release(h1).unwrap();

        let h2 = table.reserve(entry("b")).unwrap();
        assert_eq!(h1.index, h2.index);
        assert_ne!(h1.generation, h2.generation);

        assert_eq!(table.validate(h1), Err(QueueError::InvalidHandle));
        assert!(table.validate(h2).is_ok());
    }

    #[test]
    fn table_exhaustion_is_handle_not_avail() {
        let mut table: HandleTable<1> = HandleTable::new();
        table.reserve(entry("a")).unwrap();
        assert_eq!(
            table.reserve(entry("b")).unwrap_err(),
            QueueError::HandleNotAvail
        );
    }

    #[test]
    fn double_release_is_invalid_handle() {
        let mut table: HandleTable<1> = HandleTable::new();
        let h = table.reserve(entry("a")).unwrap();
        table.release(h).unwrap();
        assert_eq!(table.release(h), Err(QueueError::InvalidHandle));
    }
}
