//! Per-thread single-slot cache of one pre-allocated [`Archive`].
//!
//! [`acquire`] hands out an exclusive [`Lease`]. The first lease on a thread
//! takes the slot's archive; a lease requested while the slot is already out
//! (a nested call issued from inside another call on the same thread) gets a
//! freshly allocated archive instead. Dropping the lease returns a slot
//! archive, rewound but with its capacity intact, or frees a fresh one.

use crate::archive::Archive;
use std::{
    cell::RefCell,
    marker::PhantomData,
    mem,
    ops::{Deref, DerefMut},
};
use tracing::debug;

/// Initial capacity of the archive kept in each thread's slot.
pub const POOL_ARCHIVE_CAPACITY: usize = 64 * 1024;

enum Slot {
    Uninit,
    Idle(Archive),
    Leased,
}

thread_local! {
    static SLOT: RefCell<Slot> = const { RefCell::new(Slot::Uninit) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Slot,
    Fresh,
}

/// Exclusive use of an archive until dropped. Not `Send`: a slot archive
/// must go back to the thread it came from.
#[derive(Debug)]
pub struct Lease {
    archive: Archive,
    origin: Origin,
    _not_send: PhantomData<*const ()>,
}

/// Lease an archive from the calling thread's slot, or a fresh one if the slot is busy.
pub fn acquire() -> Lease {
    let pooled = SLOT
        .try_with(|slot| {
            let mut slot = slot.borrow_mut();
            match mem::replace(&mut *slot, Slot::Leased) {
                Slot::Uninit => Some(Archive::with_capacity(POOL_ARCHIVE_CAPACITY)),
                Slot::Idle(archive) => Some(archive),
                Slot::Leased => None,
            }
        })
        .ok()
        .flatten();

    match pooled {
        Some(archive) => Lease {
            archive,
            origin: Origin::Slot,
            _not_send: PhantomData,
        },
        None => {
            debug!("pool slot busy, allocating a one-off archive");
            Lease {
                archive: Archive::new(),
                origin: Origin::Fresh,
                _not_send: PhantomData,
            }
        }
    }
}

/// Whether the calling thread's slot archive is currently leased out.
pub fn slot_in_use() -> bool {
    SLOT.with(|slot| matches!(*slot.borrow(), Slot::Leased))
}

/// Capacity of the calling thread's idle slot archive, if one exists and is not leased.
pub fn slot_capacity() -> Option<usize> {
    SLOT.with(|slot| match &*slot.borrow() {
        Slot::Idle(archive) => Some(archive.capacity()),
        _ => None,
    })
}

impl Lease {
    /// True if this lease holds the thread's slot archive.
    pub fn is_pooled(&self) -> bool {
        self.origin == Origin::Slot
    }

    /// Return the archive. Equivalent to dropping the lease.
    pub fn release(self) {}
}

impl Deref for Lease {
    type Target = Archive;

    fn deref(&self) -> &Archive {
        &self.archive
    }
}

impl DerefMut for Lease {
    fn deref_mut(&mut self) -> &mut Archive {
        &mut self.archive
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if self.origin == Origin::Fresh {
            return;
        }
        let mut archive = mem::take(&mut self.archive);
        archive.reset();
        // During thread teardown the slot may already be gone; the archive is simply freed.
        let _ = SLOT.try_with(|slot| {
            let mut slot = slot.borrow_mut();
            debug_assert!(
                matches!(*slot, Slot::Leased),
                "slot archive returned twice"
            );
            *slot = Slot::Idle(archive);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_lease_is_pooled() {
        let lease = acquire();
        assert!(lease.is_pooled());
        assert!(lease.capacity() >= POOL_ARCHIVE_CAPACITY);
        assert!(slot_in_use());
        drop(lease);
        assert!(!slot_in_use());
    }

    #[test]
    fn nested_lease_falls_back_to_fresh() {
        let mut outer = acquire();
        let mut inner = acquire();
        assert!(outer.is_pooled());
        assert!(!inner.is_pooled());

        outer.write_bytes(b"outer");
        inner.write_bytes(b"inner");
        assert_eq!(outer.raw(), b"outer");
        assert_eq!(inner.raw(), b"inner");

        drop(inner);
        // The fresh archive must not have claimed the slot.
        assert!(slot_in_use());
        drop(outer);
        assert!(!slot_in_use());
    }

    #[test]
    fn release_rewinds_without_shrinking() {
        let mut lease = acquire();
        lease.advance(3 * POOL_ARCHIVE_CAPACITY);
        let grown = lease.capacity();
        lease.release();
        assert_eq!(slot_capacity(), Some(grown));

        let lease = acquire();
        assert!(lease.is_pooled());
        assert_eq!(lease.length(), 0);
        assert_eq!(lease.capacity(), grown);
    }

    #[test]
    fn slots_are_per_thread() {
        let _held = acquire();
        let other = std::thread::spawn(|| acquire().is_pooled()).join().unwrap();
        assert!(other);
    }
}
