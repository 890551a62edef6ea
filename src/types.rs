//! Peer and object ids, and the per-packet flags byte.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a peer process in the runtime.
pub type ProcId = u16;

/// Identifies a distributed object instance. Every peer agrees on the id of a given object.
pub type ObjectId = u64;

/// Width of the little-endian length word used for the total packet length,
/// the dispatch identity, the object id and blob sizes.
pub const SIZE_WORD: usize = std::mem::size_of::<u64>();

/// Per-packet flags byte handed to the transport.
///
/// Bit 0 marks a control packet, which is never counted towards traffic
/// statistics. The remaining bits belong to the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flags(pub u8);

impl Flags {
    pub const CONTROL_PACKET: Flags = Flags(1);

    pub const fn empty() -> Self {
        Flags(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_control(self) -> bool {
        self.contains(Self::CONTROL_PACKET)
    }
}

impl std::ops::BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl From<u8> for Flags {
    fn from(bits: u8) -> Self {
        Flags(bits)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}
