//! Packet layout shared by every encoder and by the receive side.
//!
//! ```text
//! [total_length: u64]        bytes that follow this word
//! [transport header: 8]      [src: u16][flags: u8][reserved: 5], stamped by the transport
//! [dispatch identity: u64]
//! [function value: size_of::<F>()]
//! [object id: u64]
//! [arguments...]             bincode, in argument order
//! ```
//!
//! All words are little-endian.

use crate::{
    archive::Archive,
    function::{function_bytes, function_width, DispatchId, RemoteFunction},
    types::{Flags, ObjectId, ProcId, SIZE_WORD},
};

/// Width of the transport header that follows the length word.
pub const PACKET_HEADER_LEN: usize = 8;

/// Length word plus transport header.
pub const PREAMBLE_LEN: usize = SIZE_WORD + PACKET_HEADER_LEN;

/// Bytes in front of the first argument for a call through `F`.
pub const fn call_header_len<F>() -> usize {
    PREAMBLE_LEN + SIZE_WORD + function_width::<F>() + SIZE_WORD
}

/// Bytes reported to traffic accounting for a packet of `packet_len` bytes.
/// The length word is framing, not payload.
pub const fn accounted_len(packet_len: usize) -> usize {
    packet_len - SIZE_WORD
}

/// The transport-owned part of the packet. Encoders leave it zeroed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketHeader {
    pub src: ProcId,
    pub flags: Flags,
}

impl PacketHeader {
    /// Write this header into a finished packet.
    ///
    /// Panics if `packet` is shorter than [`PREAMBLE_LEN`].
    pub fn stamp(&self, packet: &mut [u8]) {
        let hdr = &mut packet[SIZE_WORD..PREAMBLE_LEN];
        hdr.fill(0);
        hdr[..2].copy_from_slice(&self.src.to_le_bytes());
        hdr[2] = self.flags.bits();
    }

    pub fn read(packet: &[u8]) -> Option<Self> {
        let hdr = packet.get(SIZE_WORD..PREAMBLE_LEN)?;
        Some(Self {
            src: ProcId::from_le_bytes([hdr[0], hdr[1]]),
            flags: Flags(hdr[2]),
        })
    }
}

/// Write everything up to (not including) the first argument.
pub(crate) fn write_call_header<T, Args, F>(arc: &mut Archive, objid: ObjectId, function: &F)
where
    T: 'static,
    Args: 'static,
    F: RemoteFunction<T, Args>,
{
    arc.advance(PREAMBLE_LEN);
    arc.write_size_word(DispatchId::of::<T, F, Args>().0);
    arc.write_bytes(function_bytes(function));
    arc.write_size_word(objid);
}

/// Fill in the total length word at the front of a finished packet.
pub(crate) fn finish_packet(arc: &mut Archive) {
    let total = accounted_len(arc.length()) as u64;
    arc.patch_size_word(0, total);
}
