//! Calls whose single blob argument is written after the header, by the caller,
//! and whose size is patched in when the call is finished.
//!
//! The receiving function takes one `Vec<u8>`: its bincode form is exactly the
//! `[len: u64][bytes]` that a split call puts on the wire.

use crate::{
    archive::Archive,
    calling::{EncodeError, ObjectCaller},
    function::RemoteFunction,
    types::{Flags, ObjectId, ProcId, SIZE_WORD},
    wire,
};
use serde::Serialize;
use std::{io, mem, thread};
use tracing::warn;

/// An open split call. Consumed by [`ObjectCaller::split_call_end`] or
/// [`SplitCall::cancel`]; dropping it unfinished discards the packet.
#[derive(Debug)]
pub struct SplitCall {
    archive: Archive,
    header_len: usize,
    open: bool,
}

impl SplitCall {
    /// Write the call header for `function` on `objid` and leave a
    /// placeholder for the blob size.
    ///
    /// The archive is always freshly allocated, never taken from the thread's
    /// pool, since it stays open across arbitrary caller work.
    pub fn begin<T, F>(objid: ObjectId, function: F) -> Self
    where
        T: 'static,
        F: RemoteFunction<T, (Vec<u8>,)>,
    {
        let mut archive = Archive::new();
        wire::write_call_header::<T, (Vec<u8>,), F>(&mut archive, objid, &function);
        archive.write_size_word(0);
        Self {
            header_len: archive.length(),
            archive,
            open: true,
        }
    }

    /// Append the bincode encoding of `value` to the blob.
    ///
    /// The blob region is append-only; raw bytes go through [`io::Write`].
    pub fn write_value<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<(), EncodeError> {
        self.archive.write(value)?;
        Ok(())
    }

    /// Bytes written into the blob region so far.
    pub fn blob_len(&self) -> usize {
        self.archive.length() - self.header_len
    }

    /// Abandon the call without sending anything.
    pub fn cancel(mut self) {
        self.open = false;
    }

    /// Patch the blob size and the total length; returns the finished packet.
    fn finish(mut self) -> Box<[u8]> {
        let blob_len = self.blob_len() as u64;
        let mut archive = mem::take(&mut self.archive);
        self.open = false;
        archive.patch_size_word(self.header_len - SIZE_WORD, blob_len);
        wire::finish_packet(&mut archive);
        archive.into_transmit_buffer()
    }
}

impl io::Write for SplitCall {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.archive.write_bytes(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SplitCall {
    fn drop(&mut self) {
        if self.open && !thread::panicking() {
            warn!(
                blob_len = self.blob_len(),
                "split call dropped without end or cancel"
            );
        }
    }
}

impl ObjectCaller<'_> {
    /// Start a split call. Equivalent to [`SplitCall::begin`].
    pub fn split_call_begin<T, F>(&self, objid: ObjectId, function: F) -> SplitCall
    where
        T: 'static,
        F: RemoteFunction<T, (Vec<u8>,)>,
    {
        SplitCall::begin(objid, function)
    }

    /// Finish `call` and send it to `target`, accounting it like any other call.
    pub fn split_call_end(&self, call: SplitCall, target: ProcId, flags: Flags) {
        let packet = call.finish();
        let len = packet.len();
        self.sender.send_data(target, flags, packet);
        self.account(target, flags, len);
    }
}
