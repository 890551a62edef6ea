//! The two collaborators every encoder talks to.

use crate::types::{Flags, ProcId};
use std::sync::Arc;

/// Delivers finished packets to peers.
///
/// `send_data` takes ownership of `buffer`; the buffer's length is the packet
/// length. Delivery failures are the transport's concern and are not reported
/// back to the caller.
pub trait Sender: Send + Sync {
    fn send_data(&self, target: ProcId, flags: Flags, buffer: Box<[u8]>);
}

/// Per-peer traffic statistics. Must tolerate concurrent increments.
pub trait Accounting: Send + Sync {
    fn inc_bytes_sent(&self, target: ProcId, bytes: usize);
}

impl<S: Sender + ?Sized> Sender for Arc<S> {
    fn send_data(&self, target: ProcId, flags: Flags, buffer: Box<[u8]>) {
        (**self).send_data(target, flags, buffer)
    }
}

impl<A: Accounting + ?Sized> Accounting for Arc<A> {
    fn inc_bytes_sent(&self, target: ProcId, bytes: usize) {
        (**self).inc_bytes_sent(target, bytes)
    }
}
