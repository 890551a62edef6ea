//! Issuing remote object calls: single target and broadcast.

use crate::{
    function::RemoteFunction,
    pool,
    transport::{Accounting, Sender},
    types::{Flags, ObjectId, ProcId},
    wire::{self, accounted_len},
};
use serde::Serialize;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("serializing argument: {0}")]
    Serialize(#[from] bincode::Error),
}

/// Marshals calls on distributed objects and hands the packets to a [`Sender`],
/// reporting sent bytes to an [`Accounting`] sink.
#[derive(Clone, Copy)]
pub struct ObjectCaller<'a> {
    pub(crate) rmi: &'a dyn Accounting,
    pub(crate) sender: &'a dyn Sender,
}

impl<'a> ObjectCaller<'a> {
    pub fn new(rmi: &'a dyn Accounting, sender: &'a dyn Sender) -> Self {
        Self { rmi, sender }
    }

    /// Call `function` on object `objid` at `target`.
    ///
    /// The packet is built in the calling thread's pooled archive and copied
    /// into an exactly sized buffer for the transport. If an argument fails
    /// to serialize nothing is sent.
    pub fn call<T, Args, F>(
        &self,
        target: ProcId,
        flags: Flags,
        objid: ObjectId,
        function: F,
        args: Args,
    ) -> Result<(), EncodeError>
    where
        T: 'static,
        F: RemoteFunction<T, Args>,
        Args: Serialize + 'static,
    {
        let mut arc = pool::acquire();
        wire::write_call_header::<T, Args, F>(&mut arc, objid, &function);
        arc.write(&args)?;
        wire::finish_packet(&mut arc);

        let len = arc.length();
        self.sender.send_data(target, flags, arc.to_transmit_buffer());
        arc.release();
        self.account(target, flags, len);
        Ok(())
    }

    /// Call `function` on object `objid` at every peer in `targets`, in order.
    ///
    /// The packet is encoded once; each target gets its own copy. Duplicate
    /// targets receive duplicate packets.
    pub fn broadcast<T, Args, F, I>(
        &self,
        targets: I,
        flags: Flags,
        objid: ObjectId,
        function: F,
        args: Args,
    ) -> Result<(), EncodeError>
    where
        T: 'static,
        F: RemoteFunction<T, Args>,
        Args: Serialize + 'static,
        I: IntoIterator<Item = ProcId>,
    {
        let mut arc = pool::acquire();
        wire::write_call_header::<T, Args, F>(&mut arc, objid, &function);
        arc.write(&args)?;
        wire::finish_packet(&mut arc);

        let len = arc.length();
        for target in targets {
            self.sender.send_data(target, flags, arc.to_transmit_buffer());
            self.account(target, flags, len);
        }
        Ok(())
    }

    pub(crate) fn account(&self, target: ProcId, flags: Flags, packet_len: usize) {
        trace!(peer = target, %flags, packet_len, "packet sent");
        if !flags.is_control() {
            self.rmi.inc_bytes_sent(target, accounted_len(packet_len));
        }
    }
}
