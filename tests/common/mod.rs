#![allow(dead_code)]

use dcrpc::{Accounting, Dispatcher, Flags, ObjectCaller, ProcId, Rmi, Sender};
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// A packet as seen by the transport.
#[derive(Debug, Clone)]
pub struct Sent {
    pub target: ProcId,
    pub flags: Flags,
    pub packet: Box<[u8]>,
}

/// A transport that records every packet and, once a dispatcher is
/// installed, runs it immediately on the sending thread.
pub struct Loopback {
    pub rmi: Rmi,
    dispatcher: OnceLock<Dispatcher>,
    sent: Mutex<Vec<Sent>>,
}

impl Loopback {
    pub fn new(num_procs: usize) -> Arc<Self> {
        Arc::new(Self {
            rmi: Rmi::new(num_procs),
            dispatcher: OnceLock::new(),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Start delivering packets to `dispatcher`.
    pub fn install(&self, dispatcher: Dispatcher) {
        assert!(self.dispatcher.set(dispatcher).is_ok(), "dispatcher installed twice");
    }

    pub fn caller(&self) -> ObjectCaller<'_> {
        ObjectCaller::new(&self.rmi, self)
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }
}

impl Sender for Loopback {
    fn send_data(&self, target: ProcId, flags: Flags, buffer: Box<[u8]>) {
        self.sent.lock().push(Sent {
            target,
            flags,
            packet: buffer.clone(),
        });
        if let Some(dispatcher) = self.dispatcher.get() {
            dispatcher
                .dispatch(0, &self.rmi, &buffer)
                .expect("loopback dispatch");
        }
    }
}

/// Counts accounting calls without a registry behind them.
#[derive(Default)]
pub struct Tally {
    pub calls: Mutex<Vec<(ProcId, usize)>>,
}

impl Accounting for Tally {
    fn inc_bytes_sent(&self, target: ProcId, bytes: usize) {
        self.calls.lock().push((target, bytes));
    }
}
