//! A TCP transport: one connection per peer pair, packets framed with async-bincode.

pub mod client;
pub mod server;

use crate::types::ProcId;
use serde::{Deserialize, Serialize};
use std::{io, net::SocketAddr};
use thiserror::Error;

/// Addresses of every process in the job, indexed by [`ProcId`], and which one we are.
#[derive(Debug, Clone, Default)]
pub struct NetConfig {
    pub procid: ProcId,
    pub peers: Vec<SocketAddr>,
}

impl NetConfig {
    pub fn new(procid: ProcId, peers: Vec<SocketAddr>) -> Self {
        Self { procid, peers }
    }

    pub fn num_procs(&self) -> usize {
        self.peers.len()
    }

    /// The address this process accepts connections on.
    pub fn listen_addr(&self) -> Result<SocketAddr, NetError> {
        self.peers
            .get(usize::from(self.procid))
            .copied()
            .ok_or(NetError::UnknownPeer(self.procid))
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub(crate) enum Message {
    Hello { source: ProcId },
    Packet(Vec<u8>),
}

#[derive(Debug, Error)]
pub enum NetError {
    #[error("i/o: {0}")]
    Io(#[from] io::Error),

    #[error("framing: {0}")]
    Codec(#[from] bincode::Error),

    #[error("no address configured for proc {0}")]
    UnknownPeer(ProcId),

    #[error("connection did not start with a hello")]
    Handshake,
}
