use super::{Message, NetConfig, NetError};
use crate::{
    transport::Sender,
    types::{Flags, ProcId},
    wire::PacketHeader,
};
use async_bincode::{tokio::AsyncBincodeWriter, AsyncDestination};
use futures::SinkExt;
use tokio::{net::TcpStream, sync::mpsc, task};
use tracing::{debug, warn};

type PacketSink = AsyncBincodeWriter<TcpStream, Message, AsyncDestination>;

/// Outbound side of the TCP transport.
///
/// Each peer has a writer task fed by an unbounded queue, so `send_data`
/// never blocks and packets to one peer leave in the order they were queued.
pub struct TcpSender {
    procid: ProcId,
    queues: Vec<mpsc::UnboundedSender<Box<[u8]>>>,
}

impl TcpSender {
    /// Connect to every peer in `config` (ourselves included) and introduce
    /// ourselves. Must be called from within a tokio runtime.
    pub async fn connect(config: &NetConfig) -> Result<Self, NetError> {
        let mut queues = Vec::with_capacity(config.num_procs());
        for (peer, addr) in config.peers.iter().enumerate() {
            let sock = TcpStream::connect(addr).await?;
            sock.set_nodelay(true)?;
            let mut sink: PacketSink = AsyncBincodeWriter::from(sock).for_async();
            sink.send(Message::Hello {
                source: config.procid,
            })
            .await?;
            debug!(peer, %addr, "connected");

            let (tx, rx) = mpsc::unbounded_channel();
            task::spawn(write_packets(peer, sink, rx));
            queues.push(tx);
        }
        Ok(Self {
            procid: config.procid,
            queues,
        })
    }

    pub fn procid(&self) -> ProcId {
        self.procid
    }
}

async fn write_packets(
    peer: usize,
    mut sink: PacketSink,
    mut rx: mpsc::UnboundedReceiver<Box<[u8]>>,
) {
    while let Some(packet) = rx.recv().await {
        if let Err(e) = sink.send(Message::Packet(packet.into_vec())).await {
            warn!(peer, error = %e, "dropping connection");
            return;
        }
    }
    debug!(peer, "sender closed");
}

impl Sender for TcpSender {
    fn send_data(&self, target: ProcId, flags: Flags, mut buffer: Box<[u8]>) {
        PacketHeader {
            src: self.procid,
            flags,
        }
        .stamp(&mut buffer);

        match self.queues.get(usize::from(target)) {
            Some(queue) => {
                if queue.send(buffer).is_err() {
                    warn!(peer = target, "connection closed, packet dropped");
                }
            }
            None => warn!(peer = target, "no connection to peer, packet dropped"),
        }
    }
}
