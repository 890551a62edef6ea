use super::{Message, NetConfig, NetError};
use crate::{dispatcher::Dispatcher, rmi::Rmi};
use async_bincode::tokio::AsyncBincodeReader;
use futures::StreamExt;
use std::{io, net::SocketAddr, sync::Arc};
use tokio::{
    net::{TcpListener, TcpStream},
    task,
};
use tracing::{debug, warn};

/// Bind the listen address `config` assigns to this process.
pub async fn bind(config: &NetConfig) -> Result<TcpListener, NetError> {
    Ok(TcpListener::bind(config.listen_addr()?).await?)
}

/// Accept peer connections forever, running every received packet through `dispatcher`.
pub async fn serve_tcp(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    rmi: Arc<Rmi>,
) -> io::Result<()> {
    loop {
        let (sock, addr) = listener.accept().await?;
        let dispatcher = dispatcher.clone();
        let rmi = rmi.clone();
        task::spawn(async move {
            if let Err(e) = handle_connection(sock, &dispatcher, &rmi).await {
                warn!(%addr, error = %e, "connection failed");
            }
        });
    }
}

async fn handle_connection(
    sock: TcpStream,
    dispatcher: &Dispatcher,
    rmi: &Rmi,
) -> Result<(), NetError> {
    sock.set_nodelay(true)?;
    let peer: SocketAddr = sock.peer_addr()?;
    let mut stream = AsyncBincodeReader::<_, Message>::from(sock);

    let source = match stream.next().await {
        Some(Ok(Message::Hello { source })) => source,
        Some(Err(e)) => return Err(e.into()),
        _ => return Err(NetError::Handshake),
    };
    debug!(source, %peer, "peer connected");

    while let Some(message) = stream.next().await {
        match message? {
            Message::Packet(packet) => {
                if let Err(e) = dispatcher.dispatch(source, rmi, &packet) {
                    warn!(source, error = %e, "dropping packet");
                }
            }
            Message::Hello { .. } => warn!(source, "ignoring repeated hello"),
        }
    }
    debug!(source, "peer disconnected");
    Ok(())
}
