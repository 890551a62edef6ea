mod common;

use common::init_tracing;
use dcrpc::{
    net::server, Dispatcher, Flags, NetConfig, NetError, ObjectCaller, Rmi, TcpSender,
};
use std::{io::Write, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::mpsc, time::timeout};

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Seen {
    Note { proc: usize, text: String, n: u32 },
    Blob { proc: usize, len: usize },
}

struct Collector {
    proc: usize,
    tx: mpsc::UnboundedSender<Seen>,
}

impl Collector {
    fn note(&self, text: String, n: u32) {
        let _ = self.tx.send(Seen::Note {
            proc: self.proc,
            text,
            n,
        });
    }

    fn blob(&self, bytes: Vec<u8>) {
        let _ = self.tx.send(Seen::Blob {
            proc: self.proc,
            len: bytes.len(),
        });
    }
}

async fn start_procs(n: usize, tx: mpsc::UnboundedSender<Seen>) -> Vec<SocketAddr> {
    let mut peers = Vec::new();
    for proc in 0..n {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        peers.push(listener.local_addr().unwrap());

        let rmi = Arc::new(Rmi::new(n));
        rmi.insert(Arc::new(Collector {
            proc,
            tx: tx.clone(),
        }));
        let mut dispatcher = Dispatcher::new();
        dispatcher.add(Collector::note).unwrap();
        dispatcher.add(Collector::blob).unwrap();
        tokio::spawn(server::serve_tcp(listener, Arc::new(dispatcher), rmi));
    }
    peers
}

#[tokio::test]
async fn calls_travel_over_tcp() {
    init_tracing();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let peers = start_procs(2, tx).await;

    let sender = TcpSender::connect(&NetConfig::new(0, peers)).await.unwrap();
    let stats = Rmi::new(2);
    let caller = ObjectCaller::new(&stats, &sender);

    caller
        .broadcast([0, 1], Flags::empty(), 0, Collector::note, ("hi".to_string(), 1u32))
        .unwrap();
    caller
        .call(1, Flags::empty(), 0, Collector::note, ("again".to_string(), 2u32))
        .unwrap();
    let mut split = caller.split_call_begin(0, Collector::blob);
    split.write_all(&[7; 300]).unwrap();
    caller.split_call_end(split, 0, Flags::CONTROL_PACKET);

    let mut seen = Vec::new();
    for _ in 0..4 {
        let item = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for a call")
            .unwrap();
        seen.push(item);
    }

    // Calls to one peer arrive in the order they were issued.
    let to_proc_1: Vec<_> = seen
        .iter()
        .filter(|s| matches!(s, Seen::Note { proc: 1, .. }))
        .collect();
    assert_eq!(
        to_proc_1,
        vec![
            &Seen::Note {
                proc: 1,
                text: "hi".into(),
                n: 1
            },
            &Seen::Note {
                proc: 1,
                text: "again".into(),
                n: 2
            },
        ]
    );

    seen.sort();
    assert_eq!(
        seen,
        vec![
            Seen::Note {
                proc: 0,
                text: "hi".into(),
                n: 1
            },
            Seen::Note {
                proc: 1,
                text: "again".into(),
                n: 2
            },
            Seen::Note {
                proc: 1,
                text: "hi".into(),
                n: 1
            },
            Seen::Blob { proc: 0, len: 300 },
        ]
    );

    // The blob went out as a control packet, so proc 0 only saw the broadcast.
    assert!(stats.bytes_sent(0) > 0);
    assert!(stats.bytes_sent(1) > stats.bytes_sent(0));
}

#[tokio::test]
async fn missing_listen_address() {
    let config = NetConfig::new(3, vec!["127.0.0.1:1".parse().unwrap()]);
    assert!(matches!(
        server::bind(&config).await,
        Err(NetError::UnknownPeer(3))
    ));
    assert!(matches!(
        NetConfig::default().listen_addr(),
        Err(NetError::UnknownPeer(0))
    ));
}
