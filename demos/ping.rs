use dcrpc::{net::server, Dispatcher, Flags, NetConfig, ObjectCaller, Rmi, TcpSender};
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, task};

pub struct Greeter {
    procid: usize,
}

impl Greeter {
    fn hello(&self, name: String, times: u32) {
        for _ in 0..times {
            println!("[proc {}] Hello, {name}!", self.procid);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut peers = Vec::new();
    for procid in 0..2 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        peers.push(listener.local_addr().unwrap());

        let rmi = Arc::new(Rmi::new(2));
        rmi.insert(Arc::new(Greeter { procid }));
        let mut dispatcher = Dispatcher::new();
        dispatcher.add(Greeter::hello).unwrap();
        task::spawn(server::serve_tcp(listener, Arc::new(dispatcher), rmi));
    }

    let sender = TcpSender::connect(&NetConfig::new(0, peers)).await.unwrap();
    let stats = Rmi::new(2);
    let caller = ObjectCaller::new(&stats, &sender);
    caller
        .broadcast([0, 1], Flags::empty(), 0, Greeter::hello, ("world".to_string(), 2u32))
        .unwrap();

    tokio::time::sleep(Duration::from_secs_f32(0.1)).await;
    println!(
        "bytes sent: proc 0 = {}, proc 1 = {}",
        stats.bytes_sent(0),
        stats.bytes_sent(1)
    );
}
