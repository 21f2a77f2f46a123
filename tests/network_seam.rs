//! Network collaborator seam: outbound tap routing, listener
//! announcements, and inbound delivery with source companions.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use turbine::net::{NetworkListen, NetworkSource, NetworkTap, Wire};
use turbine::{Args, Config, Payload, Plant, TypeKey};

#[derive(Debug)]
struct Chat(String);
struct Local;

/// Tap that records everything sent outbound.
struct CaptureTap {
    sent: Mutex<Vec<(Wire, TypeKey)>>,
}

impl CaptureTap {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
        })
    }
}

impl NetworkTap for CaptureTap {
    fn outbound(&self, wire: Wire, key: TypeKey, _payload: Payload) {
        self.sent.lock().push((wire, key));
    }
}

fn peer() -> NetworkSource {
    let address: SocketAddr = "10.0.0.7:7447".parse().unwrap();
    NetworkSource::new("peer-7", address)
}

fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn network_emits_go_to_the_tap_and_skip_local_reactions() {
    let mut cfg = Config::default();
    cfg.workers = 2;
    let plant = Plant::new(cfg);
    let tap = CaptureTap::new();
    plant.set_network_tap(tap.clone());

    let fired = Arc::new(Mutex::new(0u32));
    let ctx = plant.installer("local-listener");
    let count = Arc::clone(&fired);
    ctx.on::<Local>()
        .bind(move |_: &Args| {
            *count.lock() += 1;
        })
        .unwrap();

    plant.start();
    plant.emit_net(Local);
    plant.emit_udp(Local);
    plant.emit_tcp(Local);

    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(*fired.lock(), 0, "network scope must not fire local reactions");
    let key = TypeKey::of::<Local>();
    assert_eq!(
        &*tap.sent.lock(),
        &[(Wire::Any, key), (Wire::Udp, key), (Wire::Tcp, key)]
    );

    // network-scope payloads never land in the local store either
    assert!(plant.latest::<Local>().is_none());
}

#[test]
fn binding_a_listener_announces_itself_directly() {
    let plant = Plant::new(Config::default());

    let announced: Arc<Mutex<Vec<TypeKey>>> = Arc::new(Mutex::new(Vec::new()));
    let ctx = plant.installer("transport");
    let seen = Arc::clone(&announced);
    ctx.on::<NetworkListen>()
        .bind(move |args: &Args| {
            seen.lock().push(args.get::<NetworkListen>().unwrap().key);
        })
        .unwrap();

    let app = plant.installer("app");
    app.on_network::<Chat>().bind(|_: &Args| {}).unwrap();

    // the announcement is a direct emit: visible before start()
    let got = announced.lock();
    assert_eq!(got.len(), 1);
    assert!(got[0].name().contains("Chat"));
}

#[test]
fn delivery_fires_the_listener_with_its_source() {
    let mut cfg = Config::default();
    cfg.workers = 2;
    let plant = Plant::new(cfg);

    let got: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let ctx = plant.installer("chat");
    let seen = Arc::clone(&got);
    ctx.on_network::<Chat>()
        .bind(move |args: &Args| {
            let data = args.get::<turbine::net::NetworkData<Chat>>().unwrap();
            let source = args.get::<NetworkSource>().unwrap();
            seen.lock().push((data.0.clone(), source.name.clone()));
        })
        .unwrap();

    plant.start();
    plant.deliver_net(Chat("hello".to_string()), peer());

    wait_until("delivery to fire", || !got.lock().is_empty());
    let records = got.lock();
    assert_eq!(records[0], ("hello".to_string(), "peer-7".to_string()));
}
