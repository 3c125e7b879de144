use gmetric::protocol::{encode_metadata, encode_value};
use gmetric::{GmetricClient, MetricIdentity, Monitor, Slope, UdpMetricSink, ValueType};
use std::net::UdpSocket;
use std::time::Duration;

mod utils;
use utils::{decode_value, new_identity, run_arc_threaded_test};

fn new_server() -> UdpSocket {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    server.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    server
}

fn new_udp_sink(server: &UdpSocket) -> UdpMetricSink {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    UdpMetricSink::from(server.local_addr().unwrap(), socket).unwrap()
}

fn recv_packet(server: &UdpSocket) -> Vec<u8> {
    let mut buf = [0u8; 1500];
    let (len, _) = server.recv_from(&mut buf).unwrap();
    buf[..len].to_vec()
}

#[test]
fn test_gmetric_client_udp_sink_announce() {
    let server = new_server();
    let client = GmetricClient::from_sink(new_udp_sink(&server));
    let id = MetricIdentity::new("web01", "cpu_temp", ValueType::Float, "C", Slope::Both)
        .unwrap()
        .with_tmax(60);

    client.announce(&id, 41.5f32).unwrap();

    assert_eq!(encode_metadata(&id), recv_packet(&server));
    assert_eq!(encode_value(&id, "41.5"), recv_packet(&server));
    assert_eq!(2, client.stats().packets_sent);
}

#[test]
fn test_monitor_udp_sink_register_and_tick() {
    let server = new_server();
    let monitor = Monitor::builder(new_udp_sink(&server))
        .initial_delay(Duration::from_secs(3600))
        .build()
        .unwrap();

    let id = new_identity("requests", ValueType::Int32);
    let requests = monitor.register(id.clone(), false);

    assert_eq!(encode_metadata(&id), recv_packet(&server));
    assert_eq!(encode_value(&id, "0"), recv_packet(&server));

    run_arc_threaded_test(requests.clone(), 4, 25);
    monitor.registry().tick();

    let (name, value) = decode_value(&recv_packet(&server));
    assert_eq!("requests", name);
    assert_eq!("100", value);
    assert_eq!("0", requests.value_string());
}
