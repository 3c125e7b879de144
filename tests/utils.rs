// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

use gmetric::prelude::*;
use gmetric::{Metric, MetricIdentity, Slope, SpyMetricSink, ValueType};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

pub const METADATA_KIND: u32 = 128;
pub const VALUE_KIND: u32 = 133;

pub fn new_identity(name: &str, value_type: ValueType) -> MetricIdentity {
    MetricIdentity::new("localhost", name, value_type, "", Slope::Both).unwrap()
}

pub fn run_arc_threaded_test(metric: Arc<Metric>, num_threads: u64, iterations: u64) {
    let threads: Vec<_> = (0..num_threads)
        .map(|_| {
            let local_metric = Arc::clone(&metric);

            thread::spawn(move || {
                for _ in 0..iterations {
                    local_metric.incr().unwrap();
                }
            })
        })
        .collect();

    for t in threads {
        t.join().unwrap();
    }
}

/// Minimal reader for the fields of a packet.
pub struct PacketReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        PacketReader { buf, pos: 0 }
    }

    pub fn read_uint(&mut self) -> u32 {
        let bytes: [u8; 4] = self.buf[self.pos..self.pos + 4].try_into().unwrap();
        self.pos += 4;
        u32::from_be_bytes(bytes)
    }

    pub fn read_string(&mut self) -> String {
        let len = self.read_uint() as usize;
        let s = String::from_utf8(self.buf[self.pos..self.pos + len].to_vec()).unwrap();
        self.pos += len + (4 - len % 4) % 4;
        s
    }

    pub fn is_done(&self) -> bool {
        self.pos == self.buf.len()
    }
}

/// Kind of message in the packet, the first field.
pub fn message_kind(packet: &[u8]) -> u32 {
    PacketReader::new(packet).read_uint()
}

/// Name and value carried by a value packet.
pub fn decode_value(packet: &[u8]) -> (String, String) {
    let mut reader = PacketReader::new(packet);
    assert_eq!(VALUE_KIND, reader.read_uint());
    let _host = reader.read_string();
    let name = reader.read_string();
    assert_eq!(0, reader.read_uint());
    assert_eq!("%s", reader.read_string());
    let value = reader.read_string();
    assert!(reader.is_done());
    (name, value)
}

/// Sink that fails every packet after the first `healthy` ones, passing
/// successful packets on to a spy.
pub struct FailingSink {
    healthy: usize,
    attempts: AtomicUsize,
    spy: SpyMetricSink,
}

impl FailingSink {
    pub fn new(healthy: usize) -> (crossbeam_channel::Receiver<Vec<u8>>, Self) {
        let (rx, spy) = SpyMetricSink::new();
        let sink = FailingSink {
            healthy,
            attempts: AtomicUsize::new(0),
            spy,
        };
        (rx, sink)
    }
}

impl MetricSink for FailingSink {
    fn emit(&self, packet: &[u8]) -> io::Result<usize> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) < self.healthy {
            self.spy.emit(packet)
        } else {
            Err(io::Error::new(io::ErrorKind::Other, "network unreachable"))
        }
    }
}
