// Gmetric - A Ganglia gmetric client for Rust!
//
// Copyright 2026 The gmetric developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::sinks::core::{MetricSink, SinkStats, SocketStats};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use std::io::{self, ErrorKind};

/// `MetricSink` implementation that writes all packets to the `Sender` half
/// of a channel while callers are given ownership of the `Receiver` half.
///
/// This is not a general purpose sink, rather it's a sink meant for verifying
/// packets written during the course of integration tests. By default, the
/// channel used is unbounded. The channel size can be limited using the
/// `with_capacity` method, after which writes to a full channel fail the way
/// a congested network would.
#[derive(Debug)]
pub struct SpyMetricSink {
    sender: Sender<Vec<u8>>,
    stats: SocketStats,
}

impl SpyMetricSink {
    pub fn new() -> (Receiver<Vec<u8>>, Self) {
        Self::with_queue_capacity(None)
    }

    pub fn with_capacity(queue: usize) -> (Receiver<Vec<u8>>, Self) {
        Self::with_queue_capacity(Some(queue))
    }

    fn with_queue_capacity(queue: Option<usize>) -> (Receiver<Vec<u8>>, Self) {
        let (tx, rx) = match queue {
            Some(sz) => bounded(sz),
            None => unbounded(),
        };

        let sink = SpyMetricSink {
            sender: tx,
            stats: SocketStats::default(),
        };
        (rx, sink)
    }
}

impl MetricSink for SpyMetricSink {
    fn emit(&self, packet: &[u8]) -> io::Result<usize> {
        let res = match self.sender.try_send(packet.to_vec()) {
            Err(TrySendError::Disconnected(_)) => Err(io::Error::new(ErrorKind::Other, "channel disconnected")),
            Err(TrySendError::Full(_)) => Err(io::Error::new(ErrorKind::Other, "channel full")),
            Ok(_) => Ok(packet.len()),
        };

        self.stats.update(res, packet.len())
    }

    fn stats(&self) -> SinkStats {
        (&self.stats).into()
    }
}

#[cfg(test)]
mod test {
    use super::{MetricSink, SpyMetricSink};

    #[test]
    fn test_spy_metric_sink() {
        let (rx, sink) = SpyMetricSink::new();
        sink.emit(&[0, 0, 0, 133]).unwrap();

        let sent = rx.recv().unwrap();
        assert_eq!(&[0, 0, 0, 133], sent.as_slice());
    }

    #[test]
    fn test_spy_metric_sink_full() {
        let (_rx, sink) = SpyMetricSink::with_capacity(1);
        assert!(sink.emit(&[1]).is_ok());
        assert!(sink.emit(&[2]).is_err());

        let stats = sink.stats();
        assert_eq!(1, stats.packets_sent);
        assert_eq!(1, stats.packets_dropped);
    }

    #[test]
    fn test_spy_metric_sink_disconnected() {
        let (rx, sink) = SpyMetricSink::new();
        drop(rx);
        assert!(sink.emit(&[1]).is_err());
    }
}
