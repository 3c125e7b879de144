// Gmetric - A Ganglia gmetric client for Rust!
//
// Copyright 2026 The gmetric developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs, UdpSocket};

use crate::sinks::core::{MetricSink, SinkStats, SocketStats};
use crate::types::{ErrorKind, MetricError, MetricResult};

// gmond's default multicast TTL, packets stay on the local network
const DEFAULT_MULTICAST_TTL: u32 = 1;

/// Attempt to convert anything implementing the `ToSocketAddrs` trait
/// into a concrete `SocketAddr` instance, returning an `InvalidInput`
/// error if the address could not be parsed.
#[allow(clippy::needless_pass_by_value)]
fn get_addr<A: ToSocketAddrs>(addr: A) -> MetricResult<SocketAddr> {
    match addr.to_socket_addrs()?.next() {
        Some(addr) => Ok(addr),
        None => Err(MetricError::from((
            ErrorKind::InvalidInput,
            "No socket addresses yielded",
        ))),
    }
}

/// Implementation of a `MetricSink` that emits packets over UDP.
///
/// This is the `MetricSink` almost all users of this library will want.
/// It accepts a UDP socket instance over which to write packets and the
/// address of the gmond daemon (or multicast group) to send them to.
///
/// Each packet is sent as its own datagram when the `.emit()` method is
/// called, in the thread of the caller.
#[derive(Debug)]
pub struct UdpMetricSink {
    addr: SocketAddr,
    socket: UdpSocket,
    stats: SocketStats,
}

impl UdpMetricSink {
    /// Construct a new `UdpMetricSink` instance.
    ///
    /// The address should be the address of the gmond daemon to emit
    /// packets to over UDP. The socket should already be bound to a local
    /// address with any desired configuration applied (blocking vs
    /// non-blocking, timeouts, etc.).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::net::UdpSocket;
    /// use gmetric::{UdpMetricSink, DEFAULT_PORT};
    ///
    /// let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    /// socket.set_nonblocking(true).unwrap();
    /// let host = ("gmond.example.com", DEFAULT_PORT);
    /// let sink = UdpMetricSink::from(host, socket);
    /// ```
    ///
    /// # Failures
    ///
    /// This method may fail if:
    ///
    /// * It is unable to resolve the hostname of the daemon.
    /// * The host address is otherwise unable to be parsed
    pub fn from<A>(to_addr: A, socket: UdpSocket) -> MetricResult<UdpMetricSink>
    where
        A: ToSocketAddrs,
    {
        let addr = get_addr(to_addr)?;
        let stats = SocketStats::default();
        Ok(UdpMetricSink { addr, socket, stats })
    }

    /// Construct a new `UdpMetricSink` sending to an IPv4 multicast group,
    /// the way gmond clusters are usually configured.
    ///
    /// A non-blocking socket is bound to an ephemeral local port, multicast
    /// loopback is enabled so that a gmond on the same host sees the packets,
    /// and the TTL is set to `1`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::net::Ipv4Addr;
    /// use gmetric::{UdpMetricSink, DEFAULT_PORT};
    ///
    /// let sink = UdpMetricSink::multicast(Ipv4Addr::new(239, 2, 11, 71), DEFAULT_PORT).unwrap();
    /// ```
    ///
    /// # Failures
    ///
    /// This method may fail if the address is not a multicast address or the
    /// socket cannot be created or configured.
    pub fn multicast(group: Ipv4Addr, port: u16) -> MetricResult<UdpMetricSink> {
        if !group.is_multicast() {
            return Err(MetricError::from((
                ErrorKind::InvalidInput,
                "address is not a multicast group",
                group.to_string(),
            )));
        }

        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.set_nonblocking(true)?;
        socket.set_multicast_loop_v4(true)?;
        socket.set_multicast_ttl_v4(DEFAULT_MULTICAST_TTL)?;

        Self::from(SocketAddrV4::new(group, port), socket)
    }

    /// Address packets are sent to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl MetricSink for UdpMetricSink {
    fn emit(&self, packet: &[u8]) -> io::Result<usize> {
        self.stats.update(self.socket.send_to(packet, self.addr), packet.len())
    }

    fn stats(&self) -> SinkStats {
        (&self.stats).into()
    }
}
