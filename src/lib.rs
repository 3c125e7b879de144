// Gmetric - A Ganglia gmetric client for Rust!
//
// Copyright 2026 The gmetric developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A Ganglia gmetric client for Rust!
//!
//! Gmetric announces application metrics to a Ganglia `gmond` daemon using
//! gmond's XDR encoded UDP protocol.
//!
//! ## Features
//!
//! * Metrics of type `string`, `int32`, `float` and `double` that can be
//!   updated from any thread.
//! * Periodic announcement of registered metrics from a background thread,
//!   with metadata re-announced every few ticks.
//! * One-off announcements through `GmetricClient`, for scripts and the
//!   `gmetric` command line tool.
//! * Support for alternate backends via the `MetricSink` trait.
//!
//! ## Install
//!
//! ```toml
//! [dependencies]
//! gmetric = "x.y.z"
//! ```
//!
//! ## Usage
//!
//! ### Periodic Announcements
//!
//! A `Monitor` announces every metric registered with it once per period.
//! Non-additive metrics are reset to zero after each announcement so they
//! report what happened during the last period, additive metrics keep
//! their value.
//!
//! ```rust,no_run
//! use std::net::Ipv4Addr;
//! use gmetric::{Monitor, MetricIdentity, Slope, UdpMetricSink, ValueType, DEFAULT_PORT};
//!
//! // Send to gmond's default multicast group
//! let sink = UdpMetricSink::multicast(Ipv4Addr::new(239, 2, 11, 71), DEFAULT_PORT).unwrap();
//! let monitor = Monitor::from_sink(sink).unwrap();
//!
//! let id = MetricIdentity::new("web01", "requests", ValueType::Int32, "requests", Slope::Both).unwrap();
//! let requests = monitor.register(id, false);
//!
//! // From any thread handling a request
//! requests.incr().unwrap();
//! ```
//!
//! ### One-off Announcements
//!
//! ```rust,no_run
//! use std::net::UdpSocket;
//! use gmetric::{GmetricClient, MetricIdentity, Slope, UdpMetricSink, ValueType, DEFAULT_PORT};
//!
//! let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
//! let sink = UdpMetricSink::from(("gmond.example.com", DEFAULT_PORT), socket).unwrap();
//! let client = GmetricClient::from_sink(sink);
//!
//! let id = MetricIdentity::new("web01", "disk_free", ValueType::Double, "GB", Slope::Both)
//!     .unwrap()
//!     .with_tmax(60);
//! client.announce(&id, 118.5).unwrap();
//! ```
//!
//! ### Custom Error Handling
//!
//! Sends made by the background thread can't return errors to anyone. By
//! default they are logged with the `log` crate at `warn` level, a custom
//! handler can be used instead.
//!
//! ```rust
//! use gmetric::{Monitor, MetricError, NopMetricSink};
//!
//! fn my_error_handler(err: MetricError) {
//!     eprintln!("Error sending metrics: {}", err);
//! }
//!
//! let monitor = Monitor::builder(NopMetricSink)
//!     .with_error_handler(my_error_handler)
//!     .build()
//!     .unwrap();
//! ```

#![forbid(unsafe_code)]

pub const DEFAULT_PORT: u16 = 8649;

pub use self::client::{GmetricClient, GmetricClientBuilder};

pub use self::metric::{Metric, MetricIdentity, MetricIdentityBuilder, MetricValue, ToMetricValue};

pub use self::monitor::{
    Monitor, MonitorBuilder, Registry, DEFAULT_INITIAL_DELAY, DEFAULT_INIT_PERIOD, DEFAULT_PERIOD,
};

pub use self::sinks::{MetricSink, NopMetricSink, SinkStats, SpyMetricSink, UdpMetricSink};

pub use self::types::{ErrorKind, MetricError, MetricResult, Slope, ValueType};

mod client;
mod metric;
mod monitor;
pub mod prelude;
pub mod protocol;
mod sinks;
mod sync;
mod types;
