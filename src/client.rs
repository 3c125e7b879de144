// Gmetric - A Ganglia gmetric client for Rust!
//
// Copyright 2026 The gmetric developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;
use std::panic::RefUnwindSafe;

use log::warn;

use crate::metric::{MetricIdentity, ToMetricValue};
use crate::protocol;
use crate::sinks::{MetricSink, SinkStats};
use crate::types::{ErrorKind, MetricError, MetricResult};

/// Builder for creating and customizing `GmetricClient` instances.
///
/// Instances of the builder should be created by calling the `::builder()`
/// method on the `GmetricClient` struct.
///
/// # Example
///
/// ```
/// use gmetric::{GmetricClient, MetricError, NopMetricSink};
///
/// fn my_error_handler(err: MetricError) {
///     eprintln!("Metric error! {}", err);
/// }
///
/// let client = GmetricClient::builder(NopMetricSink)
///     .with_error_handler(my_error_handler)
///     .build();
/// ```
pub struct GmetricClientBuilder {
    sink: Box<dyn MetricSink + Sync + Send + RefUnwindSafe>,
    errors: Box<dyn Fn(MetricError) + Sync + Send + RefUnwindSafe>,
}

impl GmetricClientBuilder {
    fn new<T>(sink: T) -> Self
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        GmetricClientBuilder {
            sink: Box::new(sink),
            errors: Box::new(log_error_handler),
        }
    }

    /// Set an error handler for packets that could not be sent.
    ///
    /// The handler is invoked for failures that are never returned to the
    /// caller: sends made while registering a metric and every send made by
    /// the scheduler on a tick. The default handler logs the error at `warn`
    /// level.
    ///
    /// The error handler should consume the error without panicking.
    pub fn with_error_handler<F>(mut self, errors: F) -> Self
    where
        F: Fn(MetricError) + Sync + Send + RefUnwindSafe + 'static,
    {
        self.errors = Box::new(errors);
        self
    }

    pub fn build(self) -> GmetricClient {
        GmetricClient::from_builder(self)
    }
}

impl fmt::Debug for GmetricClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GmetricClientBuilder { sink: ..., errors: ... }")
    }
}

/// Client for announcing metrics to a gmond daemon.
///
/// The client encodes packets and hands each of them to its `MetricSink`.
/// It is used directly for one-off announcements (the `gmetric` command
/// line tool works this way) and is shared by the `Registry` for the
/// periodic announcements made by a `Monitor`.
///
/// # Example
///
/// ```
/// use gmetric::{GmetricClient, MetricIdentity, NopMetricSink, Slope, ValueType};
///
/// let client = GmetricClient::from_sink(NopMetricSink);
/// let id = MetricIdentity::new("web01", "load_one", ValueType::Float, "", Slope::Both).unwrap();
///
/// client.announce(&id, 0.42f32).unwrap();
/// ```
pub struct GmetricClient {
    sink: Box<dyn MetricSink + Sync + Send + RefUnwindSafe>,
    errors: Box<dyn Fn(MetricError) + Sync + Send + RefUnwindSafe>,
}

impl GmetricClient {
    /// Create a new client that writes to the given sink, logging any
    /// send errors that are not returned to the caller.
    pub fn from_sink<T>(sink: T) -> Self
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        Self::builder(sink).build()
    }

    pub fn builder<T>(sink: T) -> GmetricClientBuilder
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        GmetricClientBuilder::new(sink)
    }

    /// Send a metadata packet followed by a value packet for the metric.
    ///
    /// The value must be of the metric's type, integers are accepted for
    /// float and double metrics. Errors are returned to the caller rather
    /// than passed to the error handler.
    ///
    /// # Failures
    ///
    /// * `InvalidInput` if the value is `None`.
    /// * `TypeMismatch` if the value cannot be used for this metric.
    /// * `IoError` if either packet could not be sent.
    pub fn announce<V>(&self, identity: &MetricIdentity, value: V) -> MetricResult<()>
    where
        V: ToMetricValue,
    {
        let value = value
            .to_metric_value()
            .ok_or_else(|| MetricError::from((ErrorKind::InvalidInput, "value was missing")))?
            .coerce(identity.value_type())?;

        self.announce_metadata(identity)?;
        self.announce_value(identity, &value.to_string())
    }

    /// Send only the metadata packet for the metric.
    pub fn announce_metadata(&self, identity: &MetricIdentity) -> MetricResult<()> {
        self.send_packet(&protocol::encode_metadata(identity))
    }

    /// Send only a value packet, `value` is sent as is.
    pub fn announce_value(&self, identity: &MetricIdentity, value: &str) -> MetricResult<()> {
        self.send_packet(&protocol::encode_value(identity, value))
    }

    /// Flush the underlying sink.
    pub fn flush(&self) -> MetricResult<()> {
        Ok(self.sink.flush()?)
    }

    /// Telemetry from the underlying sink.
    pub fn stats(&self) -> SinkStats {
        self.sink.stats()
    }

    pub(crate) fn send_packet(&self, packet: &[u8]) -> MetricResult<()> {
        self.sink.emit(packet)?;
        Ok(())
    }

    /// Send a packet, passing any failure to the error handler.
    pub(crate) fn send_or_report(&self, packet: &[u8]) {
        if let Err(e) = self.send_packet(packet) {
            self.consume_error(e);
        }
    }

    pub(crate) fn consume_error(&self, err: MetricError) {
        (self.errors)(err);
    }

    fn from_builder(builder: GmetricClientBuilder) -> Self {
        GmetricClient {
            sink: builder.sink,
            errors: builder.errors,
        }
    }
}

impl fmt::Debug for GmetricClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GmetricClient { sink: ..., errors: ... }")
    }
}

fn log_error_handler(err: MetricError) {
    warn!("unable to send gmetric packet: {}", err);
}
