// Gmetric - A Ganglia gmetric client for Rust!
//
// Copyright 2026 The gmetric developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Periodic announcement of registered metrics.
//!
//! A `Registry` holds metrics and knows what to send on each tick. A
//! `Monitor` owns a registry and runs a background thread that calls
//! `Registry::tick` on a fixed schedule.

use std::fmt;
use std::panic::RefUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use crossbeam_channel::{self as channel, select, Sender, TrySendError};
use log::{debug, info};

use crate::client::{GmetricClient, GmetricClientBuilder};
use crate::metric::{Metric, MetricIdentity};
use crate::protocol;
use crate::sinks::MetricSink;
use crate::sync::{self, Execution};
use crate::types::{ErrorKind, MetricError, MetricResult, Slope, ValueType};

/// Time between ticks.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60);

/// Time before the first tick.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(10);

/// Number of ticks after which metadata is announced again.
pub const DEFAULT_INIT_PERIOD: u64 = 5;

/// Collection of metrics announced together.
///
/// Registering a metric announces its metadata and current value right
/// away. After that each call to `tick` announces the value of every
/// metric, resetting non-additive metrics to zero, and the metadata of
/// every metric once `init_period` ticks have gone by. Metadata is resent
/// so that a gmond that restarted or expired the metric learns about it
/// again.
///
/// Failed sends never stop a tick. They are passed to the client's error
/// handler and the remaining packets are still sent.
pub struct Registry {
    client: GmetricClient,
    init_period: u64,
    tick_count: Mutex<u64>,
    metrics: RwLock<Vec<Arc<Metric>>>,
}

impl Registry {
    pub fn new(client: GmetricClient, init_period: u64) -> Self {
        Registry {
            client,
            init_period,
            tick_count: Mutex::new(0),
            metrics: RwLock::new(Vec::new()),
        }
    }

    /// Add a metric, announcing its metadata and zero value immediately.
    ///
    /// The returned handle is used to update the value of the metric from
    /// any thread.
    ///
    /// # Example
    ///
    /// ```
    /// use gmetric::{GmetricClient, MetricIdentity, NopMetricSink, Registry, Slope, ValueType};
    ///
    /// let registry = Registry::new(GmetricClient::from_sink(NopMetricSink), 5);
    /// let id = MetricIdentity::new("web01", "requests", ValueType::Int32, "count", Slope::Both).unwrap();
    /// let requests = registry.register(id, false);
    ///
    /// requests.incr().unwrap();
    /// assert_eq!("1", requests.value_string());
    /// ```
    pub fn register(&self, identity: MetricIdentity, additive: bool) -> Arc<Metric> {
        let metric = Arc::new(Metric::new(identity, additive));
        debug!(
            "registering metric {} for host {} (additive: {})",
            metric.identity().name(),
            metric.identity().host(),
            additive
        );

        self.client.send_or_report(metric.metadata());
        self.client.send_or_report(&metric.value_packet());

        self.metrics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(metric.clone());
        metric
    }

    /// Build an identity from its parts and register it.
    ///
    /// # Failures
    ///
    /// * `UnknownType` if `type_name` is not one of `string`, `int32`,
    ///   `float` or `double`.
    /// * `InvalidInput` if the host or name are empty.
    pub fn create_metric(
        &self,
        host: &str,
        name: &str,
        type_name: &str,
        units: &str,
        slope: Slope,
        additive: bool,
    ) -> MetricResult<Arc<Metric>> {
        let value_type: ValueType = type_name.parse()?;
        let identity = MetricIdentity::new(host, name, value_type, units, slope)?;
        Ok(self.register(identity, additive))
    }

    /// Announce every registered metric once.
    ///
    /// Returns `true` if metadata was announced on this tick.
    pub fn tick(&self) -> bool {
        let mut tick_count = self.tick_count.lock().unwrap_or_else(PoisonError::into_inner);
        *tick_count += 1;
        let announce_metadata = *tick_count > self.init_period;

        let metrics = self.metrics.read().unwrap_or_else(PoisonError::into_inner);
        debug!(
            "tick {} for {} metrics (metadata: {})",
            *tick_count,
            metrics.len(),
            announce_metadata
        );

        for metric in metrics.iter() {
            if announce_metadata {
                self.client.send_or_report(metric.metadata());
            }

            let value = metric.take_value_string();
            self.client
                .send_or_report(&protocol::encode_value(metric.identity(), &value));
        }

        if announce_metadata {
            *tick_count = 0;
        }

        announce_metadata
    }

    /// Number of ticks since metadata was last announced by a tick.
    pub fn tick_count(&self) -> u64 {
        *self.tick_count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn init_period(&self) -> u64 {
        self.init_period
    }

    pub fn len(&self) -> usize {
        self.metrics.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the registered metrics in the order they were registered.
    pub fn metrics(&self) -> Vec<Arc<Metric>> {
        self.metrics.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn client(&self) -> &GmetricClient {
        &self.client
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("init_period", &self.init_period)
            .field("tick_count", &self.tick_count())
            .field("metrics", &self.len())
            .finish()
    }
}

/// Builder for creating and customizing `Monitor` instances.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use gmetric::{Monitor, NopMetricSink};
///
/// let monitor = Monitor::builder(NopMetricSink)
///     .period(Duration::from_secs(15))
///     .initial_delay(Duration::from_secs(1))
///     .init_period(10)
///     .build()
///     .unwrap();
///
/// monitor.stop_and_wait();
/// ```
#[must_use]
pub struct MonitorBuilder {
    client: GmetricClientBuilder,
    period: Duration,
    initial_delay: Duration,
    init_period: u64,
}

impl MonitorBuilder {
    fn new<T>(sink: T) -> Self
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        MonitorBuilder {
            client: GmetricClient::builder(sink),
            period: DEFAULT_PERIOD,
            initial_delay: DEFAULT_INITIAL_DELAY,
            init_period: DEFAULT_INIT_PERIOD,
        }
    }

    /// Set the time between ticks, it must be greater than zero.
    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    pub fn init_period(mut self, init_period: u64) -> Self {
        self.init_period = init_period;
        self
    }

    /// Set the handler for packets that could not be sent, see
    /// `GmetricClientBuilder::with_error_handler`.
    pub fn with_error_handler<F>(mut self, errors: F) -> Self
    where
        F: Fn(MetricError) + Sync + Send + RefUnwindSafe + 'static,
    {
        self.client = self.client.with_error_handler(errors);
        self
    }

    /// Create the monitor and start its scheduler thread.
    ///
    /// # Failures
    ///
    /// * `InvalidInput` if the period is zero.
    pub fn build(self) -> MetricResult<Monitor> {
        if self.period.is_zero() {
            return Err(MetricError::from((
                ErrorKind::InvalidInput,
                "period must be greater than zero",
            )));
        }

        let registry = Arc::new(Registry::new(self.client.build(), self.init_period));
        Ok(Monitor::start(registry, self.period, self.initial_delay))
    }
}

impl fmt::Debug for MonitorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorBuilder")
            .field("period", &self.period)
            .field("initial_delay", &self.initial_delay)
            .field("init_period", &self.init_period)
            .finish()
    }
}

/// Registry of metrics announced periodically from a background thread.
///
/// The first tick happens after the initial delay and the following ticks
/// happen at a fixed rate of one per period. If a tick panics the thread
/// is restarted and resumes ticking one period later.
///
/// Dropping the monitor stops the thread and waits for it to exit.
///
/// # Example
///
/// ```no_run
/// use std::net::Ipv4Addr;
/// use gmetric::{Monitor, MetricIdentity, Slope, UdpMetricSink, ValueType, DEFAULT_PORT};
///
/// let sink = UdpMetricSink::multicast(Ipv4Addr::new(239, 2, 11, 71), DEFAULT_PORT).unwrap();
/// let monitor = Monitor::from_sink(sink).unwrap();
///
/// let id = MetricIdentity::new("web01", "jobs_done", ValueType::Int32, "jobs", Slope::Positive).unwrap();
/// let jobs = monitor.register(id, true);
/// jobs.incr().unwrap();
/// ```
pub struct Monitor {
    registry: Arc<Registry>,
    stop: Sender<()>,
    execution: Execution,
}

impl Monitor {
    /// Start a monitor sending to the given sink with the default period,
    /// initial delay and metadata interval.
    pub fn from_sink<T>(sink: T) -> MetricResult<Self>
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        Self::builder(sink).build()
    }

    pub fn builder<T>(sink: T) -> MonitorBuilder
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        MonitorBuilder::new(sink)
    }

    fn start(registry: Arc<Registry>, period: Duration, initial_delay: Duration) -> Self {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let shared = registry.clone();
        let first_run = AtomicBool::new(true);

        info!(
            "starting gmetric monitor (period: {:?}, initial delay: {:?}, init period: {})",
            period,
            initial_delay,
            registry.init_period()
        );

        let execution = sync::execute("gmetric-monitor", move || {
            let delay = if first_run.swap(false, Ordering::Relaxed) {
                initial_delay
            } else {
                period
            };

            let mut next = Instant::now() + delay;
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(channel::at(next)) -> _ => {
                        shared.tick();
                        next += period;
                    }
                }
            }
        });

        Monitor {
            registry,
            stop: stop_tx,
            execution,
        }
    }

    /// See `Registry::register`.
    pub fn register(&self, identity: MetricIdentity, additive: bool) -> Arc<Metric> {
        self.registry.register(identity, additive)
    }

    /// See `Registry::create_metric`.
    pub fn create_metric(
        &self,
        host: &str,
        name: &str,
        type_name: &str,
        units: &str,
        slope: Slope,
        additive: bool,
    ) -> MetricResult<Arc<Metric>> {
        self.registry.create_metric(host, name, type_name, units, slope, additive)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Number of times the scheduler thread panicked and was restarted.
    pub fn panics(&self) -> u64 {
        self.execution.panics()
    }

    /// Stop the scheduler thread and wait for it to exit.
    ///
    /// A tick that is in progress is allowed to finish.
    pub fn stop_and_wait(&self) {
        match self.stop.try_send(()) {
            // Already stopping
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => return,
        }

        self.execution.wait();
        info!("stopped gmetric monitor");
    }
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("registry", &self.registry)
            .field("panics", &self.panics())
            .finish()
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop_and_wait();
    }
}
