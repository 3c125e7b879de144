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
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::protocol;
use crate::types::{ErrorKind, MetricError, MetricResult, Slope, ValueType};

/// Immutable description of a metric: where it comes from, what it is
/// called, and how gmond should interpret its values.
///
/// Spaces are removed from metric names since gmond uses them as part of
/// RRD file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricIdentity {
    host: String,
    name: String,
    value_type: ValueType,
    units: String,
    slope: Slope,
    tmax: u32,
    dmax: u32,
}

impl MetricIdentity {
    /// Create a new identity, failing if the host or name are empty.
    ///
    /// The units may be empty. Both `tmax` and `dmax` default to `0`, use
    /// `with_tmax` and `with_dmax` to change them.
    ///
    /// # Example
    ///
    /// ```
    /// use gmetric::{MetricIdentity, Slope, ValueType};
    ///
    /// let id = MetricIdentity::new("web01", "Request Count", ValueType::Int32, "requests", Slope::Both)
    ///     .unwrap()
    ///     .with_tmax(60);
    ///
    /// assert_eq!("RequestCount", id.name());
    /// assert_eq!(60, id.tmax());
    /// ```
    pub fn new<H, N, U>(host: H, name: N, value_type: ValueType, units: U, slope: Slope) -> MetricResult<MetricIdentity>
    where
        H: Into<String>,
        N: AsRef<str>,
        U: Into<String>,
    {
        let host = host.into();
        if host.is_empty() {
            return Err(MetricError::from((ErrorKind::InvalidInput, "host was empty")));
        }

        let name = name.as_ref().replace(' ', "");
        if name.is_empty() {
            return Err(MetricError::from((ErrorKind::InvalidInput, "name was empty")));
        }

        Ok(MetricIdentity {
            host,
            name,
            value_type,
            units: units.into(),
            slope,
            tmax: 0,
            dmax: 0,
        })
    }

    /// Create a builder for an identity where every required field must be
    /// supplied before `.build()` succeeds.
    pub fn builder() -> MetricIdentityBuilder {
        MetricIdentityBuilder::default()
    }

    /// Set the maximum number of seconds between value updates, a hint
    /// gmond uses to judge whether a metric is stale.
    pub fn with_tmax(self, tmax: u32) -> Self {
        Self { tmax, ..self }
    }

    /// Set the number of seconds after which gmond may delete the metric
    /// when no updates arrive. Zero means never.
    pub fn with_dmax(self, dmax: u32) -> Self {
        Self { dmax, ..self }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn slope(&self) -> Slope {
        self.slope
    }

    pub fn tmax(&self) -> u32 {
        self.tmax
    }

    pub fn dmax(&self) -> u32 {
        self.dmax
    }
}

/// Builder for a `MetricIdentity` that reports any missing required field
/// (host, name, value type, units) as an `InvalidInput` error.
#[must_use]
#[derive(Debug, Default, Clone)]
pub struct MetricIdentityBuilder {
    host: Option<String>,
    name: Option<String>,
    value_type: Option<ValueType>,
    units: Option<String>,
    slope: Slope,
    tmax: u32,
    dmax: u32,
}

impl MetricIdentityBuilder {
    pub fn host<S: Into<String>>(self, host: S) -> Self {
        Self {
            host: Some(host.into()),
            ..self
        }
    }

    pub fn name<S: Into<String>>(self, name: S) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    pub fn value_type(self, value_type: ValueType) -> Self {
        Self {
            value_type: Some(value_type),
            ..self
        }
    }

    pub fn units<S: Into<String>>(self, units: S) -> Self {
        Self {
            units: Some(units.into()),
            ..self
        }
    }

    pub fn slope(self, slope: Slope) -> Self {
        Self { slope, ..self }
    }

    pub fn tmax(self, tmax: u32) -> Self {
        Self { tmax, ..self }
    }

    pub fn dmax(self, dmax: u32) -> Self {
        Self { dmax, ..self }
    }

    pub fn build(self) -> MetricResult<MetricIdentity> {
        let host = self
            .host
            .ok_or_else(|| MetricError::from((ErrorKind::InvalidInput, "host was missing")))?;
        let name = self
            .name
            .ok_or_else(|| MetricError::from((ErrorKind::InvalidInput, "name was missing")))?;
        let value_type = self
            .value_type
            .ok_or_else(|| MetricError::from((ErrorKind::InvalidInput, "value type was missing")))?;
        let units = self
            .units
            .ok_or_else(|| MetricError::from((ErrorKind::InvalidInput, "units were missing")))?;

        Ok(MetricIdentity::new(host, name, value_type, units, self.slope)?
            .with_tmax(self.tmax)
            .with_dmax(self.dmax))
    }
}

/// Holder for a metric value of any of the supported types that knows
/// how to display itself the way gmond expects to read it.
///
/// Integers are written in decimal. Floating point values are written the
/// way Java's `Double.toString` writes them: plain decimal with at least one
/// fractional digit when `1e-3 <= |v| < 1e7` (`0.0`, `10.5`), otherwise
/// computerized scientific notation (`1.0E7`, `9.0E-4`). Non-finite values
/// are `NaN`, `Infinity` and `-Infinity`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    String(String),
    Int32(i32),
    Float(f32),
    Double(f64),
}

impl MetricValue {
    pub fn value_type(&self) -> ValueType {
        match *self {
            MetricValue::String(_) => ValueType::String,
            MetricValue::Int32(_) => ValueType::Int32,
            MetricValue::Float(_) => ValueType::Float,
            MetricValue::Double(_) => ValueType::Double,
        }
    }

    /// Zero value of the given type: `0`, `0.0`, or the empty string.
    pub fn zero(value_type: ValueType) -> MetricValue {
        match value_type {
            ValueType::String => MetricValue::String(String::new()),
            ValueType::Int32 => MetricValue::Int32(0),
            ValueType::Float => MetricValue::Float(0.0),
            ValueType::Double => MetricValue::Double(0.0),
        }
    }

    /// Convert this value to the given type, widening numbers where no
    /// precision is lost in practice (`i32` to either float type, `f32`
    /// to `f64`).
    pub(crate) fn coerce(self, value_type: ValueType) -> MetricResult<MetricValue> {
        match (self, value_type) {
            (v @ MetricValue::String(_), ValueType::String) => Ok(v),
            (v @ MetricValue::Int32(_), ValueType::Int32) => Ok(v),
            (v @ MetricValue::Float(_), ValueType::Float) => Ok(v),
            (v @ MetricValue::Double(_), ValueType::Double) => Ok(v),
            (MetricValue::Int32(v), ValueType::Float) => Ok(MetricValue::Float(v as f32)),
            (MetricValue::Int32(v), ValueType::Double) => Ok(MetricValue::Double(f64::from(v))),
            (MetricValue::Float(v), ValueType::Double) => Ok(MetricValue::Double(f64::from(v))),
            (v, expected) => Err(MetricError::from((
                ErrorKind::TypeMismatch,
                "value does not match metric type",
                format!("{} value for {} metric", v.value_type(), expected),
            ))),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MetricValue::String(ref v) => f.write_str(v),
            MetricValue::Int32(v) => f.write_str(itoa::Buffer::new().format(v)),
            MetricValue::Float(v) => {
                if !v.is_finite() {
                    return write_non_finite(f, v.is_nan(), v.is_sign_negative());
                }
                let plain = v == 0.0 || (1e-3..1e7).contains(&v.abs());
                write_java_float(f, ryu::Buffer::new().format_finite(v), plain)
            }
            MetricValue::Double(v) => {
                if !v.is_finite() {
                    return write_non_finite(f, v.is_nan(), v.is_sign_negative());
                }
                let plain = v == 0.0 || (1e-3..1e7).contains(&v.abs());
                write_java_float(f, ryu::Buffer::new().format_finite(v), plain)
            }
        }
    }
}

fn write_non_finite(f: &mut fmt::Formatter<'_>, nan: bool, negative: bool) -> fmt::Result {
    match (nan, negative) {
        (true, _) => f.write_str("NaN"),
        (false, false) => f.write_str("Infinity"),
        (false, true) => f.write_str("-Infinity"),
    }
}

// `shortest` is ryu's round-trip text, either plain (`0.0001`) or with an
// exponent (`1.5e20`). Inside the plain range ryu already agrees with Java.
fn write_java_float(f: &mut fmt::Formatter<'_>, shortest: &str, plain: bool) -> fmt::Result {
    if plain {
        return f.write_str(shortest);
    }

    let (sign, text) = match shortest.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", shortest),
    };
    let (mantissa, exp) = match text.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or_default()),
        None => (text, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let digits: String = int_part.chars().chain(frac_part.chars()).collect();
    let significant = digits.trim_start_matches('0');
    let leading_zeros = digits.len() - significant.len();
    let significant = significant.trim_end_matches('0');
    let exponent = int_part.len() as i32 - leading_zeros as i32 + exp - 1;

    let (first, rest) = significant.split_at(1);
    let rest = if rest.is_empty() { "0" } else { rest };

    f.write_str(sign)?;
    f.write_str(first)?;
    f.write_str(".")?;
    f.write_str(rest)?;
    f.write_str("E")?;
    f.write_str(itoa::Buffer::new().format(exponent))
}

/// Conversion trait for values that can be applied to a metric.
///
/// Implemented for the primitive types backing each metric type and for
/// `Option`s of them. Converting `None` yields no value, which makes
/// `Metric::set(None)` a no-op instead of an error.
pub trait ToMetricValue {
    fn to_metric_value(self) -> Option<MetricValue>;
}

impl ToMetricValue for MetricValue {
    fn to_metric_value(self) -> Option<MetricValue> {
        Some(self)
    }
}

impl ToMetricValue for i32 {
    fn to_metric_value(self) -> Option<MetricValue> {
        Some(MetricValue::Int32(self))
    }
}

impl ToMetricValue for f32 {
    fn to_metric_value(self) -> Option<MetricValue> {
        Some(MetricValue::Float(self))
    }
}

impl ToMetricValue for f64 {
    fn to_metric_value(self) -> Option<MetricValue> {
        Some(MetricValue::Double(self))
    }
}

impl ToMetricValue for String {
    fn to_metric_value(self) -> Option<MetricValue> {
        Some(MetricValue::String(self))
    }
}

impl ToMetricValue for &str {
    fn to_metric_value(self) -> Option<MetricValue> {
        Some(MetricValue::String(self.to_string()))
    }
}

impl<T> ToMetricValue for Option<T>
where
    T: ToMetricValue,
{
    fn to_metric_value(self) -> Option<MetricValue> {
        self.and_then(ToMetricValue::to_metric_value)
    }
}

// Poisoning only means another thread panicked while holding the lock, the
// value inside is still a valid number or string.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Storage for the current value of a metric.
///
/// Integers use atomic operations. Every other type guards its value with
/// a mutex so that reading and clearing happen as one step.
#[derive(Debug)]
enum ValueCell {
    String(Mutex<String>),
    Int32(AtomicI32),
    Float(Mutex<f32>),
    Double(Mutex<f64>),
}

impl ValueCell {
    fn new(value_type: ValueType) -> ValueCell {
        match value_type {
            ValueType::String => ValueCell::String(Mutex::new(String::new())),
            ValueType::Int32 => ValueCell::Int32(AtomicI32::new(0)),
            ValueType::Float => ValueCell::Float(Mutex::new(0.0)),
            ValueType::Double => ValueCell::Double(Mutex::new(0.0)),
        }
    }

    fn get(&self) -> MetricValue {
        match self {
            ValueCell::String(v) => MetricValue::String(lock(v).clone()),
            ValueCell::Int32(v) => MetricValue::Int32(v.load(Ordering::Acquire)),
            ValueCell::Float(v) => MetricValue::Float(*lock(v)),
            ValueCell::Double(v) => MetricValue::Double(*lock(v)),
        }
    }

    fn take(&self) -> MetricValue {
        match self {
            ValueCell::String(v) => MetricValue::String(std::mem::take(&mut *lock(v))),
            ValueCell::Int32(v) => MetricValue::Int32(v.swap(0, Ordering::AcqRel)),
            ValueCell::Float(v) => MetricValue::Float(std::mem::replace(&mut *lock(v), 0.0)),
            ValueCell::Double(v) => MetricValue::Double(std::mem::replace(&mut *lock(v), 0.0)),
        }
    }

    // Values passed in have already been coerced to the type of this cell.
    fn set(&self, value: MetricValue) {
        match (self, value) {
            (ValueCell::String(cell), MetricValue::String(v)) => *lock(cell) = v,
            (ValueCell::Int32(cell), MetricValue::Int32(v)) => cell.store(v, Ordering::Release),
            (ValueCell::Float(cell), MetricValue::Float(v)) => *lock(cell) = v,
            (ValueCell::Double(cell), MetricValue::Double(v)) => *lock(cell) = v,
            _ => unreachable!("value was not coerced to the metric type"),
        }
    }

    fn add(&self, delta: MetricValue) {
        match (self, delta) {
            (ValueCell::Int32(cell), MetricValue::Int32(v)) => {
                cell.fetch_add(v, Ordering::AcqRel);
            }
            (ValueCell::Float(cell), MetricValue::Float(v)) => *lock(cell) += v,
            (ValueCell::Double(cell), MetricValue::Double(v)) => *lock(cell) += v,
            _ => unreachable!("delta was not coerced to the metric type"),
        }
    }
}

/// A single named metric: its identity, its current value, and whether
/// that value is reset after every periodic announcement.
///
/// Metrics are created by a `Registry` (or a `Monitor`) and handed out as
/// `Arc<Metric>` so that any number of threads can update them while the
/// scheduler reads them. Non-additive metrics are reset to the zero value
/// of their type after each announcement, additive metrics keep
/// accumulating.
///
/// The metadata packet is computed once at creation since the identity
/// of a metric never changes.
#[derive(Debug)]
pub struct Metric {
    identity: MetricIdentity,
    value: ValueCell,
    additive: bool,
    metadata: Box<[u8]>,
}

impl Metric {
    pub(crate) fn new(identity: MetricIdentity, additive: bool) -> Metric {
        let metadata = protocol::encode_metadata(&identity).into_boxed_slice();
        let value = ValueCell::new(identity.value_type());

        Metric {
            identity,
            value,
            additive,
            metadata,
        }
    }

    pub fn identity(&self) -> &MetricIdentity {
        &self.identity
    }

    pub fn is_additive(&self) -> bool {
        self.additive
    }

    /// Precomputed metadata packet for this metric.
    pub fn metadata(&self) -> &[u8] {
        &self.metadata
    }

    /// Snapshot of the current value.
    pub fn value(&self) -> MetricValue {
        self.value.get()
    }

    /// Current value in the text form sent to gmond.
    pub fn value_string(&self) -> String {
        self.value.get().to_string()
    }

    /// Value packet for the current value of this metric.
    pub fn value_packet(&self) -> Vec<u8> {
        protocol::encode_value(&self.identity, &self.value_string())
    }

    /// Replace the current value.
    ///
    /// Setting `None` leaves the current value unchanged. Values of a
    /// different type than the metric fail with `TypeMismatch`, except
    /// for numeric widening (`i32` into a float or double metric, `f32`
    /// into a double metric).
    pub fn set<V: ToMetricValue>(&self, value: V) -> MetricResult<()> {
        if let Some(v) = value.to_metric_value() {
            self.value.set(v.coerce(self.identity.value_type)?);
        }

        Ok(())
    }

    /// Add `delta` to the current value.
    ///
    /// Integer metrics are updated atomically and wrap on overflow. String
    /// metrics cannot be incremented and fail with `TypeMismatch`.
    pub fn increment<V: ToMetricValue>(&self, delta: V) -> MetricResult<()> {
        if self.identity.value_type == ValueType::String {
            return Err(MetricError::from((
                ErrorKind::TypeMismatch,
                "string metrics cannot be incremented",
            )));
        }

        if let Some(v) = delta.to_metric_value() {
            self.value.add(v.coerce(self.identity.value_type)?);
        }

        Ok(())
    }

    /// Add one to the current value.
    pub fn incr(&self) -> MetricResult<()> {
        self.increment(1)
    }

    /// Reset the value to `0`, `0.0`, or the empty string.
    pub fn clear(&self) {
        self.value.take();
    }

    /// Text of the value to announce on a tick, resetting the value in the
    /// same step when this metric is not additive so that no update made
    /// between reading and clearing is lost.
    pub(crate) fn take_value_string(&self) -> String {
        if self.additive {
            self.value_string()
        } else {
            self.value.take().to_string()
        }
    }
}
