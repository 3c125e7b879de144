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
use std::io;
use std::str::FromStr;

use thiserror::Error;

/// Type of value a metric carries, as announced in metadata packets.
///
/// The gmond protocol also defines unsigned and short integer types
/// (`uint16`, `int16`, `uint32`) but this client never emits them.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ValueType {
    String,
    Int32,
    Float,
    Double,
}

impl ValueType {
    /// Name of the type as written on the wire.
    pub fn as_str(&self) -> &'static str {
        match *self {
            ValueType::String => "string",
            ValueType::Int32 => "int32",
            ValueType::Float => "float",
            ValueType::Double => "double",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ValueType::String),
            "int32" => Ok(ValueType::Int32),
            "float" => Ok(ValueType::Float),
            "double" => Ok(ValueType::Double),
            other => Err(MetricError::from((
                ErrorKind::UnknownType,
                "unknown metric type",
                other.to_string(),
            ))),
        }
    }
}

/// Hint to the monitoring daemon about how a metric is expected to trend.
///
/// The daemon only forwards this value, it never checks that it holds.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum Slope {
    Zero,
    Positive,
    Negative,
    #[default]
    Both,
    Unspecified,
}

impl Slope {
    /// Numeric code of the slope as written on the wire (0 through 4).
    pub fn code(&self) -> u32 {
        match *self {
            Slope::Zero => 0,
            Slope::Positive => 1,
            Slope::Negative => 2,
            Slope::Both => 3,
            Slope::Unspecified => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Slope::Zero => "zero",
            Slope::Positive => "positive",
            Slope::Negative => "negative",
            Slope::Both => "both",
            Slope::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for Slope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slope {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero" => Ok(Slope::Zero),
            "positive" => Ok(Slope::Positive),
            "negative" => Ok(Slope::Negative),
            "both" => Ok(Slope::Both),
            "unspecified" => Ok(Slope::Unspecified),
            other => Err(MetricError::from((
                ErrorKind::InvalidInput,
                "unknown slope",
                other.to_string(),
            ))),
        }
    }
}

/// Potential categories an error from this library falls into.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ErrorKind {
    /// A metric could not be constructed because a required field was
    /// missing or empty.
    InvalidInput,
    /// A metric of an unrecognized value type was requested.
    UnknownType,
    /// A value did not match the type of the metric it was applied to.
    TypeMismatch,
    /// A packet could not be sent by a `MetricSink`.
    IoError,
}

/// Error generated by this library potentially wrapping another
/// type of error (exposed via the `Error` trait).
#[derive(Debug, Error)]
#[error(transparent)]
pub struct MetricError {
    repr: ErrorRepr,
}

#[derive(Debug, Error)]
enum ErrorRepr {
    #[error("{1}")]
    WithDescription(ErrorKind, &'static str),
    #[error("{1}: {2}")]
    WithDetail(ErrorKind, &'static str, String),
    #[error("{0}")]
    IoError(#[from] io::Error),
}

impl MetricError {
    /// Return the kind of the error
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::IoError(_) => ErrorKind::IoError,
            ErrorRepr::WithDescription(kind, _) => kind,
            ErrorRepr::WithDetail(kind, _, _) => kind,
        }
    }
}

impl From<io::Error> for MetricError {
    fn from(err: io::Error) -> MetricError {
        MetricError {
            repr: ErrorRepr::IoError(err),
        }
    }
}

impl From<(ErrorKind, &'static str)> for MetricError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> MetricError {
        MetricError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

impl From<(ErrorKind, &'static str, String)> for MetricError {
    fn from((kind, desc, detail): (ErrorKind, &'static str, String)) -> MetricError {
        MetricError {
            repr: ErrorRepr::WithDetail(kind, desc, detail),
        }
    }
}

pub type MetricResult<T> = Result<T, MetricError>;

#[cfg(test)]
mod tests {
    use super::{ErrorKind, MetricError, Slope, ValueType};
    use std::error::Error;
    use std::io;

    #[test]
    fn test_value_type_round_trip_names() {
        for ty in [ValueType::String, ValueType::Int32, ValueType::Float, ValueType::Double] {
            assert_eq!(ty, ty.as_str().parse().unwrap());
        }
    }

    #[test]
    fn test_value_type_unknown() {
        let err = "uint16".parse::<ValueType>().unwrap_err();
        assert_eq!(ErrorKind::UnknownType, err.kind());
        assert_eq!("unknown metric type: uint16", err.to_string());
    }

    #[test]
    fn test_slope_codes() {
        assert_eq!(0, Slope::Zero.code());
        assert_eq!(1, Slope::Positive.code());
        assert_eq!(2, Slope::Negative.code());
        assert_eq!(3, Slope::Both.code());
        assert_eq!(4, Slope::Unspecified.code());
    }

    #[test]
    fn test_slope_parse() {
        assert_eq!(Slope::Unspecified, "unspecified".parse().unwrap());
        assert_eq!(ErrorKind::InvalidInput, "sideways".parse::<Slope>().unwrap_err().kind());
    }

    #[test]
    fn test_slope_default_is_both() {
        assert_eq!(Slope::Both, Slope::default());
    }

    #[test]
    fn test_metric_error_kind_io_error() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "Broken pipe");
        let our_err = MetricError::from(io_err);
        assert_eq!(ErrorKind::IoError, our_err.kind());
        assert!(our_err.source().is_some());
    }

    #[test]
    fn test_metric_error_kind_invalid_input() {
        let our_err = MetricError::from((ErrorKind::InvalidInput, "Nope!"));
        assert_eq!(ErrorKind::InvalidInput, our_err.kind());
        assert_eq!("Nope!", our_err.to_string());
    }
}
