// Gmetric - A Ganglia gmetric client for Rust!
//
// Copyright 2026 The gmetric developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Encoding of gmond's XDR based wire format.
//!
//! gmond accepts several message kinds over UDP. This client only writes two
//! of them: full metadata (`128`) describing a metric, and string values
//! (`133`) carrying the current value of a metric rendered as text. All
//! values are sent as strings regardless of the declared metric type, the
//! daemon converts them back using the type from the metadata packet.
//!
//! Message kinds defined by gmond, for reference:
//!
//! ``` text
//! gmetadata_full = 128
//! gmetric_ushort = 129
//! gmetric_short  = 130
//! gmetric_int    = 131
//! gmetric_uint   = 132
//! gmetric_string = 133
//! gmetric_float  = 134
//! gmetric_double = 135
//! ```

use crate::metric::MetricIdentity;

/// Message kind of a full metadata packet.
pub const GMETADATA_FULL: u32 = 128;

/// Message kind of a string valued metric packet.
pub const GMETRIC_STRING: u32 = 133;

// printf style format gmond applies to string values
const VALUE_FORMAT: &str = "%s";

/// Number of zero bytes needed after a string of `len` bytes to reach a
/// four byte boundary.
pub fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Growable buffer that writes primitives using gmond's XDR conventions.
///
/// Integers are written as four big-endian bytes. Strings are written as
/// their byte length (as an integer), the raw bytes, and then zero bytes up
/// to the next multiple of four. A string whose length is already a
/// multiple of four gets no padding at all.
#[derive(Debug, Default, Clone)]
pub struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    pub fn new() -> XdrWriter {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> XdrWriter {
        XdrWriter {
            buf: Vec::with_capacity(cap),
        }
    }

    /// Append a signed 32 bit integer, big-endian two's complement.
    pub fn write_int(&mut self, n: i32) -> &mut Self {
        self.buf.extend_from_slice(&n.to_be_bytes());
        self
    }

    /// Append an unsigned 32 bit integer, big-endian.
    pub fn write_uint(&mut self, n: u32) -> &mut Self {
        self.buf.extend_from_slice(&n.to_be_bytes());
        self
    }

    /// Append a length prefixed, zero padded string.
    pub fn write_string(&mut self, s: &str) -> &mut Self {
        let bytes = s.as_bytes();
        // Lengths beyond u32::MAX cannot fit in a datagram anyway.
        self.write_uint(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
        self.buf.resize(self.buf.len() + padding(bytes.len()), 0);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

// Number of bytes a string occupies once written, used for size hints
fn string_size(s: &str) -> usize {
    4 + s.len() + padding(s.len())
}

/// Build the metadata packet announcing what a metric is.
///
/// The packet layout is:
///
/// ``` text
/// int(128) str(host) str(name) int(0) str(type) str(name) str(units)
/// int(slope) int(tmax) int(dmax) int(0)
/// ```
///
/// The final zero is the count of extra metadata entries (groups, titles,
/// descriptions, spoofed hosts), which this client never sends.
pub fn encode_metadata(identity: &MetricIdentity) -> Vec<u8> {
    let type_name = identity.value_type().as_str();
    let size_hint = 4 * 6
        + string_size(identity.host())
        + 2 * string_size(identity.name())
        + string_size(type_name)
        + string_size(identity.units());

    let mut writer = XdrWriter::with_capacity(size_hint);
    writer
        .write_uint(GMETADATA_FULL)
        .write_string(identity.host())
        .write_string(identity.name())
        .write_int(0)
        .write_string(type_name)
        .write_string(identity.name())
        .write_string(identity.units())
        .write_uint(identity.slope().code())
        .write_uint(identity.tmax())
        .write_uint(identity.dmax())
        .write_int(0);

    writer.into_bytes()
}

/// Build the value packet carrying the current value of a metric.
///
/// The value is treated as opaque text. The packet layout is:
///
/// ``` text
/// int(133) str(host) str(name) int(0) str("%s") str(value)
/// ```
pub fn encode_value(identity: &MetricIdentity, value: &str) -> Vec<u8> {
    let size_hint = 4 * 2
        + string_size(identity.host())
        + string_size(identity.name())
        + string_size(VALUE_FORMAT)
        + string_size(value);

    let mut writer = XdrWriter::with_capacity(size_hint);
    writer
        .write_uint(GMETRIC_STRING)
        .write_string(identity.host())
        .write_string(identity.name())
        .write_int(0)
        .write_string(VALUE_FORMAT)
        .write_string(value);

    writer.into_bytes()
}

#[cfg(test)]
pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
