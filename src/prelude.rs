// Gmetric - A Ganglia gmetric client for Rust!
//
// Copyright 2026 The gmetric developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Traits needed to use the library, meant to be glob imported.

pub use crate::metric::ToMetricValue;
pub use crate::sinks::MetricSink;
