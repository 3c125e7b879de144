// Gmetric - A Ganglia gmetric client for Rust!
//
// Copyright 2026 The gmetric developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::net::{IpAddr, UdpSocket};
use std::thread;
use std::time::Duration;

use clap::Parser;
use log::{debug, info};

use gmetric::{
    ErrorKind, GmetricClient, MetricError, MetricIdentity, MetricResult, MetricValue, Monitor, Slope,
    UdpMetricSink, ValueType, DEFAULT_PORT,
};

/// Announce a metric to a Ganglia gmond daemon.
#[derive(Parser, Debug)]
#[command(name = "gmetric", version, about)]
struct Cli {
    /// Address of the gmond daemon or multicast group to send to.
    #[arg(short, long)]
    server: IpAddr,

    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Host the metric belongs to, defaults to the local hostname.
    #[arg(long)]
    host: Option<String>,

    /// Name of the metric, spaces are removed.
    #[arg(short, long)]
    name: String,

    #[arg(short, long)]
    value: String,

    /// One of string, int32, float, double.
    #[arg(short = 't', long = "type", default_value = "string")]
    value_type: ValueType,

    #[arg(short, long, default_value = "")]
    units: String,

    /// One of zero, positive, negative, both, unspecified.
    #[arg(long, default_value = "both")]
    slope: Slope,

    /// Maximum time in seconds between announcements.
    #[arg(long, default_value_t = 60)]
    tmax: u32,

    /// Lifetime in seconds of the metric, 0 for unlimited.
    #[arg(long, default_value_t = 0)]
    dmax: u32,

    /// Keep running and announce the value every this many seconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    period: Option<u64>,
}

fn main() -> MetricResult<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let host = cli.host.clone().unwrap_or_else(local_hostname);

    let identity = MetricIdentity::new(host, &cli.name, cli.value_type, cli.units.as_str(), cli.slope)?
        .with_tmax(cli.tmax)
        .with_dmax(cli.dmax);
    let value = parse_value(cli.value_type, &cli.value)?;
    let sink = new_sink(cli.server, cli.port)?;

    match cli.period {
        None => {
            let client = GmetricClient::from_sink(sink);
            client.announce(&identity, value)?;
            debug!("announced {} = {}", identity.name(), cli.value);
            Ok(())
        }
        Some(secs) => {
            let monitor = Monitor::builder(sink)
                .period(Duration::from_secs(secs))
                .initial_delay(Duration::from_secs(secs))
                .build()?;

            let metric = monitor.register(identity, true);
            metric.set(value)?;
            info!("announcing {} every {}s", metric.identity().name(), secs);

            loop {
                thread::park();
            }
        }
    }
}

fn new_sink(server: IpAddr, port: u16) -> MetricResult<UdpMetricSink> {
    match server {
        IpAddr::V4(addr) if addr.is_multicast() => UdpMetricSink::multicast(addr, port),
        addr => {
            let local: IpAddr = if addr.is_ipv4() {
                [0, 0, 0, 0].into()
            } else {
                [0u16; 8].into()
            };

            let socket = UdpSocket::bind((local, 0))?;
            UdpMetricSink::from((addr, port), socket)
        }
    }
}

fn parse_value(value_type: ValueType, value: &str) -> MetricResult<MetricValue> {
    let parsed = match value_type {
        ValueType::String => Some(MetricValue::String(value.to_owned())),
        ValueType::Int32 => value.parse().ok().map(MetricValue::Int32),
        ValueType::Float => value.parse().ok().map(MetricValue::Float),
        ValueType::Double => value.parse().ok().map(MetricValue::Double),
    };

    parsed.ok_or_else(|| {
        MetricError::from((
            ErrorKind::InvalidInput,
            "invalid metric value",
            format!("{} is not a valid {}", value, value_type),
        ))
    })
}

#[cfg(unix)]
fn local_hostname() -> String {
    rustix::system::uname().nodename().to_string_lossy().into_owned()
}

#[cfg(not(unix))]
fn local_hostname() -> String {
    std::env::var("COMPUTERNAME").unwrap_or_else(|_| "localhost".to_owned())
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;

    const ARGS: [&str; 7] = ["gmetric", "--server", "127.0.0.1", "--name", "load", "--value", "1"];

    #[test]
    fn test_cli_rejects_zero_period() {
        let args = ARGS.iter().copied().chain(["--period", "0"]);
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_accepts_positive_period() {
        let args = ARGS.iter().copied().chain(["--period", "1"]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(Some(1), cli.period);
    }

    #[test]
    fn test_cli_period_is_optional() {
        let cli = Cli::try_parse_from(ARGS).unwrap();
        assert_eq!(None, cli.period);
    }
}
