//! Internal instrumentation of the ingestion front end, reported to statsd through cadence.
//!
//! Every component declares its metrics as enums implementing one of the metric traits
//! ([`CounterMetric`], [`TimerMetric`], [`GaugeMetric`] or [`DistributionMetric`]). The traits
//! only map a variant to its name, which keeps a counter from being emitted as a timer by
//! accident. Metrics are emitted with the [`metric!`] macro.
//!
//! ```
//! use ingest_statsd::{CounterMetric, metric};
//!
//! enum WriterCounters {
//!     StorageWrite,
//! }
//!
//! impl CounterMetric for WriterCounters {
//!     fn name(&self) -> &'static str {
//!         match self {
//!             Self::StorageWrite => "writer.storage.write",
//!         }
//!     }
//! }
//!
//! metric!(counter(WriterCounters::StorageWrite) += 1, metrics_type = "unaggregated");
//! ```
//!
//! Until a client is installed, emitting a metric does nothing. [`init`] installs a client that
//! buffers metrics and sends them over UDP from a background thread:
//!
//! ```no_run
//! use std::collections::BTreeMap;
//!
//! ingest_statsd::init(ingest_statsd::MetricsClientConfig {
//!     prefix: "ingest",
//!     host: "127.0.0.1:8125",
//!     default_tags: BTreeMap::new(),
//!     default_sample_rate: 1.0.into(),
//! })
//! .ok();
//! ```
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::net::{ToSocketAddrs, UdpSocket};
use std::ops::Deref;
use std::sync::Arc;

use cadence::{
    BufferedUdpMetricSink, Metric, MetricBuilder, MetricError, QueuingMetricSink, StatsdClient,
};
use parking_lot::RwLock;
use rand::Rng;

/// Metrics queued beyond this limit are dropped.
const MAX_QUEUED_METRICS: usize = 100_000;

/// The fraction of emitted metrics that are sent, between `0.0` and `1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleRate(f64);

impl SampleRate {
    /// Decides whether a single metric is sent.
    fn sample(self) -> bool {
        match self.0 {
            rate if rate >= 1.0 => true,
            rate if rate <= 0.0 => false,
            rate => rand::rng().random_bool(rate),
        }
    }
}

impl From<f64> for SampleRate {
    fn from(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }
}

impl From<SampleRate> for f64 {
    fn from(value: SampleRate) -> Self {
        value.0
    }
}

/// The installed statsd client together with the tags and sample rate applied to every metric.
#[derive(Debug)]
pub struct MetricsClient {
    /// The cadence client metrics are sent through.
    pub statsd_client: StatsdClient,
    /// Tags added to every metric.
    pub default_tags: BTreeMap<String, String>,
    /// Sample rate applied to every metric.
    pub default_sample_rate: SampleRate,
}

impl MetricsClient {
    /// Sends a metric built from this client, adding the default tags and sample rate.
    #[inline(always)]
    pub fn send_metric<'a, T>(&'a self, metric: MetricBuilder<'a, '_, T>)
    where
        T: Metric + From<String>,
    {
        if !self.default_sample_rate.sample() {
            return;
        }

        let mut metric = self
            .default_tags
            .iter()
            .fold(metric, |metric, (key, value)| metric.with_tag(key, value));

        let rate = f64::from(self.default_sample_rate);
        if rate < 1.0 {
            metric = metric.with_sampling_rate(rate);
        }

        if let Err(error) = metric.try_send() {
            ingest_log::error!(
                queue_size = MAX_QUEUED_METRICS,
                "failed to send internal metric: {}",
                ingest_log::LogError(&error)
            );
        }
    }
}

impl Deref for MetricsClient {
    type Target = StatsdClient;

    fn deref(&self) -> &StatsdClient {
        &self.statsd_client
    }
}

/// Configuration passed to [`init`].
#[derive(Debug)]
pub struct MetricsClientConfig<'a, A> {
    /// Prepended to every metric name, separated by a dot.
    pub prefix: &'a str,
    /// Address of the statsd server.
    pub host: A,
    /// Tags added to every metric.
    pub default_tags: BTreeMap<String, String>,
    /// Sample rate applied to every metric.
    pub default_sample_rate: SampleRate,
}

static GLOBAL_CLIENT: RwLock<Option<Arc<MetricsClient>>> = RwLock::new(None);

thread_local! {
    // Cached per thread so emitting a metric does not contend on the global lock.
    static THREAD_CLIENT: RefCell<Option<Arc<MetricsClient>>> =
        RefCell::new(GLOBAL_CLIENT.read().clone());
}

#[doc(hidden)]
pub mod _pred {
    pub use cadence::prelude::*;
}

/// Installs a statsd client for all threads.
pub fn set_client(client: MetricsClient) {
    let client = Arc::new(client);
    *GLOBAL_CLIENT.write() = Some(Arc::clone(&client));
    THREAD_CLIENT.with(|cell| cell.replace(Some(client)));
}

/// Runs `f` with a client that records metrics instead of sending them and returns the records.
///
/// Only metrics emitted on the current thread are recorded.
#[cfg(any(test, feature = "test"))]
pub fn with_capturing_test_client(f: impl FnOnce()) -> Vec<String> {
    let (receiver, sink) = cadence::SpyMetricSink::new();
    let client = MetricsClient {
        statsd_client: StatsdClient::from_sink("", sink),
        default_tags: BTreeMap::new(),
        default_sample_rate: SampleRate(1.0),
    };

    let previous = THREAD_CLIENT.with(|cell| cell.replace(Some(Arc::new(client))));
    f();
    THREAD_CLIENT.with(|cell| cell.replace(previous));

    receiver
        .try_iter()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .collect()
}

/// Installs a client that reports to the configured statsd server.
///
/// Fails if the host cannot be resolved or no local UDP socket can be bound.
pub fn init<A: ToSocketAddrs>(config: MetricsClientConfig<'_, A>) -> Result<(), MetricError> {
    let Some(addr) = config.host.to_socket_addrs()?.next() else {
        return Err(MetricError::from((
            cadence::ErrorKind::InvalidInput,
            "statsd host did not resolve to an address",
        )));
    };

    let rate = f64::from(config.default_sample_rate);
    ingest_log::info!("reporting internal metrics to statsd at {addr} with sample rate {rate}");

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.set_nonblocking(true)?;
    let sink = QueuingMetricSink::with_capacity(
        BufferedUdpMetricSink::from(addr, socket)?,
        MAX_QUEUED_METRICS,
    );

    set_client(MetricsClient {
        statsd_client: StatsdClient::from_sink(config.prefix, sink),
        default_tags: config.default_tags,
        default_sample_rate: config.default_sample_rate,
    });

    Ok(())
}

/// Calls `f` with the client of the current thread.
///
/// Returns the default value without calling `f` if no client is installed. Prefer the
/// [`metric!`] macro.
#[inline(always)]
pub fn with_client<F, R>(f: F) -> R
where
    F: FnOnce(&MetricsClient) -> R,
    R: Default,
{
    THREAD_CLIENT.with(|cell| match cell.borrow().as_deref() {
        Some(client) => f(client),
        None => R::default(),
    })
}

/// A metric measuring elapsed time, reported in milliseconds.
pub trait TimerMetric {
    /// Returns the name of the timer.
    fn name(&self) -> &'static str;
}

/// A metric counting events.
///
/// Counters are summed up by the statsd server.
pub trait CounterMetric {
    /// Returns the name of the counter.
    fn name(&self) -> &'static str;
}

/// A metric recording the distribution of a value, such as the size of a batch.
pub trait DistributionMetric {
    /// Returns the name of the distribution.
    fn name(&self) -> &'static str;
}

/// A metric recording the current value of a quantity.
pub trait GaugeMetric {
    /// Returns the name of the gauge.
    fn name(&self) -> &'static str;
}

/// Emits a metric through the client of the current thread.
///
/// ```
/// use std::time::Duration;
///
/// use ingest_statsd::{TimerMetric, metric};
///
/// struct BatchDuration;
///
/// impl TimerMetric for BatchDuration {
///     fn name(&self) -> &'static str {
///         "writer.write_batch.duration"
///     }
/// }
///
/// // Report an elapsed time.
/// metric!(timer(BatchDuration) = Duration::from_millis(12), path = "batch");
///
/// // Time a block and return its value.
/// let written = metric!(timer(BatchDuration), { 42 });
/// assert_eq!(written, 42);
/// ```
#[macro_export]
macro_rules! metric {
    // counter increment, skipped for zero
    (counter($id:expr) += $value:expr $(, $($k:ident).* = $v:expr)* $(,)?) => {
        match $value {
            0 => {}
            value => $crate::with_client(|client| {
                use $crate::_pred::*;
                client.send_metric(
                    client.count_with_tags(&$crate::CounterMetric::name(&$id), value)
                        $(.with_tag(stringify!($($k).*), $v))*
                )
            }),
        }
    };

    // gauge set
    (gauge($id:expr) = $value:expr $(, $($k:ident).* = $v:expr)* $(,)?) => {
        $crate::with_client(|client| {
            use $crate::_pred::*;
            client.send_metric(
                client.gauge_with_tags(&$crate::GaugeMetric::name(&$id), $value)
                    $(.with_tag(stringify!($($k).*), $v))*
            )
        })
    };

    // distribution
    (distribution($id:expr) = $value:expr $(, $($k:ident).* = $v:expr)* $(,)?) => {
        $crate::with_client(|client| {
            use $crate::_pred::*;
            client.send_metric(
                client.distribution_with_tags(&$crate::DistributionMetric::name(&$id), $value)
                    $(.with_tag(stringify!($($k).*), $v))*
            )
        })
    };

    // elapsed duration, reported as a distribution in milliseconds
    (timer($id:expr) = $value:expr $(, $($k:ident).* = $v:expr)* $(,)?) => {
        $crate::with_client(|client| {
            use $crate::_pred::*;
            let millis = ::std::time::Duration::as_secs_f64(&$value) * 1000.0;
            client.send_metric(
                client.distribution_with_tags(&$crate::TimerMetric::name(&$id), millis)
                    $(.with_tag(stringify!($($k).*), $v))*
            )
        })
    };

    // timed block
    (timer($id:expr), $($($k:ident).* = $v:expr,)* $block:block) => {{
        let started = ::std::time::Instant::now();
        let value = $block;
        $crate::metric!(timer($id) = started.elapsed() $(, $($k).* = $v)*);
        value
    }};
}
