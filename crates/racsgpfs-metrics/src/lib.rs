//! racsgpfs-metrics — quota gauges for Prometheus.
//!
//! Maps quota records onto three gauge families and renders them in the
//! Prometheus text exposition format.
//!
//! # Architecture
//!
//! ```text
//! MetricPublisher
//!   ├── descriptors()  ← size / quota / inode gauges, fixed at startup
//!   └── collect()      ← per scrape: every QuotaSource → 3 samples per record
//!         └── MetricSink::emit()
//!
//! TextSink (MetricSink)
//!   └── render() → text/plain for the /metrics endpoint
//! ```

pub mod publisher;
pub mod sink;

pub use publisher::{MetricPublisher, ScrapeSummary};
pub use sink::{CONTENT_TYPE, EmissionError, MetricDesc, MetricSink, TextSink};
