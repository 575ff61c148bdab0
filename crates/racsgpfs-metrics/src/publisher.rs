//! Metric publisher — the per-scrape collect step.
//!
//! Holds the fixed gauge descriptors and the configured quota sources.
//! Nothing is cached between scrapes: every call to
//! [`MetricPublisher::collect`] runs every source again.

use std::time::Instant;

use tracing::{debug, error, warn};

use racsgpfs_quota::{LabelScheme, QuotaRecord, QuotaSource};

use crate::sink::{MetricDesc, MetricSink};

/// Outcome of one scrape, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub records: usize,
    pub samples: usize,
    pub samples_skipped: usize,
}

/// Publishes quota records as size, quota and inode gauges.
#[derive(Debug)]
pub struct MetricPublisher {
    size_gb: MetricDesc,
    quota_gb: MetricDesc,
    inodes: MetricDesc,
    labels: LabelScheme,
    sources: Vec<QuotaSource>,
}

impl MetricPublisher {
    /// Declare the gauge families once, under `namespace`.
    pub fn new(namespace: &str, labels: LabelScheme, sources: Vec<QuotaSource>) -> Self {
        let label_names: &[&'static str] = match labels {
            LabelScheme::NameAndCategory => &["name", "category"],
            LabelScheme::Name => &["name"],
        };
        Self {
            size_gb: MetricDesc::gauge(
                format!("{namespace}_size_gb"),
                "Current size in GB",
                label_names,
            ),
            quota_gb: MetricDesc::gauge(
                format!("{namespace}_quota_gb"),
                "Current quota in GB",
                label_names,
            ),
            inodes: MetricDesc::gauge(
                format!("{namespace}_inodes"),
                "Current inode count",
                label_names,
            ),
            labels,
            sources,
        }
    }

    /// The fixed descriptor set: size, quota, inodes.
    pub fn descriptors(&self) -> [&MetricDesc; 3] {
        [&self.size_gb, &self.quota_gb, &self.inodes]
    }

    pub fn sources(&self) -> &[QuotaSource] {
        &self.sources
    }

    /// Run every source and emit three samples per record.
    ///
    /// A failing source is logged and skipped; the others still publish.
    pub async fn collect<S: MetricSink + Send>(&self, sink: &mut S) -> ScrapeSummary {
        let started = Instant::now();
        let mut summary = ScrapeSummary::default();

        for desc in self.descriptors() {
            sink.describe(desc);
        }

        for source in &self.sources {
            match source.collect().await {
                Ok(records) => {
                    summary.sources_ok += 1;
                    summary.records += records.len();
                    for record in &records {
                        self.emit_record(sink, record, &mut summary);
                    }
                }
                Err(e) => {
                    summary.sources_failed += 1;
                    error!(source = %source.name(), error = %e, "quota source failed");
                }
            }
        }

        debug!(
            sources_ok = summary.sources_ok,
            sources_failed = summary.sources_failed,
            records = summary.records,
            samples = summary.samples,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scrape complete"
        );
        summary
    }

    /// Emit the size, quota and inode samples for one record.
    pub fn emit_record<S: MetricSink>(
        &self,
        sink: &mut S,
        record: &QuotaRecord,
        summary: &mut ScrapeSummary,
    ) {
        let category = record.category().map(|c| c.as_str()).unwrap_or("");
        let name_and_category = [record.name(), category];
        let label_values: &[&str] = match self.labels {
            LabelScheme::NameAndCategory => &name_and_category,
            LabelScheme::Name => &name_and_category[..1],
        };

        let samples = [
            (&self.size_gb, record.size_used_gb()),
            (&self.quota_gb, record.quota_gb()),
            (&self.inodes, record.inode_count()),
        ];
        for (desc, value) in samples {
            match sink.emit(desc, label_values, value) {
                Ok(()) => summary.samples += 1,
                Err(e) => {
                    summary.samples_skipped += 1;
                    warn!(name = %record.name(), error = %e, "sample skipped");
                }
            }
        }
    }
}
