//! Prometheus text exposition format.
//!
//! [`MetricSink`] is the boundary the publisher writes through;
//! [`TextSink`] collects samples for one scrape and renders them as
//! `text/plain; version=0.0.4`.

use std::fmt::Write as _;

use thiserror::Error;

/// Content type of [`TextSink::render`] output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// A gauge family: name, help text and label names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: String,
    pub help: String,
    pub label_names: Vec<&'static str>,
}

impl MetricDesc {
    pub fn gauge(name: impl Into<String>, help: impl Into<String>, labels: &[&'static str]) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            label_names: labels.to_vec(),
        }
    }
}

/// A sample could not be built. Skips the sample, never the scrape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmissionError {
    #[error("{metric}: expected {expected} label values, got {got}")]
    LabelArity {
        metric: String,
        expected: usize,
        got: usize,
    },

    #[error("{metric}: value is not finite")]
    NonFinite { metric: String },

    #[error("{metric}: metric was not described")]
    Undescribed { metric: String },
}

/// Receives gauge descriptors and samples for one scrape.
pub trait MetricSink {
    /// Declare a family. Repeated declarations of the same name are ignored.
    fn describe(&mut self, desc: &MetricDesc);

    /// Record one sample. `label_values` follow `desc.label_names`.
    fn emit(&mut self, desc: &MetricDesc, label_values: &[&str], value: f64)
    -> Result<(), EmissionError>;
}

struct Family {
    desc: MetricDesc,
    samples: Vec<(Vec<String>, f64)>,
}

/// In-memory sink rendering the Prometheus text format.
#[derive(Default)]
pub struct TextSink {
    families: Vec<Family>,
}

impl TextSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total samples recorded across all families.
    pub fn sample_count(&self) -> usize {
        self.families.iter().map(|f| f.samples.len()).sum()
    }

    /// Render families in declaration order. Families without samples
    /// still get their HELP and TYPE lines.
    pub fn render(&self) -> String {
        let mut out = String::new();

        for family in &self.families {
            let desc = &family.desc;
            let _ = writeln!(out, "# HELP {} {}", desc.name, escape_help(&desc.help));
            let _ = writeln!(out, "# TYPE {} gauge", desc.name);

            for (values, value) in &family.samples {
                out.push_str(&desc.name);
                if !values.is_empty() {
                    out.push('{');
                    for (i, (label, v)) in desc.label_names.iter().zip(values).enumerate() {
                        if i > 0 {
                            out.push(',');
                        }
                        let _ = write!(out, "{label}=\"{}\"", escape_label_value(v));
                    }
                    out.push('}');
                }
                let _ = writeln!(out, " {value}");
            }
        }

        out
    }
}

impl MetricSink for TextSink {
    fn describe(&mut self, desc: &MetricDesc) {
        if self.families.iter().any(|f| f.desc.name == desc.name) {
            return;
        }
        self.families.push(Family {
            desc: desc.clone(),
            samples: Vec::new(),
        });
    }

    fn emit(
        &mut self,
        desc: &MetricDesc,
        label_values: &[&str],
        value: f64,
    ) -> Result<(), EmissionError> {
        if label_values.len() != desc.label_names.len() {
            return Err(EmissionError::LabelArity {
                metric: desc.name.clone(),
                expected: desc.label_names.len(),
                got: label_values.len(),
            });
        }
        if !value.is_finite() {
            return Err(EmissionError::NonFinite {
                metric: desc.name.clone(),
            });
        }
        let family = self
            .families
            .iter_mut()
            .find(|f| f.desc.name == desc.name)
            .ok_or_else(|| EmissionError::Undescribed {
                metric: desc.name.clone(),
            })?;

        family
            .samples
            .push((label_values.iter().map(|v| v.to_string()).collect(), value));
        Ok(())
    }
}

fn escape_help(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
