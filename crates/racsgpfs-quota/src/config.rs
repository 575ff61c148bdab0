//! Quota source configuration (TOML).
//!
//! Each `[[source]]` table describes one report view. Without a config
//! file the exporter runs [`QuotaConfig::default`], a single whole-report
//! view of `fs1`.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::filter::LineFilter;
use crate::parser::{Column, ColumnMap, Delimiter, LineFormat, NumericPolicy};
use crate::source::QuotaSource;
use crate::types::Category;

pub const DEFAULT_NAMESPACE: &str = "racsgpfs";
pub const DEFAULT_PROGRAM: &str = "/usr/lpp/mmfs/bin/mmrepquota";
pub const DEFAULT_TIMEOUT: &str = "30s";

/// Label set attached to every gauge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelScheme {
    /// `{name, category}` — sources multiplex categories.
    #[default]
    NameAndCategory,
    /// `{name}` — the category is fixed by the deployment.
    Name,
}

/// Top-level exporter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaConfig {
    /// Metric name prefix.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub labels: LabelScheme,
    #[serde(rename = "source", default)]
    pub sources: Vec<SourceConfig>,
}

/// One `[[source]]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Duration string: "30s", "500ms", "2m".
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// A single character, or "whitespace".
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub numeric: NumericPolicy,
    /// Category for every row, when the report has no category column.
    #[serde(default)]
    pub category: Option<Category>,
    pub columns: ColumnMap,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_timeout() -> String {
    DEFAULT_TIMEOUT.to_string()
}

fn default_delimiter() -> String {
    "|".to_string()
}

impl Default for QuotaConfig {
    /// Whole `fs1` report: fileset and user rows, group rows and the
    /// header lines dropped.
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            labels: LabelScheme::NameAndCategory,
            sources: vec![SourceConfig {
                name: "fs1".to_string(),
                program: DEFAULT_PROGRAM.to_string(),
                args: vec!["--block-size".into(), "g".into(), "fs1".into()],
                timeout: default_timeout(),
                delimiter: "whitespace".to_string(),
                include: vec![],
                exclude: vec!["GRP".into(), "Block Limits".into(), "in_doubt".into()],
                numeric: NumericPolicy::Reject,
                category: None,
                columns: ColumnMap {
                    name: Column::Index(0),
                    size: Column::Index(3),
                    quota: Column::Index(4),
                    inodes: Column::After {
                        after: "|".to_string(),
                        offset: 0,
                    },
                    category: Some(Column::Index(2)),
                    columns: None,
                },
            }],
        }
    }
}

impl QuotaConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: QuotaConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !is_metric_name(&self.namespace) {
            return Err(ConfigError::Invalid {
                source_name: "-".to_string(),
                message: format!("namespace {:?} is not a valid metric name", self.namespace),
            });
        }
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.name.as_str()) {
                return Err(ConfigError::DuplicateSource(source.name.clone()));
            }
            source.validate()?;
        }
        Ok(())
    }

    /// Build runnable sources, in configuration order.
    pub fn build_sources(&self) -> ConfigResult<Vec<QuotaSource>> {
        self.sources.iter().map(SourceConfig::build).collect()
    }
}

impl SourceConfig {
    fn invalid(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::Invalid {
            source_name: self.name.clone(),
            message: message.into(),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("source name must not be empty"));
        }
        if self.program.trim().is_empty() {
            return Err(self.invalid("program must not be empty"));
        }
        if self.category.is_some() && self.columns.category.is_some() {
            return Err(self.invalid("set either a fixed category or a category column, not both"));
        }
        if let Some(exact) = self.columns.columns {
            if exact < self.columns.min_columns() {
                return Err(self.invalid(format!(
                    "columns = {exact} does not cover fixed index {}",
                    self.columns.min_columns() - 1
                )));
            }
        }
        let map = &self.columns;
        let empty_marker = [&map.name, &map.size, &map.quota, &map.inodes]
            .into_iter()
            .chain(map.category.as_ref())
            .any(|c| matches!(c, Column::After { after, .. } if after.is_empty()));
        if empty_marker {
            return Err(self.invalid("column marker `after` must not be empty"));
        }
        self.delimiter.parse::<Delimiter>().map_err(|e| self.invalid(e))?;
        self.timeout()?;
        Ok(())
    }

    pub fn timeout(&self) -> ConfigResult<Duration> {
        match parse_duration(&self.timeout) {
            Some(d) if !d.is_zero() => Ok(d),
            _ => Err(self.invalid(format!("invalid timeout {:?}", self.timeout))),
        }
    }

    pub fn build(&self) -> ConfigResult<QuotaSource> {
        self.validate()?;
        let delimiter = self.delimiter.parse::<Delimiter>().map_err(|e| self.invalid(e))?;
        let format = LineFormat {
            delimiter,
            columns: self.columns.clone(),
            numeric: self.numeric,
        };
        let filter = LineFilter::new(self.include.clone(), self.exclude.clone());

        Ok(QuotaSource::new(
            self.name.clone(),
            self.program.clone(),
            self.args.clone(),
            self.timeout()?,
            filter,
            format,
        )
        .with_category(self.category))
    }
}

/// Timeout strings: "500ms", "30s", "2m", or bare seconds. Values that
/// overflow a millisecond count are rejected.
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (amount, millis_per_unit) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000)
    } else {
        (s, 1_000)
    };
    amount
        .trim()
        .parse::<u64>()
        .ok()?
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
}

fn is_metric_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
