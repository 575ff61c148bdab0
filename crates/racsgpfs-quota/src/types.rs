//! Domain types for quota sampling.
//!
//! A [`QuotaRecord`] is built once per report line and never mutated;
//! it lives only as long as the scrape that produced it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of quota-tracked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Fileset,
    Project,
    Home,
}

impl Category {
    /// Label value used in the exposition output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fileset => "fileset",
            Category::Project => "project",
            Category::Home => "home",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a report token is not a known category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown quota category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Case-insensitive. `USR` rows in the report are per-user home quotas.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fileset" => Ok(Category::Fileset),
            "project" | "prj" => Ok(Category::Project),
            "home" | "usr" => Ok(Category::Home),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// One quota entity as reported by a single scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaRecord {
    name: String,
    category: Option<Category>,
    size_used_gb: f64,
    quota_gb: f64,
    inode_count: f64,
}

impl QuotaRecord {
    /// Build a record. Callers are expected to have validated the values;
    /// the parser is the only producer outside of tests.
    pub fn new(
        name: impl Into<String>,
        category: Option<Category>,
        size_used_gb: f64,
        quota_gb: f64,
        inode_count: f64,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            size_used_gb,
            quota_gb,
            inode_count,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Space in use, in GiB.
    pub fn size_used_gb(&self) -> f64 {
        self.size_used_gb
    }

    /// Space limit in GiB. Zero usually means no limit is set.
    pub fn quota_gb(&self) -> f64 {
        self.quota_gb
    }

    pub fn inode_count(&self) -> f64 {
        self.inode_count
    }

    /// Returns a copy carrying `category` when none was parsed.
    pub(crate) fn with_default_category(mut self, category: Option<Category>) -> Self {
        if self.category.is_none() {
            self.category = category;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_report_tokens() {
        assert_eq!("FILESET".parse::<Category>().unwrap(), Category::Fileset);
        assert_eq!("USR".parse::<Category>().unwrap(), Category::Home);
        assert_eq!("project".parse::<Category>().unwrap(), Category::Project);
        assert_eq!(" Home ".parse::<Category>().unwrap(), Category::Home);
    }

    #[test]
    fn category_rejects_group_rows() {
        let err = "GRP".parse::<Category>().unwrap_err();
        assert_eq!(err, UnknownCategory("GRP".to_string()));
    }

    #[test]
    fn category_label_values() {
        assert_eq!(Category::Fileset.to_string(), "fileset");
        assert_eq!(Category::Project.as_str(), "project");
        assert_eq!(Category::Home.as_str(), "home");
    }

    #[test]
    fn default_category_does_not_override_parsed() {
        let parsed = QuotaRecord::new("a", Some(Category::Fileset), 1.0, 2.0, 3.0)
            .with_default_category(Some(Category::Home));
        assert_eq!(parsed.category(), Some(Category::Fileset));

        let unparsed = QuotaRecord::new("b", None, 1.0, 2.0, 3.0)
            .with_default_category(Some(Category::Project));
        assert_eq!(unparsed.category(), Some(Category::Project));
    }
}
