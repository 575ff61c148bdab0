//! Report line filter.
//!
//! Works on plain substrings, the same way `grep` / `grep -v` would.

use serde::{Deserialize, Serialize};

/// Keeps lines carrying a category marker and drops report boilerplate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineFilter {
    /// A line must contain at least one of these. Empty means keep all.
    #[serde(default)]
    pub include: Vec<String>,
    /// A line containing any of these is dropped.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl LineFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    /// Whether `line` should be handed to the parser.
    pub fn accepts(&self, line: &str) -> bool {
        let included =
            self.include.is_empty() || self.include.iter().any(|m| line.contains(m.as_str()));
        included && !self.exclude.iter().any(|m| line.contains(m.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let filter = LineFilter::default();
        assert!(filter.accepts("anything"));
        assert!(filter.accepts(""));
    }

    #[test]
    fn exclude_drops_header_banner() {
        let filter = LineFilter::new(vec![], strings(&["Block Limits", "in_doubt"]));
        assert!(!filter.accepts("                         Block Limits                                    |     File Limits"));
        assert!(!filter.accepts("Name  fileset  type  GB  quota  limit  in_doubt  grace"));
        assert!(filter.accepts("genomics root FILESET 512 1024 1024 0 none"));
    }

    #[test]
    fn include_requires_a_marker() {
        let filter = LineFilter::new(strings(&["FILESET", "USR"]), vec![]);
        assert!(filter.accepts("genomics root FILESET 512"));
        assert!(filter.accepts("alice root USR 3"));
        assert!(!filter.accepts("staff root GRP 7"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let filter = LineFilter::new(strings(&["FILESET"]), strings(&["GRP"]));
        assert!(!filter.accepts("*** Report for USR GRP FILESET quotas on fs1"));
    }

    #[test]
    fn markers_are_case_sensitive() {
        let filter = LineFilter::new(strings(&["FILESET"]), vec![]);
        assert!(!filter.accepts("genomics root fileset 512"));
    }
}
