//! Quota sources — one view of the quota report.
//!
//! A source runs its report command directly (never through a shell),
//! filters the output and parses what is left. A failure stays scoped to
//! the source; sibling sources are unaffected.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::CommandFailure;
use crate::filter::LineFilter;
use crate::parser::{LineFormat, try_parse_line};
use crate::types::{Category, QuotaRecord};

/// Longest stderr excerpt carried in a [`CommandFailure::Exit`].
const STDERR_EXCERPT_LEN: usize = 512;

/// A configured report view: command, line filter and column layout.
#[derive(Debug, Clone)]
pub struct QuotaSource {
    name: String,
    program: String,
    args: Vec<String>,
    timeout: Duration,
    filter: LineFilter,
    format: LineFormat,
    category: Option<Category>,
}

impl QuotaSource {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        args: Vec<String>,
        timeout: Duration,
        filter: LineFilter,
        format: LineFormat,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
            timeout,
            filter,
            format,
            category: None,
        }
    }

    /// Tag every record with `category` unless the line format carries one.
    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the report and parse its output.
    ///
    /// A command that succeeds without a single parseable line yields an
    /// empty set, not an error.
    pub async fn collect(&self) -> Result<Vec<QuotaRecord>, CommandFailure> {
        let stdout = self.run().await?;
        let records = self.parse_output(&stdout);
        debug!(source = %self.name, records = records.len(), "quota report parsed");
        Ok(records)
    }

    /// Filter and parse report text, keeping emission order.
    pub fn parse_output(&self, output: &str) -> Vec<QuotaRecord> {
        output
            .lines()
            .filter(|line| {
                let keep = self.filter.accepts(line);
                if !keep {
                    trace!(source = %self.name, %line, "line filtered");
                }
                keep
            })
            .filter_map(|line| match try_parse_line(line, &self.format) {
                Ok(record) => Some(record.with_default_category(self.category)),
                Err(reason) => {
                    debug!(source = %self.name, %line, ?reason, "line rejected");
                    None
                }
            })
            .collect()
    }

    async fn run(&self) -> Result<String, CommandFailure> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(source = %self.name, program = %self.program, args = ?self.args, "running quota report");

        let child = cmd.spawn().map_err(|error| CommandFailure::Spawn {
            source_name: self.name.clone(),
            program: self.program.clone(),
            error,
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(error)) => {
                return Err(CommandFailure::Io {
                    source_name: self.name.clone(),
                    program: self.program.clone(),
                    error,
                });
            }
            Err(_) => {
                return Err(CommandFailure::Timeout {
                    source_name: self.name.clone(),
                    program: self.program.clone(),
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CommandFailure::Exit {
                source_name: self.name.clone(),
                program: self.program.clone(),
                status: output.status,
                stderr: excerpt(stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn excerpt(s: &str) -> String {
    if s.len() <= STDERR_EXCERPT_LEN {
        return s.to_string();
    }
    let mut end = STDERR_EXCERPT_LEN;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
