//! racsgpfs-quota — quota sampling for GPFS filesystems.
//!
//! Runs the filesystem's quota report (`mmrepquota`), keeps the lines that
//! describe quota entities, and parses them into [`QuotaRecord`]s.
//!
//! # Architecture
//!
//! ```text
//! QuotaSource
//!   ├── run report command (no shell, bounded by timeout)
//!   ├── LineFilter::accepts()  ← include/exclude markers
//!   └── parse_line()           ← LineFormat (delimiter, ColumnMap, NumericPolicy)
//!         └── QuotaRecord
//! ```
//!
//! Everything after the command runs is a pure function of the report text,
//! so filtering and parsing are testable without a subprocess.

pub mod config;
pub mod error;
pub mod filter;
pub mod parser;
pub mod source;
pub mod types;

pub use config::{LabelScheme, QuotaConfig, SourceConfig};
pub use error::{CommandFailure, ConfigError, ConfigResult};
pub use filter::LineFilter;
pub use parser::{Column, ColumnMap, Delimiter, LineFormat, NumericPolicy, Rejection, parse_line};
pub use source::QuotaSource;
pub use types::*;
