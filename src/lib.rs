//! Transcript Harvest - complete transcripts from lazily rendered views
//!
//! A virtualized list only renders the rows near its viewport, and rows at
//! the edge of the viewport may still be filling in. This crate repeatedly
//! samples such a view, advances it, and reconciles every observation into a
//! single de-duplicated transcript keyed by (speaker, timestamp), keeping the
//! longest content seen for each utterance. The run ends once sustained
//! sampling stops producing anything new.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): records, the result set, configuration,
//!   run outcomes and the port traits
//! - **Application Layer** (`application`): reconciler, change fingerprint,
//!   advance intensity and the convergence controller
//! - **Infrastructure Layer** (`infrastructure`): config loading, logging,
//!   persistence, retry policy and snapshot source adapters
//! - **CLI Layer** (`cli`): the `harvest` command-line interface
//!
//! # Example
//!
//! ```no_run
//! use transcript_harvest::infrastructure::persistence::{load_transcript, JsonFileSink};
//! use transcript_harvest::infrastructure::sources::VirtualListSource;
//! use transcript_harvest::{run, Config};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let rows = load_transcript(std::path::Path::new("meeting.json"))?;
//! let source = VirtualListSource::new(rows, 12, 48);
//! let sink = JsonFileSink::new("harvested.json");
//!
//! let report = run(source, sink, &Config::default()).await?;
//! println!("{} records, {}", report.records.len(), report.outcome);
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use application::{run, ConvergenceController, CycleSummary, Decision, Reconciler};
pub use domain::errors::{HarvestError, HarvestResult, SourceError};
pub use domain::models::{
    Config, IdentityKey, MergeReport, RawRecord, Record, ResultSet, RunOutcome, RunReport,
    RunStats,
};
pub use domain::ports::{SnapshotSource, TranscriptSink};
pub use infrastructure::config::{ConfigError, ConfigLoader};
