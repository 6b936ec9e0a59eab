pub mod config;
pub mod record;
pub mod result_set;
pub mod run;

pub use config::{
    AdvanceConfig, Config, ConvergenceConfig, LoggingConfig, OutputConfig, RetryConfig,
};
pub use record::{IdentityKey, RawRecord, Record};
pub use result_set::{collapse_batch, MergeReport, ResultSet};
pub use run::{RunOutcome, RunReport, RunStats};
