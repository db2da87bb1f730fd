//! The collector module runs polling cycles against the tracked Subversion repositories.
/// Collector configuration.
pub mod config;
/// Registration of repositories and dashboard components.
pub mod registry;
/// Cron driven execution of cycles.
pub mod schedule;
/// Summary counters and the log lines reporting them.
pub mod summary;
/// The polling cycle itself.
pub mod task;

pub use summary::CollectionSummary;
pub use task::{CollectorTask, COLLECTOR_NAME};
