use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod manager;

/// Trait for managing commits.
#[async_trait]
pub trait Manager {
    /// Find the commit of a repository by revision number. `None` if it was never collected.
    async fn find_by_collector_item_and_revision(
        &self,
        collector_item_id: &str,
        scm_revision_number: &str,
    ) -> anyhow::Result<Option<Commit>>;
    /// Insert a commit unless one with the same repository and revision exists.
    ///
    /// Returns whether a new row was written. This is the only duplicate guard of the collector:
    /// it is backed by a unique index on `( collector_item_id, scm_revision_number )`.
    async fn create_if_absent(&self, commit: &Commit) -> anyhow::Result<bool>;
    /// Find all commits of a repository ordered by timestamp.
    async fn find_all_by_collector_item(
        &self,
        collector_item_id: &str,
    ) -> anyhow::Result<Vec<Commit>>;
    /// Number of commits collected for a repository.
    async fn count_by_collector_item(&self, collector_item_id: &str) -> anyhow::Result<i64>;
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Model for a normalized source control commit.
pub struct Commit {
    /// Foreign key reference to the repository the commit was collected from.
    /// Empty until the collector attaches the commit to its repository.
    pub collector_item_id: String,
    /// Url of the repository the commit belongs to.
    pub scm_url: String,
    /// Subversion revision number, kept as the numeric string reported by the server.
    pub scm_revision_number: String,
    /// Author of the commit. Empty for anonymous commits.
    pub scm_author: String,
    /// Commit message.
    pub scm_commit_log: String,
    /// Unix millis of the commit.
    pub scm_commit_timestamp: i64,
    /// Number of paths touched by the commit.
    pub num_files_changed: i64,
}

impl Commit {
    /// Create a commit not yet attached to a repository.
    #[must_use]
    pub const fn new(
        scm_url: String,
        scm_revision_number: String,
        scm_author: String,
        scm_commit_log: String,
        scm_commit_timestamp: i64,
        num_files_changed: i64,
    ) -> Self {
        Self {
            collector_item_id: String::new(),
            scm_url,
            scm_revision_number,
            scm_author,
            scm_commit_log,
            scm_commit_timestamp,
            num_files_changed,
        }
    }

    /// Revision number as an integer.
    ///
    /// # Errors
    /// Errors if the server reported a revision that is not a number.
    pub fn revision(&self) -> anyhow::Result<i64> {
        self.scm_revision_number.trim().parse::<i64>().map_err(|err| {
            anyhow::anyhow!(
                "invalid revision number `{}` for {}: {err}",
                self.scm_revision_number,
                self.scm_url
            )
        })
    }
}
