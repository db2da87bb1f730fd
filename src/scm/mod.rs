//! Source control clients the collector fetches commits from.
use crate::db::models::{commit::Commit, subversion_repo::SubversionRepo};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod svn;

pub use svn::SvnClient;

/// Client for a Subversion server.
#[async_trait]
pub trait ScmClient: Send + Sync {
    /// Commits of `repo` from `start_revision` (inclusive) up to the head revision,
    /// in ascending revision order.
    async fn get_commits(
        &self,
        repo: &SubversionRepo,
        start_revision: i64,
    ) -> anyhow::Result<Vec<Commit>>;

    /// Revision that was the head of the repository at `url` at `date`.
    async fn get_revision_closest_to(&self, url: &str, date: DateTime<Utc>)
        -> anyhow::Result<i64>;
}
