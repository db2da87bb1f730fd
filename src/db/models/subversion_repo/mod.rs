use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{any::AnyRow, FromRow, Row};

use super::flag;

pub mod manager;

/// Trait for managing Subversion repositories.
#[async_trait]
pub trait Manager {
    /// Find all repositories belonging to any of the given collectors.
    async fn find_by_collector_ids(
        &self,
        collector_ids: &[String],
    ) -> anyhow::Result<Vec<SubversionRepo>>;
    /// Find the enabled repositories of a collector.
    async fn find_enabled(&self, collector_id: &str) -> anyhow::Result<Vec<SubversionRepo>>;
    /// Find a repository by id.
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<SubversionRepo>>;
    /// Insert or update a repository. The stored watermark never moves backwards.
    async fn save(&self, repo: &SubversionRepo) -> anyhow::Result<()>;
}

/// Trait for managing transactional Subversion repositories.
#[async_trait]
pub trait TxManager {
    /// Insert or update a batch of repositories.
    async fn save_bulk(&mut self, repos: &[SubversionRepo]) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Model for a tracked Subversion repository.
pub struct SubversionRepo {
    /// Repository identifier, derived from the collector id and url.
    /// Dashboard components reference the repository by this id.
    pub id: String,
    /// Foreign key reference to the owning collector.
    pub collector_id: String,
    /// Subversion url of the repository, e.g. `https://svn.example.com/repos/app/trunk`.
    pub url: String,
    /// Only enabled repositories are polled.
    pub enabled: bool,
    /// Highest revision already collected (the watermark).
    pub latest_revision: i64,
}

impl FromRow<'_, AnyRow> for SubversionRepo {
    fn from_row(row: &AnyRow) -> anyhow::Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            collector_id: row.try_get("collector_id")?,
            url: row.try_get("url")?,
            enabled: flag(row.try_get("enabled")?),
            latest_revision: row.try_get("latest_revision")?,
        })
    }
}

impl SubversionRepo {
    /// Create a new enabled repository with no collected revisions.
    #[must_use]
    pub const fn new(id: String, collector_id: String, url: String) -> Self {
        Self {
            id,
            collector_id,
            url,
            enabled: true,
            latest_revision: 0,
        }
    }

    /// Raise the watermark to `revision` if it is ahead of the current one.
    ///
    /// Returns whether the watermark moved.
    pub fn advance_watermark(&mut self, revision: i64) -> bool {
        if revision > self.latest_revision {
            self.latest_revision = revision;
            true
        } else {
            false
        }
    }
}
