use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{any::AnyRow, FromRow, Row};

use super::flag;

pub mod manager;

/// Trait for managing collectors.
#[async_trait]
pub trait Manager {
    /// Find a collector by its unique name.
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Collector>>;
    /// Create a collector. Does nothing if a collector with the same name exists.
    async fn create(&self, collector: &Collector) -> anyhow::Result<bool>;
    /// Record the time (unix millis) at which the collector last started a cycle.
    async fn update_last_executed(&self, id: &str, last_executed: i64) -> anyhow::Result<()>;
}

/// Kind of data a collector feeds into the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum CollectorType {
    /// Source control commits.
    #[serde(rename = "SCM")]
    Scm,
}

impl CollectorType {
    /// Name stored in the database and used as the key of component collector items.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scm => "SCM",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Model for a registered collector.
pub struct Collector {
    /// Collector identifier, derived from its name.
    pub id: String,
    /// Unique collector name, e.g. `Subversion`.
    pub name: String,
    /// Collector type as stored, e.g. `SCM`.
    pub collector_type: String,
    /// Disabled collectors skip their polling cycles.
    pub enabled: bool,
    /// Whether the collector reports itself as online.
    pub online: bool,
    /// Unix millis of the last cycle start, if any cycle ran yet.
    pub last_executed: Option<i64>,
}

impl FromRow<'_, AnyRow> for Collector {
    fn from_row(row: &AnyRow) -> anyhow::Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            collector_type: row.try_get("collector_type")?,
            enabled: flag(row.try_get("enabled")?),
            online: flag(row.try_get("online")?),
            last_executed: row.try_get::<Option<i64>, _>("last_executed")?,
        })
    }
}

impl Collector {
    /// Create a new enabled and online collector.
    #[must_use]
    pub fn new(id: String, name: String, collector_type: CollectorType) -> Self {
        Self {
            id,
            name,
            collector_type: collector_type.as_str().to_owned(),
            enabled: true,
            online: true,
            last_executed: None,
        }
    }
}
