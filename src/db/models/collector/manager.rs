//! Manager for the collector model.
use crate::db::{models::flag_value, DatabaseConnection};
use async_trait::async_trait;

use super::Collector;

#[async_trait]
impl super::Manager for DatabaseConnection {
    /// Find a collector by name.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Collector>> {
        let statement = "
            SELECT id, name, collector_type, enabled, online, last_executed
            FROM collector
            WHERE name = $1
            LIMIT 1
        ";
        let mut connection = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, Collector>(statement)
            .bind(name)
            .fetch_optional(&mut *connection)
            .await?;
        Ok(row)
    }

    /// Insert a collector unless one with the same name already exists.
    ///
    /// # Errors
    /// Errors if the collector cannot be inserted into the database.
    async fn create(&self, collector: &Collector) -> anyhow::Result<bool> {
        let statement = "
            INSERT INTO collector ( id, name, collector_type, enabled, online, last_executed )
            VALUES ( $1, $2, $3, $4, $5, $6 )
            ON CONFLICT DO NOTHING
        ";
        let mut connection = self.pool.acquire().await?;
        let result = sqlx::query(statement)
            .bind(&collector.id)
            .bind(&collector.name)
            .bind(&collector.collector_type)
            .bind(flag_value(collector.enabled))
            .bind(flag_value(collector.online))
            .bind(collector.last_executed)
            .execute(&mut *connection)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamp the start time of the latest cycle.
    ///
    /// # Errors
    /// Errors if the collector cannot be updated.
    async fn update_last_executed(&self, id: &str, last_executed: i64) -> anyhow::Result<()> {
        let statement = "
            UPDATE collector
            SET last_executed = $1
            WHERE id = $2
        ";
        let mut connection = self.pool.acquire().await?;
        sqlx::query(statement)
            .bind(last_executed)
            .bind(id)
            .execute(&mut *connection)
            .await?;
        Ok(())
    }
}
