//! Manager for the Subversion repository model.
use crate::db::{models::flag_value, DatabaseConnection, DatabaseKind, DatabaseTransaction};
use async_trait::async_trait;

use super::SubversionRepo;

/// Upsert used by both the single and the bulk save.
/// The watermark column only ever takes the larger of the stored and the incoming revision.
const fn upsert_statement(kind: &DatabaseKind) -> &'static str {
    match *kind {
        DatabaseKind::Sqlite => {
            "
            INSERT INTO subversion_repo ( id, collector_id, url, enabled, latest_revision )
            VALUES ( $1, $2, $3, $4, $5 )
            ON CONFLICT ( id ) DO UPDATE SET
                collector_id = excluded.collector_id,
                url = excluded.url,
                enabled = excluded.enabled,
                latest_revision = MAX(subversion_repo.latest_revision, excluded.latest_revision)
            "
        }
        DatabaseKind::Postgres => {
            "
            INSERT INTO subversion_repo ( id, collector_id, url, enabled, latest_revision )
            VALUES ( $1, $2, $3, $4, $5 )
            ON CONFLICT ( id ) DO UPDATE SET
                collector_id = excluded.collector_id,
                url = excluded.url,
                enabled = excluded.enabled,
                latest_revision = GREATEST(subversion_repo.latest_revision, excluded.latest_revision)
            "
        }
    }
}

#[async_trait]
impl super::Manager for DatabaseConnection {
    /// Find all repositories for the given collectors, ordered by url.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn find_by_collector_ids(
        &self,
        collector_ids: &[String],
    ) -> anyhow::Result<Vec<SubversionRepo>> {
        let statement = "
            SELECT id, collector_id, url, enabled, latest_revision
            FROM subversion_repo
            WHERE collector_id = $1
            ORDER BY url
        ";
        let mut connection = self.pool.acquire().await?;
        let mut repos = Vec::new();
        for collector_id in collector_ids {
            let rows = sqlx::query_as::<_, SubversionRepo>(statement)
                .bind(collector_id)
                .fetch_all(&mut *connection)
                .await?;
            repos.extend(rows);
        }
        Ok(repos)
    }

    /// Find the enabled repositories of a collector, ordered by url.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn find_enabled(&self, collector_id: &str) -> anyhow::Result<Vec<SubversionRepo>> {
        let statement = "
            SELECT id, collector_id, url, enabled, latest_revision
            FROM subversion_repo
            WHERE collector_id = $1 AND enabled = 1
            ORDER BY url
        ";
        let mut connection = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, SubversionRepo>(statement)
            .bind(collector_id)
            .fetch_all(&mut *connection)
            .await?;
        Ok(rows)
    }

    /// Find one repository by id.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<SubversionRepo>> {
        let statement = "
            SELECT id, collector_id, url, enabled, latest_revision
            FROM subversion_repo
            WHERE id = $1
        ";
        let mut connection = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, SubversionRepo>(statement)
            .bind(id)
            .fetch_optional(&mut *connection)
            .await?;
        Ok(row)
    }

    /// Upsert a repository.
    ///
    /// # Errors
    /// Errors if the repository cannot be written to the database.
    async fn save(&self, repo: &SubversionRepo) -> anyhow::Result<()> {
        let mut connection = self.pool.acquire().await?;
        sqlx::query(upsert_statement(&self.kind))
            .bind(&repo.id)
            .bind(&repo.collector_id)
            .bind(&repo.url)
            .bind(flag_value(repo.enabled))
            .bind(repo.latest_revision)
            .execute(&mut *connection)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl super::TxManager for DatabaseTransaction {
    /// Upsert a batch of repositories within the transaction.
    ///
    /// # Errors
    /// Errors if any repository cannot be written.
    async fn save_bulk(&mut self, repos: &[SubversionRepo]) -> anyhow::Result<()> {
        let statement = upsert_statement(&self.kind);
        for repo in repos {
            sqlx::query(statement)
                .bind(&repo.id)
                .bind(&repo.collector_id)
                .bind(&repo.url)
                .bind(flag_value(repo.enabled))
                .bind(repo.latest_revision)
                .execute(&mut *self.tx)
                .await?;
        }
        Ok(())
    }
}
