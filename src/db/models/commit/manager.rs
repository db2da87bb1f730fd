//! Manager for the commit model.
use crate::db::DatabaseConnection;
use async_trait::async_trait;

use super::Commit;

#[async_trait]
impl super::Manager for DatabaseConnection {
    /// Find a commit by repository and revision number.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn find_by_collector_item_and_revision(
        &self,
        collector_item_id: &str,
        scm_revision_number: &str,
    ) -> anyhow::Result<Option<Commit>> {
        let statement = "
            SELECT collector_item_id, scm_url, scm_revision_number, scm_author,
                   scm_commit_log, scm_commit_timestamp, num_files_changed
            FROM scm_commit
            WHERE collector_item_id = $1 AND scm_revision_number = $2
            LIMIT 1
        ";
        let mut connection = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, Commit>(statement)
            .bind(collector_item_id)
            .bind(scm_revision_number)
            .fetch_optional(&mut *connection)
            .await?;
        Ok(row)
    }

    /// Insert a commit, ignoring it if the repository already has that revision.
    ///
    /// # Errors
    /// Errors if the commit cannot be inserted.
    async fn create_if_absent(&self, commit: &Commit) -> anyhow::Result<bool> {
        let statement = "
            INSERT INTO scm_commit ( collector_item_id, scm_url, scm_revision_number, scm_author,
                                     scm_commit_log, scm_commit_timestamp, num_files_changed )
            VALUES ( $1, $2, $3, $4, $5, $6, $7 )
            ON CONFLICT ( collector_item_id, scm_revision_number ) DO NOTHING
        ";
        let mut connection = self.pool.acquire().await?;
        let result = sqlx::query(statement)
            .bind(&commit.collector_item_id)
            .bind(&commit.scm_url)
            .bind(&commit.scm_revision_number)
            .bind(&commit.scm_author)
            .bind(&commit.scm_commit_log)
            .bind(commit.scm_commit_timestamp)
            .bind(commit.num_files_changed)
            .execute(&mut *connection)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find all commits of a repository.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn find_all_by_collector_item(
        &self,
        collector_item_id: &str,
    ) -> anyhow::Result<Vec<Commit>> {
        let statement = "
            SELECT collector_item_id, scm_url, scm_revision_number, scm_author,
                   scm_commit_log, scm_commit_timestamp, num_files_changed
            FROM scm_commit
            WHERE collector_item_id = $1
            ORDER BY scm_commit_timestamp, id
        ";
        let mut connection = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, Commit>(statement)
            .bind(collector_item_id)
            .fetch_all(&mut *connection)
            .await?;
        Ok(rows)
    }

    /// Count the commits of a repository.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn count_by_collector_item(&self, collector_item_id: &str) -> anyhow::Result<i64> {
        let statement = "
            SELECT COUNT(*)
            FROM scm_commit
            WHERE collector_item_id = $1
        ";
        let mut connection = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, (i64,)>(statement)
            .bind(collector_item_id)
            .fetch_one(&mut *connection)
            .await?;
        Ok(row.0)
    }
}
