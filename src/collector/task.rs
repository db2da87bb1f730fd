use crate::collector::summary::{log_banner, CollectionSummary};
use crate::db::models::collector::{self, Collector, CollectorType};
use crate::db::models::{commit, component, subversion_repo};
use crate::db::models::subversion_repo::SubversionRepo;
use crate::db::{DatabaseConnection, DatabaseTransaction, Tx};
use crate::scm::ScmClient;
use crate::utils::ids;
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::time::Instant;

/// Name under which the collector registers itself.
pub const COLLECTOR_NAME: &str = "Subversion";

/// The date `commit_threshold_days` days before `now`.
///
/// # Errors
/// Errors if the threshold reaches outside the representable date range.
pub fn threshold_date(
    now: DateTime<Utc>,
    commit_threshold_days: i64,
) -> anyhow::Result<DateTime<Utc>> {
    Duration::try_days(commit_threshold_days)
        .and_then(|threshold| now.checked_sub_signed(threshold))
        .with_context(|| {
            format!(
                "commit_threshold_days of {commit_threshold_days} reaches outside the supported date range"
            )
        })
}

/// Polls the enabled Subversion repositories of the collector and stores their new commits.
///
/// One task runs one cycle at a time. Nothing here guards against two tasks polling the same
/// repository concurrently beyond the unique index the commit store inserts against.
pub struct CollectorTask<S> {
    /// Datastore holding collectors, repositories, commits and components.
    conn: DatabaseConnection,
    /// Client the commits are fetched with.
    scm: S,
    /// How many days back from now a fetch window may start.
    commit_threshold_days: i64,
}

impl<S: ScmClient> CollectorTask<S> {
    /// Create a task polling through `scm` and storing into `conn`.
    #[must_use]
    pub const fn new(conn: DatabaseConnection, scm: S, commit_threshold_days: i64) -> Self {
        Self {
            conn,
            scm,
            commit_threshold_days,
        }
    }

    /// The collector record registered on first run.
    #[must_use]
    pub fn prototype() -> Collector {
        Collector::new(
            ids::collector_id(COLLECTOR_NAME),
            COLLECTOR_NAME.to_owned(),
            CollectorType::Scm,
        )
    }

    /// Find the collector record, creating it from [`Self::prototype`] if missing.
    ///
    /// # Errors
    /// Errors if the collector cannot be read or written.
    pub async fn register(&self) -> anyhow::Result<Collector> {
        if let Some(existing) = collector::Manager::find_by_name(&self.conn, COLLECTOR_NAME).await? {
            return Ok(existing);
        }
        let prototype = Self::prototype();
        if collector::Manager::create(&self.conn, &prototype).await? {
            tracing::info!(id = %prototype.id, "Registered collector {}", prototype.name);
        }
        collector::Manager::find_by_name(&self.conn, COLLECTOR_NAME)
            .await?
            .context("collector missing right after registration")
    }

    /// Run one scheduled cycle: register, skip if the collector is disabled, stamp the start
    /// time and collect.
    ///
    /// Returns `None` when the collector is disabled.
    ///
    /// # Errors
    /// Errors with the first fetch, parse or persistence failure of the cycle.
    pub async fn run(&self) -> anyhow::Result<Option<CollectionSummary>> {
        let collector = self.register().await?;
        if !collector.enabled {
            tracing::info!("Collector {} is disabled, skipping cycle", collector.name);
            return Ok(None);
        }
        collector::Manager::update_last_executed(
            &self.conn,
            &collector.id,
            Utc::now().timestamp_millis(),
        )
        .await?;
        let summary = self.collect(&collector).await?;
        Ok(Some(summary))
    }

    /// Enable exactly the repositories of `collector` that some dashboard component references
    /// under the `SCM` collector type, and disable all others. No repository is deleted.
    ///
    /// # Errors
    /// Errors if components or repositories cannot be read, or the repositories cannot be saved.
    pub async fn clean(&self, collector: &Collector) -> anyhow::Result<()> {
        let scm_type = CollectorType::Scm.as_str();
        let mut referenced: HashSet<String> = HashSet::new();
        for comp in component::Manager::find_all(&self.conn).await? {
            for item in comp.collector_items_of(scm_type) {
                if item.collector_id == collector.id {
                    referenced.insert(item.id.clone());
                }
            }
        }

        let repos: Vec<SubversionRepo> = subversion_repo::Manager::find_by_collector_ids(
            &self.conn,
            &[collector.id.clone()],
        )
        .await?
        .into_iter()
        .map(|mut repo| {
            repo.enabled = referenced.contains(&repo.id);
            repo
        })
        .collect();
        tracing::debug!(
            repos = repos.len(),
            in_use = repos.iter().filter(|repo| repo.enabled).count(),
            "Cleaned repositories"
        );

        let mut tx = DatabaseTransaction::begin(&self.conn).await?;
        match subversion_repo::TxManager::save_bulk(&mut tx, &repos).await {
            Ok(()) => tx.commit().await,
            Err(err) => {
                tx.rollback().await?;
                Err(err)
            }
        }
    }

    /// Lower bound of the fetch window of `repo`: the revision closest to `commit_threshold_days`
    /// days ago, or the watermark if that is further ahead.
    ///
    /// # Errors
    /// Errors if the dated revision cannot be resolved.
    pub async fn start_revision(&self, repo: &SubversionRepo) -> anyhow::Result<i64> {
        let revision_date = threshold_date(Utc::now(), self.commit_threshold_days)?;
        let revision_limit = self
            .scm
            .get_revision_closest_to(&repo.url, revision_date)
            .await?;
        Ok(revision_limit.max(repo.latest_revision))
    }

    /// Run one polling cycle for `collector`.
    ///
    /// Commits and watermarks are saved as the cycle goes, so a failure leaves the work done
    /// before it in place and the next cycle resumes from the last saved watermark.
    ///
    /// # Errors
    /// Errors with the first fetch, parse or persistence failure.
    pub async fn collect(&self, collector: &Collector) -> anyhow::Result<CollectionSummary> {
        log_banner("Starting...");
        let start = Instant::now();
        let mut summary = CollectionSummary::default();

        self.clean(collector).await?;
        for mut repo in subversion_repo::Manager::find_enabled(&self.conn, &collector.id).await? {
            let start_revision = self.start_revision(&repo).await?;
            let commits = self
                .scm
                .get_commits(&repo, start_revision)
                .await
                .with_context(|| format!("failed to fetch commits of {}", repo.url))?;
            tracing::debug!(
                url = %repo.url,
                start_revision,
                fetched = commits.len(),
                "Fetched commits"
            );
            summary.commit_count += self.save_new_commits(&mut repo, commits).await?;
            subversion_repo::Manager::save(&self.conn, &repo).await?;
            summary.repo_count += 1;
        }

        summary.elapsed = start.elapsed();
        summary.log();
        Ok(summary)
    }

    /// Store the commits `repo` does not have yet, advancing its in-memory watermark.
    ///
    /// Returns the number of commits stored.
    async fn save_new_commits(
        &self,
        repo: &mut SubversionRepo,
        commits: Vec<commit::Commit>,
    ) -> anyhow::Result<usize> {
        let mut saved = 0;
        for mut new_commit in commits {
            let revision = new_commit.revision()?;
            new_commit.collector_item_id.clone_from(&repo.id);
            if commit::Manager::create_if_absent(&self.conn, &new_commit).await? {
                saved += 1;
                repo.advance_watermark(revision);
            }
        }
        Ok(saved)
    }
}
