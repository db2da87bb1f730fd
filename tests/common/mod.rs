#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use svn_collector::collector::registry::{register_component, register_repository};
use svn_collector::collector::CollectorTask;
use svn_collector::db::init::connect_to;
use svn_collector::db::models::collector::Collector;
use svn_collector::db::models::commit::Commit;
use svn_collector::db::models::subversion_repo::{self, SubversionRepo};
use svn_collector::db::DatabaseConnection;
use svn_collector::scm::ScmClient;

pub const REPO_URL: &str = "https://svn.example.com/repos/app/trunk";
pub const OTHER_REPO_URL: &str = "svn://svn.example.com/tools";

/// Everything a collector test needs: a scratch directory holding the database, the task and
/// the fake SCM it polls.
pub struct TestCollector {
    pub dir: TempDir,
    pub conn: DatabaseConnection,
    pub scm: FakeScm,
    pub task: CollectorTask<FakeScm>,
}

pub async fn initialize_collector() -> TestCollector {
    let dir = tempfile::tempdir().unwrap();
    let conn = initialize_database(&dir).await;
    let scm = FakeScm::default();
    let task = CollectorTask::new(conn.clone(), scm.clone(), 15);
    TestCollector {
        dir,
        conn,
        scm,
        task,
    }
}

pub async fn initialize_database(dir: &TempDir) -> DatabaseConnection {
    let db_path = dir.path().join("db.sqlite3");
    connect_to(&format!("sqlite://{}?mode=rwc", db_path.to_string_lossy()))
        .await
        .unwrap()
}

impl TestCollector {
    pub async fn collector(&self) -> Collector {
        self.task.register().await.unwrap()
    }

    /// Register `url` with the given watermark and make a component use it.
    pub async fn add_used_repo(&self, url: &str, latest_revision: i64) -> SubversionRepo {
        let repo = self.add_repo(url, latest_revision).await;
        self.add_component(&format!("component of {url}"), &[url]).await;
        repo
    }

    /// Register `url` with the given watermark without any component using it.
    pub async fn add_repo(&self, url: &str, latest_revision: i64) -> SubversionRepo {
        let collector = self.collector().await;
        let mut repo = register_repository(&self.conn, &collector, url, true)
            .await
            .unwrap();
        repo.latest_revision = latest_revision;
        subversion_repo::Manager::save(&self.conn, &repo).await.unwrap();
        repo
    }

    pub async fn add_component(&self, name: &str, urls: &[&str]) {
        let collector = self.collector().await;
        let urls: Vec<String> = urls.iter().map(|url| (*url).to_owned()).collect();
        register_component(&self.conn, &collector, name, &urls)
            .await
            .unwrap();
    }

    pub async fn stored_repo(&self, id: &str) -> SubversionRepo {
        subversion_repo::Manager::find_by_id(&self.conn, id)
            .await
            .unwrap()
            .unwrap()
    }
}

/// In-memory stand-in for a Subversion server.
///
/// Clones share state, so a test keeps one handle while the task owns another.
#[derive(Clone, Default)]
pub struct FakeScm {
    state: Arc<Mutex<FakeScmState>>,
}

#[derive(Default)]
struct FakeScmState {
    /// Revisions (as reported) per repository url, oldest first.
    revisions: HashMap<String, Vec<String>>,
    /// Revision returned for every dated lookup.
    closest_revision: i64,
    /// Urls whose fetch fails.
    failing: HashSet<String>,
    /// `( url, start_revision )` of every fetch, in order.
    fetches: Vec<(String, i64)>,
}

impl FakeScm {
    pub fn set_revisions(&self, url: &str, revisions: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.revisions.insert(
            url.to_owned(),
            revisions.iter().map(|rev| (*rev).to_owned()).collect(),
        );
    }

    pub fn set_closest_revision(&self, revision: i64) {
        self.state.lock().unwrap().closest_revision = revision;
    }

    pub fn fail_fetches_of(&self, url: &str) {
        self.state.lock().unwrap().failing.insert(url.to_owned());
    }

    pub fn fetches(&self) -> Vec<(String, i64)> {
        self.state.lock().unwrap().fetches.clone()
    }
}

pub fn commit(url: &str, revision: &str) -> Commit {
    Commit::new(
        url.to_owned(),
        revision.to_owned(),
        "alice".to_owned(),
        format!("change {revision}"),
        1_760_000_000_000,
        1,
    )
}

#[async_trait]
impl ScmClient for FakeScm {
    async fn get_commits(&self, repo: &SubversionRepo, start_revision: i64) -> Result<Vec<Commit>> {
        let mut state = self.state.lock().unwrap();
        state.fetches.push((repo.url.clone(), start_revision));
        if state.failing.contains(&repo.url) {
            anyhow::bail!("svn: E170013: Unable to connect to a repository at URL '{}'", repo.url);
        }
        // Like `svn log -r START:HEAD`, revisions below the start are not returned.
        let commits = state
            .revisions
            .get(&repo.url)
            .map(|revisions| {
                revisions
                    .iter()
                    .filter(|rev| rev.parse::<i64>().map_or(true, |rev| rev >= start_revision))
                    .map(|rev| commit(&repo.url, rev))
                    .collect()
            })
            .unwrap_or_default();
        Ok(commits)
    }

    async fn get_revision_closest_to(&self, _url: &str, _date: DateTime<Utc>) -> Result<i64> {
        Ok(self.state.lock().unwrap().closest_revision)
    }
}
