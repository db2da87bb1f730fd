mod common;

use common::{commit, initialize_collector, OTHER_REPO_URL, REPO_URL};
use svn_collector::db::models::commit::{self as commit_model};
use svn_collector::collector::CollectorTask;
use svn_collector::db::models::subversion_repo;

#[async_std::test]
async fn test_collect_when_new_revisions_expect_all_saved_and_watermark_advanced() {
    let t = initialize_collector().await;
    let repo = t.add_used_repo(REPO_URL, 100).await;
    t.scm.set_closest_revision(50);
    t.scm.set_revisions(REPO_URL, &["101", "102", "103"]);

    let summary = t.task.run().await.unwrap().unwrap();

    assert_eq!(summary.repo_count, 1);
    assert_eq!(summary.commit_count, 3);
    assert_eq!(t.stored_repo(&repo.id).await.latest_revision, 103);
    let stored = commit_model::Manager::find_all_by_collector_item(&t.conn, &repo.id)
        .await
        .unwrap();
    let revisions: Vec<&str> = stored
        .iter()
        .map(|c| c.scm_revision_number.as_str())
        .collect();
    assert_eq!(revisions, ["101", "102", "103"]);
    assert!(stored.iter().all(|c| c.collector_item_id == repo.id));
}

#[async_std::test]
async fn test_collect_when_revision_already_seen_expect_only_new_saved() {
    let t = initialize_collector().await;
    let repo = t.add_used_repo(REPO_URL, 100).await;
    let mut seen = commit(REPO_URL, "100");
    seen.collector_item_id.clone_from(&repo.id);
    assert!(commit_model::Manager::create_if_absent(&t.conn, &seen)
        .await
        .unwrap());
    t.scm.set_revisions(REPO_URL, &["100", "101"]);

    let summary = t.task.run().await.unwrap().unwrap();

    assert_eq!(summary.commit_count, 1);
    assert_eq!(t.stored_repo(&repo.id).await.latest_revision, 101);
    let count = commit_model::Manager::count_by_collector_item(&t.conn, &repo.id)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[async_std::test]
async fn test_collect_when_run_twice_expect_second_run_saves_nothing() {
    let t = initialize_collector().await;
    let repo = t.add_used_repo(REPO_URL, 0).await;
    t.scm.set_revisions(REPO_URL, &["1", "2", "3"]);

    let first = t.task.run().await.unwrap().unwrap();
    let second = t.task.run().await.unwrap().unwrap();

    assert_eq!(first.commit_count, 3);
    assert_eq!(second.commit_count, 0);
    assert_eq!(second.repo_count, 1);
    let count = commit_model::Manager::count_by_collector_item(&t.conn, &repo.id)
        .await
        .unwrap();
    assert_eq!(count, 3);
    // The second fetch starts at the watermark of the first run.
    assert_eq!(t.scm.fetches()[1], (REPO_URL.to_owned(), 3));
}

#[async_std::test]
async fn test_collect_when_fetch_overlaps_watermark_expect_no_duplicates() {
    let t = initialize_collector().await;
    let repo = t.add_used_repo(REPO_URL, 0).await;
    t.scm.set_revisions(REPO_URL, &["5", "6"]);
    t.task.run().await.unwrap();

    // A later cycle sees the watermark revision again together with new ones.
    t.scm.set_revisions(REPO_URL, &["5", "6", "7"]);
    let summary = t.task.run().await.unwrap().unwrap();

    assert_eq!(summary.commit_count, 1);
    for revision in ["5", "6", "7"] {
        let found = commit_model::Manager::find_by_collector_item_and_revision(
            &t.conn, &repo.id, revision,
        )
        .await
        .unwrap();
        assert!(found.is_some(), "revision {revision} should be stored once");
    }
    let count = commit_model::Manager::count_by_collector_item(&t.conn, &repo.id)
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[async_std::test]
async fn test_collect_when_repo_not_referenced_expect_disabled_and_not_fetched() {
    let t = initialize_collector().await;
    let orphan = t.add_repo(OTHER_REPO_URL, 10).await;
    let used = t.add_used_repo(REPO_URL, 0).await;
    t.scm.set_revisions(OTHER_REPO_URL, &["11"]);
    t.scm.set_revisions(REPO_URL, &["1"]);

    let summary = t.task.run().await.unwrap().unwrap();

    assert_eq!(summary.repo_count, 1);
    assert!(!t.stored_repo(&orphan.id).await.enabled);
    assert!(t.stored_repo(&used.id).await.enabled);
    let fetched_urls: Vec<String> = t.scm.fetches().into_iter().map(|(url, _)| url).collect();
    assert_eq!(fetched_urls, [REPO_URL]);
    let orphan_commits = commit_model::Manager::count_by_collector_item(&t.conn, &orphan.id)
        .await
        .unwrap();
    assert_eq!(orphan_commits, 0);
}

#[async_std::test]
async fn test_clean_when_component_added_later_expect_repo_enabled_again() {
    let t = initialize_collector().await;
    let repo = t.add_repo(REPO_URL, 0).await;
    let collector = t.collector().await;

    t.task.clean(&collector).await.unwrap();
    assert!(!t.stored_repo(&repo.id).await.enabled);

    t.add_component("web", &[REPO_URL]).await;
    t.task.clean(&collector).await.unwrap();
    assert!(t.stored_repo(&repo.id).await.enabled);
}

#[async_std::test]
async fn test_clean_keeps_watermark_and_deletes_nothing() {
    let t = initialize_collector().await;
    let repo = t.add_repo(REPO_URL, 42).await;
    let collector = t.collector().await;

    t.task.clean(&collector).await.unwrap();

    let repos = subversion_repo::Manager::find_by_collector_ids(&t.conn, &[collector.id.clone()])
        .await
        .unwrap();
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].id, repo.id);
    assert_eq!(repos[0].latest_revision, 42);
}

#[async_std::test]
async fn test_clean_when_referenced_by_two_components_expect_processed_once() {
    let t = initialize_collector().await;
    let repo = t.add_used_repo(REPO_URL, 0).await;
    t.add_component("api", &[REPO_URL, OTHER_REPO_URL]).await;
    t.scm.set_revisions(REPO_URL, &["1", "2"]);

    let summary = t.task.run().await.unwrap().unwrap();

    assert_eq!(summary.repo_count, 1);
    assert_eq!(summary.commit_count, 2);
    assert_eq!(t.stored_repo(&repo.id).await.latest_revision, 2);
}

#[async_std::test]
async fn test_start_revision_when_date_bound_ahead_expect_date_bound() {
    let t = initialize_collector().await;
    let repo = t.add_used_repo(REPO_URL, 100).await;
    t.scm.set_closest_revision(500);

    let actual = t.task.start_revision(&repo).await.unwrap();

    assert_eq!(actual, 500);
}

#[async_std::test]
async fn test_start_revision_when_watermark_ahead_expect_watermark() {
    let t = initialize_collector().await;
    let repo = t.add_used_repo(REPO_URL, 100).await;
    t.scm.set_closest_revision(10);

    let actual = t.task.start_revision(&repo).await.unwrap();

    assert_eq!(actual, 100);
}

#[async_std::test]
async fn test_start_revision_when_threshold_out_of_date_range_expect_error() {
    let t = initialize_collector().await;
    let repo = t.add_used_repo(REPO_URL, 100).await;
    let task = CollectorTask::new(t.conn.clone(), t.scm.clone(), 100_000_000);

    let actual = task.start_revision(&repo).await.unwrap_err();
    let expected = "reaches outside the supported date range";
    assert!(
        actual.to_string().contains(expected),
        "\"{actual}\" doesn't contain {expected}"
    );

    let cycle = task.run().await.unwrap_err();
    assert!(cycle.to_string().contains(expected));
    assert!(t.scm.fetches().is_empty());
}

#[async_std::test]
async fn test_collect_when_server_has_older_revisions_expect_fetch_from_watermark() {
    let t = initialize_collector().await;
    let repo = t.add_used_repo(REPO_URL, 100).await;
    t.scm.set_closest_revision(0);
    t.scm.set_revisions(REPO_URL, &["90", "101"]);

    let summary = t.task.run().await.unwrap().unwrap();

    assert_eq!(t.scm.fetches(), [(REPO_URL.to_owned(), 100)]);
    assert_eq!(summary.commit_count, 1);
    assert_eq!(t.stored_repo(&repo.id).await.latest_revision, 101);
    let older = commit_model::Manager::find_by_collector_item_and_revision(&t.conn, &repo.id, "90")
        .await
        .unwrap();
    assert!(older.is_none());
}

#[async_std::test]
async fn test_save_when_lower_watermark_expect_stored_watermark_kept() {
    let t = initialize_collector().await;
    let mut repo = t.add_repo(REPO_URL, 100).await;

    repo.latest_revision = 7;
    subversion_repo::Manager::save(&t.conn, &repo).await.unwrap();

    assert_eq!(t.stored_repo(&repo.id).await.latest_revision, 100);
}

#[async_std::test]
async fn test_collect_when_revision_malformed_expect_error_and_earlier_commits_kept() {
    let t = initialize_collector().await;
    let repo = t.add_used_repo(REPO_URL, 100).await;
    t.scm.set_revisions(REPO_URL, &["101", "r102", "103"]);

    let actual = t.task.run().await.unwrap_err();

    let expected = "invalid revision number `r102`";
    assert!(
        format!("{actual:?}").contains(expected),
        "\"{actual:?}\" doesn't contain {expected}"
    );
    let count = commit_model::Manager::count_by_collector_item(&t.conn, &repo.id)
        .await
        .unwrap();
    assert_eq!(count, 1);
    // The repository save after the batch was never reached.
    assert_eq!(t.stored_repo(&repo.id).await.latest_revision, 100);

    // Once the server reports sane revisions the next cycle resumes without duplicates.
    t.scm.set_revisions(REPO_URL, &["101", "102", "103"]);
    let summary = t.task.run().await.unwrap().unwrap();
    assert_eq!(summary.commit_count, 2);
    assert_eq!(t.stored_repo(&repo.id).await.latest_revision, 103);
}

#[async_std::test]
async fn test_collect_when_fetch_fails_expect_error_and_cycle_aborted() {
    let t = initialize_collector().await;
    t.add_used_repo(REPO_URL, 0).await;
    let other = t.add_used_repo(OTHER_REPO_URL, 0).await;
    t.scm.set_revisions(REPO_URL, &["1"]);
    t.scm.set_revisions(OTHER_REPO_URL, &["1"]);
    // Repositories are processed in url order, so the https repository comes first.
    t.scm.fail_fetches_of(REPO_URL);

    let actual = t.task.run().await.unwrap_err();

    let expected = "failed to fetch commits of https://svn.example.com/repos/app/trunk";
    assert!(
        actual.to_string().contains(expected),
        "\"{actual}\" doesn't contain {expected}"
    );
    let other_commits = commit_model::Manager::count_by_collector_item(&t.conn, &other.id)
        .await
        .unwrap();
    assert_eq!(other_commits, 0);
}

#[async_std::test]
async fn test_run_when_collector_disabled_expect_cycle_skipped() {
    let t = initialize_collector().await;
    t.add_used_repo(REPO_URL, 0).await;
    t.scm.set_revisions(REPO_URL, &["1"]);
    sqlx::query("UPDATE collector SET enabled = 0")
        .execute(&t.conn.pool)
        .await
        .unwrap();

    let actual = t.task.run().await.unwrap();

    assert!(actual.is_none());
    assert!(t.scm.fetches().is_empty());
    assert_eq!(t.collector().await.last_executed, None);
}

#[async_std::test]
async fn test_run_stamps_last_executed() {
    let t = initialize_collector().await;
    assert_eq!(t.collector().await.last_executed, None);

    t.task.run().await.unwrap();

    assert!(t.collector().await.last_executed.is_some());
}

#[async_std::test]
async fn test_register_when_called_twice_expect_same_collector() {
    let t = initialize_collector().await;

    let first = t.task.register().await.unwrap();
    let second = t.task.register().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.name, "Subversion");
    assert_eq!(first.collector_type, "SCM");
    assert!(first.enabled);
}
