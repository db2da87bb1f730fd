use crate::db::models::collector::{Collector, CollectorType};
use crate::db::models::component::{self, CollectorItemRef, Component};
use crate::db::models::subversion_repo::{self, SubversionRepo};
use crate::db::{DatabaseConnection, DatabaseTransaction, Tx};
use crate::utils::ids;
use url::Url;

/// Register the repository at `url` with `collector`.
///
/// Registering an already known url keeps its watermark and only updates the enabled flag.
///
/// # Errors
/// Errors if `url` is not a valid url or the repository cannot be saved.
pub async fn register_repository(
    conn: &DatabaseConnection,
    collector: &Collector,
    url: &str,
    enabled: bool,
) -> anyhow::Result<SubversionRepo> {
    let url = normalize_url(url)?;
    let id = ids::repository_id(&collector.id, &url);
    let mut repo = match subversion_repo::Manager::find_by_id(conn, &id).await? {
        Some(existing) => {
            tracing::info!(id = %id, "Repository {url} is already registered");
            existing
        }
        None => SubversionRepo::new(id, collector.id.clone(), url),
    };
    repo.enabled = enabled;
    subversion_repo::Manager::save(conn, &repo).await?;
    Ok(repo)
}

/// Register a dashboard component named `name` that uses the repositories at `urls`.
///
/// The component's `SCM` items are replaced by the given repositories.
///
/// # Errors
/// Errors if a url is invalid or the component cannot be saved.
pub async fn register_component(
    conn: &DatabaseConnection,
    collector: &Collector,
    name: &str,
    urls: &[String],
) -> anyhow::Result<Component> {
    let mut comp = Component::new(ids::component_id(name), name.to_owned());
    for url in urls {
        let url = normalize_url(url)?;
        comp = comp.with_collector_item(
            CollectorType::Scm.as_str(),
            CollectorItemRef {
                id: ids::repository_id(&collector.id, &url),
                collector_id: collector.id.clone(),
            },
        );
    }
    let mut tx = DatabaseTransaction::begin(conn).await?;
    if let Err(err) = component::TxManager::save(&mut tx, &comp).await {
        tx.rollback().await?;
        return Err(err);
    }
    tx.commit().await?;
    Ok(comp)
}

/// Validate `url` and strip trailing slashes so that one repository has one id.
fn normalize_url(url: &str) -> anyhow::Result<String> {
    let parsed = Url::parse(url.trim())
        .map_err(|err| anyhow::anyhow!("invalid repository url `{url}`: {err}"))?;
    if parsed.cannot_be_a_base() {
        anyhow::bail!("invalid repository url `{url}`: not a hierarchical url");
    }
    Ok(url.trim().trim_end_matches('/').to_owned())
}
