//! Manager for the component model.
use crate::db::{DatabaseConnection, DatabaseTransaction};
use async_trait::async_trait;
use std::collections::HashMap;

use super::{CollectorItemRef, Component};

/// Flat row of the `component_collector_item` table.
#[derive(sqlx::FromRow)]
struct ComponentCollectorItem {
    /// Foreign key reference to the component.
    component_id: String,
    /// Collector type the item is listed under.
    collector_type: String,
    /// Referenced entity.
    collector_item_id: String,
    /// Collector owning the referenced entity.
    collector_id: String,
}

#[async_trait]
impl super::Manager for DatabaseConnection {
    /// Find all components with their collector items.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn find_all(&self) -> anyhow::Result<Vec<Component>> {
        let mut connection = self.pool.acquire().await?;
        let components = sqlx::query_as::<_, (String, String)>(
            "SELECT id, name FROM component ORDER BY name",
        )
        .fetch_all(&mut *connection)
        .await?;
        let items = sqlx::query_as::<_, ComponentCollectorItem>(
            "
            SELECT component_id, collector_type, collector_item_id, collector_id
            FROM component_collector_item
            ",
        )
        .fetch_all(&mut *connection)
        .await?;

        let mut items_by_component: HashMap<String, Vec<ComponentCollectorItem>> = HashMap::new();
        for item in items {
            items_by_component
                .entry(item.component_id.clone())
                .or_default()
                .push(item);
        }
        let rows = components
            .into_iter()
            .map(|(id, name)| {
                let items = items_by_component.remove(&id).unwrap_or_default();
                items.into_iter().fold(Component::new(id, name), |component, item| {
                    component.with_collector_item(
                        &item.collector_type,
                        CollectorItemRef {
                            id: item.collector_item_id,
                            collector_id: item.collector_id,
                        },
                    )
                })
            })
            .collect();
        Ok(rows)
    }
}

#[async_trait]
impl super::TxManager for DatabaseTransaction {
    /// Upsert a component and replace its collector items.
    ///
    /// # Errors
    /// Errors if the component or its items cannot be written.
    async fn save(&mut self, component: &Component) -> anyhow::Result<()> {
        sqlx::query(
            "
            INSERT INTO component ( id, name )
            VALUES ( $1, $2 )
            ON CONFLICT ( id ) DO UPDATE SET name = excluded.name
            ",
        )
        .bind(&component.id)
        .bind(&component.name)
        .execute(&mut *self.tx)
        .await?;
        sqlx::query("DELETE FROM component_collector_item WHERE component_id = $1")
            .bind(&component.id)
            .execute(&mut *self.tx)
            .await?;
        for (collector_type, items) in &component.collector_items {
            for item in items {
                sqlx::query(
                    "
                    INSERT INTO component_collector_item ( component_id, collector_type, collector_item_id, collector_id )
                    VALUES ( $1, $2, $3, $4 )
                    ON CONFLICT DO NOTHING
                    ",
                )
                .bind(&component.id)
                .bind(collector_type)
                .bind(&item.id)
                .bind(&item.collector_id)
                .execute(&mut *self.tx)
                .await?;
            }
        }
        Ok(())
    }
}
