use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod manager;

/// Trait for managing dashboard components.
#[async_trait]
pub trait Manager {
    /// Find all components together with the collector items they reference.
    async fn find_all(&self) -> anyhow::Result<Vec<Component>>;
}

/// Trait for managing transactional dashboard components.
#[async_trait]
pub trait TxManager {
    /// Insert a component and its collector items, replacing the items of an existing component.
    async fn save(&mut self, component: &Component) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Model for a dashboard component.
pub struct Component {
    /// Component identifier.
    pub id: String,
    /// Display name of the component.
    pub name: String,
    /// Collector items referenced by the component, keyed by collector type (e.g. `SCM`).
    #[serde(default)]
    pub collector_items: HashMap<String, Vec<CollectorItemRef>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
/// A component's reference to an entity collected by some collector.
pub struct CollectorItemRef {
    /// Identifier of the referenced entity, e.g. a Subversion repository id.
    pub id: String,
    /// Collector owning the referenced entity.
    pub collector_id: String,
}

impl Component {
    /// Create a component with no collector items.
    #[must_use]
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            collector_items: HashMap::new(),
        }
    }

    /// Add a reference to a collected entity under `collector_type`.
    #[must_use]
    pub fn with_collector_item(mut self, collector_type: &str, item: CollectorItemRef) -> Self {
        self.collector_items
            .entry(collector_type.to_owned())
            .or_default()
            .push(item);
        self
    }

    /// References of the given collector type, empty if there are none.
    #[must_use]
    pub fn collector_items_of(&self, collector_type: &str) -> &[CollectorItemRef] {
        self.collector_items
            .get(collector_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
