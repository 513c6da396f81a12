use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "fluently-xl";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl ModelInfo {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Ordered set of generation models keyed by id.
///
/// Insertion order is the order reported to callers; a later entry with an
/// id already present replaces the earlier one in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelCatalog {
    models: IndexMap<String, ModelInfo>,
}

impl ModelCatalog {
    pub fn new(models: impl IntoIterator<Item = ModelInfo>) -> Self {
        let mut map = IndexMap::new();
        for model in models {
            map.insert(model.id.clone(), model);
        }
        Self { models: map }
    }

    /// The static catalog used whenever the remote catalog is unavailable.
    pub fn fallback() -> Self {
        Self::new(fallback_models())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(id)
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelInfo> {
        self.models.values()
    }

    pub fn ids(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn into_models(self) -> Vec<ModelInfo> {
        self.models.into_values().collect()
    }
}

fn fallback_models() -> Vec<ModelInfo> {
    vec![
        ModelInfo::new(
            DEFAULT_MODEL,
            "Fluently XL",
            "High-quality image generation model with excellent detail and composition",
        ),
        ModelInfo::new(
            "fluently-base",
            "Fluently Base",
            "Standard image generation model with good quality and faster generation",
        ),
        ModelInfo::new(
            "fluently-creative",
            "Fluently Creative",
            "Model optimized for creative and artistic image generation",
        ),
    ]
}
