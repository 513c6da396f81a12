mod dryrun;
mod venice;

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use venice_contracts::models::ModelInfo;

pub use dryrun::DryrunBackend;
pub use venice::{VeniceBackend, VeniceSettings, DEFAULT_VENICE_API_BASE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub height: u32,
    pub width: u32,
    pub steps: u32,
    pub model: String,
}

/// Ordinary remote failures. Backends report these instead of panicking so
/// the dispatcher can decide on a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("{0}")]
    MissingCredentials(String),
    #[error("{backend} request timed out")]
    Timeout { backend: String },
    #[error("{backend} request failed: {message}")]
    Transport { backend: String, message: String },
    #[error("{backend} request failed ({status}): {body}")]
    Status {
        backend: String,
        status: u16,
        body: String,
    },
    #[error("{backend} returned a malformed response: {message}")]
    Malformed { backend: String, message: String },
}

pub trait ImageBackend: Send + Sync {
    fn name(&self) -> &str;
    /// Returns the location of the generated image.
    fn generate_image(&self, request: &GenerateRequest) -> Result<String, BackendError>;
    fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError>;
}

#[derive(Default)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Arc<dyn ImageBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<B: ImageBackend + 'static>(&mut self, backend: B) {
        self.backends
            .insert(backend.name().to_string(), Arc::new(backend));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ImageBackend>> {
        self.backends.get(name.trim()).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }
}

pub fn default_backend_registry(settings: VeniceSettings) -> anyhow::Result<BackendRegistry> {
    let mut backends = BackendRegistry::new();
    backends.register(DryrunBackend);
    backends.register(VeniceBackend::new(settings)?);
    Ok(backends)
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{default_backend_registry, truncate_text, VeniceSettings};

    #[test]
    fn default_registry_knows_both_backends() -> anyhow::Result<()> {
        let registry = default_backend_registry(VeniceSettings {
            api_base: "http://127.0.0.1:9".to_string(),
            api_key: None,
            timeout: Duration::from_secs(1),
        })?;
        assert_eq!(registry.names(), vec!["dryrun", "venice"]);
        assert_eq!(
            registry.get(" venice ").map(|backend| backend.name().to_string()),
            Some("venice".to_string())
        );
        assert!(registry.get("openai").is_none());
        Ok(())
    }

    #[test]
    fn truncate_text_marks_cut_bodies() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdef", 3), "abc…");
    }
}
