use serde::{Deserialize, Serialize};

/// Everything needed to store a generation result except its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDraft {
    pub prompt: String,
    pub height: u32,
    pub width: u32,
    pub steps: u32,
    pub model: String,
    pub explicit_model: bool,
    pub image_url: String,
    pub degraded: bool,
    pub regenerated_from: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub prompt: String,
    pub height: u32,
    pub width: u32,
    pub steps: u32,
    pub model: String,
    pub explicit_model: bool,
    pub image_url: String,
    pub degraded: bool,
    pub approved: bool,
    pub regenerated_from: Option<String>,
    pub created_at: String,
}

impl ImageRecord {
    pub(crate) fn from_draft(id: String, draft: ImageDraft, created_at: String) -> Self {
        Self {
            id,
            prompt: draft.prompt,
            height: draft.height,
            width: draft.width,
            steps: draft.steps,
            model: draft.model,
            explicit_model: draft.explicit_model,
            image_url: draft.image_url,
            degraded: draft.degraded,
            approved: false,
            regenerated_from: draft.regenerated_from,
            created_at,
        }
    }
}
