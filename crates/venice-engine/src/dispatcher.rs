use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use venice_contracts::events::{EventWriter, ImageEvent};
use venice_contracts::images::{ImageDraft, ImageRecord, ImageStore};
use venice_contracts::models::{ModelCatalog, ModelCheck, ModelInfo, ModelValidator};
use venice_contracts::tools::{
    tool_definitions, GenerateParams, ToolCall, ToolDefinition, ToolError,
};

use crate::backend::{GenerateRequest, ImageBackend};

const DEFAULT_PUBLIC_URL: &str = "http://localhost:8000";

/// Builds the approve/regenerate links handed back with every image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLinks {
    base_url: String,
}

impl ActionLinks {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn approve_url(&self, image_id: &str) -> String {
        format!("{}/approve/{image_id}", self.base_url)
    }

    pub fn regenerate_url(&self, image_id: &str) -> String {
        format!("{}/regenerate/{image_id}", self.base_url)
    }
}

impl Default for ActionLinks {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_URL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResponse {
    pub image_id: String,
    pub image_url: String,
    pub thumbs_up_url: String,
    pub thumbs_down_url: String,
    /// True when `image_url` is a placeholder because generation failed.
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveResponse {
    pub message: String,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub usage_hint: String,
    /// True when the static fallback catalog was served.
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Image(ImageResponse),
    Approval(ApproveResponse),
    Models(ModelsResponse),
}

/// Inputs of one pass through the generate state machine.
#[derive(Debug, Clone)]
struct Generation {
    prompt: String,
    height: u32,
    width: u32,
    steps: u32,
    model: String,
    explicit_model: bool,
    regenerated_from: Option<String>,
}

impl From<GenerateParams> for Generation {
    fn from(params: GenerateParams) -> Self {
        Self {
            model: params.resolved_model().to_string(),
            explicit_model: params.model.is_some(),
            prompt: params.prompt,
            height: params.height,
            width: params.width,
            steps: params.steps,
            regenerated_from: None,
        }
    }
}

pub struct ToolDispatcher {
    backend: Arc<dyn ImageBackend>,
    images: Arc<dyn ImageStore>,
    links: ActionLinks,
    validator: ModelValidator,
    events: Option<EventWriter>,
}

impl ToolDispatcher {
    pub fn new(
        backend: Arc<dyn ImageBackend>,
        images: Arc<dyn ImageStore>,
        links: ActionLinks,
    ) -> Self {
        Self {
            backend,
            images,
            links,
            validator: ModelValidator::new(),
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventWriter) -> Self {
        self.events = Some(events);
        self
    }

    pub fn images(&self) -> &Arc<dyn ImageStore> {
        &self.images
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        tool_definitions()
    }

    /// Entry point for the tool-call protocol.
    ///
    /// Validation failures, unknown tools and missing images come back as
    /// typed errors; a panic inside an operation is reported as
    /// [`ToolError::Internal`].
    pub fn call_tool(&self, name: &str, params: &Value) -> Result<ToolOutput, ToolError> {
        let call = ToolCall::parse(name, params).inspect_err(|err| {
            debug!(tool = name, error = %err, "tool call rejected");
        })?;
        let tool = call.tool();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(call)))
            .unwrap_or_else(|_| Err(ToolError::Internal(format!("{tool} panicked"))));
        match &outcome {
            Ok(_) => debug!(tool = %tool, "tool call completed"),
            Err(err) => warn!(tool = %tool, kind = err.kind(), error = %err, "tool call failed"),
        }
        outcome
    }

    pub fn dispatch(&self, call: ToolCall) -> Result<ToolOutput, ToolError> {
        match call {
            ToolCall::Generate(params) => self.generate(params).map(ToolOutput::Image),
            ToolCall::Approve(params) => self.approve(&params.image_id).map(ToolOutput::Approval),
            ToolCall::Regenerate(params) => {
                self.regenerate(&params.image_id).map(ToolOutput::Image)
            }
            ToolCall::ListModels => Ok(ToolOutput::Models(self.list_models())),
        }
    }

    pub fn generate(&self, params: GenerateParams) -> Result<ImageResponse, ToolError> {
        self.run_generation(Generation::from(params))
    }

    pub fn approve(&self, image_id: &str) -> Result<ApproveResponse, ToolError> {
        let record = self
            .images
            .approve(image_id)
            .map_err(internal)?
            .ok_or_else(|| ToolError::NotFound(image_id.to_string()))?;
        info!(image_id = %record.id, "image approved");
        self.journal(ImageEvent::ImageApproved, &record);
        Ok(ApproveResponse {
            message: format!("Image {} has been approved", record.id),
            success: true,
        })
    }

    pub fn regenerate(&self, image_id: &str) -> Result<ImageResponse, ToolError> {
        let source = self
            .images
            .get(image_id)
            .map_err(internal)?
            .ok_or_else(|| ToolError::NotFound(image_id.to_string()))?;
        self.run_generation(Generation {
            prompt: source.prompt,
            height: source.height,
            width: source.width,
            steps: source.steps,
            model: source.model,
            explicit_model: source.explicit_model,
            regenerated_from: Some(source.id),
        })
    }

    pub fn list_models(&self) -> ModelsResponse {
        let (catalog, degraded) = match self.backend.list_models() {
            Ok(models) if !models.is_empty() => (ModelCatalog::new(models), false),
            Ok(_) => {
                warn!(backend = self.backend.name(), "empty model catalog; serving fallback");
                (ModelCatalog::fallback(), true)
            }
            Err(err) => {
                warn!(backend = self.backend.name(), error = %err, "model catalog unavailable; serving fallback");
                (ModelCatalog::fallback(), true)
            }
        };
        let usage_hint = usage_hint(&catalog);
        ModelsResponse {
            models: catalog.into_models(),
            usage_hint,
            degraded,
        }
    }

    fn run_generation(&self, generation: Generation) -> Result<ImageResponse, ToolError> {
        if generation.explicit_model {
            self.check_model(&generation.model)?;
        }

        let request = GenerateRequest {
            prompt: generation.prompt.clone(),
            height: generation.height,
            width: generation.width,
            steps: generation.steps,
            model: generation.model.clone(),
        };
        let (image_url, degraded) = match self.backend.generate_image(&request) {
            Ok(location) => (location, false),
            Err(err) => {
                warn!(
                    backend = self.backend.name(),
                    model = %request.model,
                    error = %err,
                    "image generation failed; using placeholder"
                );
                (placeholder_image_url(request.width, request.height), true)
            }
        };

        let record = self
            .images
            .create(ImageDraft {
                prompt: generation.prompt,
                height: generation.height,
                width: generation.width,
                steps: generation.steps,
                model: generation.model,
                explicit_model: generation.explicit_model,
                image_url,
                degraded,
                regenerated_from: generation.regenerated_from,
            })
            .map_err(internal)?;

        match record.regenerated_from.as_deref() {
            Some(source) => {
                info!(image_id = %record.id, source, degraded, "image regenerated");
                self.journal(ImageEvent::ImageRegenerated, &record);
            }
            None => {
                info!(image_id = %record.id, model = %record.model, degraded, "image created");
                self.journal(ImageEvent::ImageCreated, &record);
            }
        }
        Ok(self.image_response(&record))
    }

    fn check_model(&self, model: &str) -> Result<(), ToolError> {
        let fetched = self.backend.list_models().map(ModelCatalog::new);
        let check = match &fetched {
            Ok(catalog) => self.validator.check(model, Ok(catalog)),
            Err(err) => self.validator.check(model, Err(&err.to_string())),
        };
        match check {
            ModelCheck::Rejected {
                requested,
                available,
            } => Err(ToolError::InvalidModel {
                requested,
                available,
            }),
            ModelCheck::Unverified { reason } => {
                warn!(model, reason = %reason, "model validation skipped; attempting generation anyway");
                Ok(())
            }
            ModelCheck::Accepted => Ok(()),
        }
    }

    fn image_response(&self, record: &ImageRecord) -> ImageResponse {
        ImageResponse {
            image_id: record.id.clone(),
            image_url: record.image_url.clone(),
            thumbs_up_url: self.links.approve_url(&record.id),
            thumbs_down_url: self.links.regenerate_url(&record.id),
            degraded: record.degraded,
        }
    }

    fn journal(&self, event: ImageEvent, record: &ImageRecord) {
        let Some(events) = &self.events else {
            return;
        };
        if let Err(err) = events.record(event, record) {
            warn!(?event, error = %err, "failed to journal image event");
        }
    }
}

/// Sentinel location used when the backend cannot produce an image.
pub fn placeholder_image_url(width: u32, height: u32) -> String {
    format!("https://placehold.co/{width}x{height}/png?text=Image+generation+unavailable")
}

fn usage_hint(catalog: &ModelCatalog) -> String {
    let example = catalog
        .list()
        .next()
        .map(|model| model.id.as_str())
        .unwrap_or(venice_contracts::models::DEFAULT_MODEL);
    format!(
        "Pass one of these ids as the `model` parameter of generate_venice_image, \
         e.g. {{\"prompt\": \"a lighthouse at dusk\", \"model\": \"{example}\"}}."
    )
}

fn internal(err: anyhow::Error) -> ToolError {
    ToolError::Internal(format!("{err:#}"))
}
