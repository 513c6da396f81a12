use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ToolError;
use super::names::ToolName;
use crate::models::DEFAULT_MODEL;

pub const DEFAULT_HEIGHT: u32 = 1024;
pub const DEFAULT_WIDTH: u32 = 1024;
pub const DEFAULT_STEPS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateParams {
    pub prompt: String,
    pub height: u32,
    pub width: u32,
    pub steps: u32,
    /// `None` when the caller left the model to the default.
    pub model: Option<String>,
}

impl GenerateParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            height: DEFAULT_HEIGHT,
            width: DEFAULT_WIDTH,
            steps: DEFAULT_STEPS,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn resolved_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageIdParams {
    pub image_id: String,
}

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Generate(GenerateParams),
    Approve(ImageIdParams),
    Regenerate(ImageIdParams),
    ListModels,
}

impl ToolCall {
    /// Resolves the tool name and validates the parameter bag against the
    /// tool's schema. Unknown keys are ignored; `null` counts as omitted.
    pub fn parse(name: &str, params: &Value) -> Result<Self, ToolError> {
        let tool = ToolName::parse(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let empty = Map::new();
        let bag = match params {
            Value::Null => &empty,
            Value::Object(map) => map,
            _ => return Err(ToolError::invalid("parameters", "must be a JSON object")),
        };

        Ok(match tool {
            ToolName::GenerateVeniceImage => Self::Generate(GenerateParams {
                prompt: required_string(bag, "prompt")?,
                height: optional_positive(bag, "height", DEFAULT_HEIGHT)?,
                width: optional_positive(bag, "width", DEFAULT_WIDTH)?,
                steps: optional_positive(bag, "steps", DEFAULT_STEPS)?,
                model: optional_string(bag, "model")?,
            }),
            ToolName::ApproveImage => Self::Approve(ImageIdParams {
                image_id: required_string(bag, "image_id")?,
            }),
            ToolName::RegenerateImage => Self::Regenerate(ImageIdParams {
                image_id: required_string(bag, "image_id")?,
            }),
            ToolName::ListAvailableModels => Self::ListModels,
        })
    }

    pub fn tool(&self) -> ToolName {
        match self {
            Self::Generate(_) => ToolName::GenerateVeniceImage,
            Self::Approve(_) => ToolName::ApproveImage,
            Self::Regenerate(_) => ToolName::RegenerateImage,
            Self::ListModels => ToolName::ListAvailableModels,
        }
    }
}

fn present<'a>(bag: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    bag.get(field).filter(|value| !value.is_null())
}

fn required_string(bag: &Map<String, Value>, field: &str) -> Result<String, ToolError> {
    let value = present(bag, field).ok_or_else(|| ToolError::missing(field))?;
    let Value::String(raw) = value else {
        return Err(ToolError::invalid(field, "must be a string"));
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ToolError::invalid(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn optional_string(bag: &Map<String, Value>, field: &str) -> Result<Option<String>, ToolError> {
    match present(bag, field) {
        None => Ok(None),
        Some(_) => required_string(bag, field).map(Some),
    }
}

fn optional_positive(
    bag: &Map<String, Value>,
    field: &str,
    default: u32,
) -> Result<u32, ToolError> {
    let Some(value) = present(bag, field) else {
        return Ok(default);
    };
    let parsed = match value {
        Value::Number(raw) => raw.as_u64().or_else(|| {
            raw.as_f64()
                .filter(|number| number.fract() == 0.0 && *number >= 0.0)
                .map(|number| number as u64)
        }),
        Value::String(raw) => raw.trim().parse::<u64>().ok(),
        _ => None,
    };
    match parsed {
        Some(number) if number > 0 => u32::try_from(number)
            .map_err(|_| ToolError::invalid(field, format!("must be at most {}", u32::MAX))),
        _ => Err(ToolError::invalid(field, "must be a positive integer")),
    }
}
