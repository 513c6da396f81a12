use serde::Serialize;
use serde_json::{json, Value};

use super::names::ToolName;
use super::params::{DEFAULT_HEIGHT, DEFAULT_STEPS, DEFAULT_WIDTH};
use crate::models::DEFAULT_MODEL;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    pub returns: Value,
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolName::ALL.into_iter().map(definition).collect()
}

fn definition(tool: ToolName) -> ToolDefinition {
    let (description, parameters, returns) = match tool {
        ToolName::GenerateVeniceImage => (
            "Generate an image using Venice AI based on a text prompt. The result carries \
             approval options (thumbs up/down) that can be shown to the user.",
            json!({
                "type": "object",
                "properties": {
                    "prompt": {"type": "string", "description": "The prompt describing the image to generate"},
                    "height": {"type": "integer", "minimum": 1, "default": DEFAULT_HEIGHT, "description": "Image height in pixels"},
                    "width": {"type": "integer", "minimum": 1, "default": DEFAULT_WIDTH, "description": "Image width in pixels"},
                    "steps": {"type": "integer", "minimum": 1, "default": DEFAULT_STEPS, "description": "Number of diffusion steps"},
                    "model": {"type": "string", "default": DEFAULT_MODEL, "description": "Model to use for generation"},
                },
                "required": ["prompt"],
            }),
            image_response_schema(),
        ),
        ToolName::ApproveImage => (
            "Mark an image as approved when the user gives a thumbs up.",
            image_id_schema("ID of the image to approve"),
            json!({
                "type": "object",
                "properties": {
                    "message": {"type": "string"},
                    "success": {"type": "boolean"},
                },
            }),
        ),
        ToolName::RegenerateImage => (
            "Create a new image with the same parameters when the user gives a thumbs down.",
            image_id_schema("ID of the image to regenerate"),
            image_response_schema(),
        ),
        ToolName::ListAvailableModels => (
            "List the Venice AI image models available for generation.",
            json!({"type": "object", "properties": {}}),
            json!({
                "type": "object",
                "properties": {
                    "models": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": {"type": "string", "description": "Model identifier"},
                                "name": {"type": "string", "description": "Human-readable model name"},
                                "description": {"type": "string", "description": "Description of the model's capabilities"},
                            },
                        },
                    },
                    "usage_hint": {"type": "string"},
                    "degraded": {"type": "boolean"},
                },
            }),
        ),
    };
    ToolDefinition {
        name: tool.as_str().to_string(),
        description: description.to_string(),
        parameters,
        returns,
    }
}

fn image_id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "image_id": {"type": "string", "description": description},
        },
        "required": ["image_id"],
    })
}

fn image_response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "image_id": {"type": "string", "description": "Unique identifier for the generated image"},
            "image_url": {"type": "string", "description": "URL of the generated image"},
            "thumbs_up_url": {"type": "string", "description": "URL to approve the image"},
            "thumbs_down_url": {"type": "string", "description": "URL to regenerate the image"},
            "degraded": {"type": "boolean", "description": "True when the image is a placeholder because generation failed"},
        },
    })
}
