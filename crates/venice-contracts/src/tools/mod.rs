mod error;
mod names;
mod params;
mod schema;

pub use error::{ErrorClass, ToolError};
pub use names::ToolName;
pub use params::{
    GenerateParams, ImageIdParams, ToolCall, DEFAULT_HEIGHT, DEFAULT_STEPS, DEFAULT_WIDTH,
};
pub use schema::{tool_definitions, ToolDefinition};
