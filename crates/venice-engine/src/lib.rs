mod backend;
mod dispatcher;

pub use backend::{
    default_backend_registry, BackendError, BackendRegistry, DryrunBackend, GenerateRequest,
    ImageBackend, VeniceSettings, DEFAULT_VENICE_API_BASE,
};
pub use dispatcher::{
    ActionLinks, ApproveResponse, ImageResponse, ModelsResponse, ToolDispatcher, ToolOutput,
};
