use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use venice_contracts::models::{ModelCatalog, ModelInfo};

use super::{BackendError, GenerateRequest, ImageBackend};

/// Offline backend: renders a flat SVG whose colour is derived from the
/// prompt, and serves the static catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryrunBackend;

impl ImageBackend for DryrunBackend {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate_image(&self, request: &GenerateRequest) -> Result<String, BackendError> {
        let (r, g, b) = color_from_prompt(&request.prompt, u64::from(request.steps));
        let svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\">\
             <rect width=\"100%\" height=\"100%\" fill=\"#{r:02x}{g:02x}{b:02x}\"/></svg>",
            request.width, request.height
        );
        Ok(format!("data:image/svg+xml;base64,{}", BASE64.encode(svg)))
    }

    fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError> {
        Ok(ModelCatalog::fallback().into_models())
    }
}

fn color_from_prompt(prompt: &str, seed: u64) -> (u8, u8, u8) {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update(seed.to_be_bytes());
    let digest = hasher.finalize();
    (digest[0], digest[1], digest[2])
}
