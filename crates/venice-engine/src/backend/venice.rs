use std::env;
use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Value};
use venice_contracts::models::ModelInfo;

use super::{truncate_text, BackendError, GenerateRequest, ImageBackend};

pub const DEFAULT_VENICE_API_BASE: &str = "https://api.venice.ai/api/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const BACKEND: &str = "Venice";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VeniceSettings {
    pub api_base: String,
    pub api_key: Option<String>,
    /// Deadline applied to every remote call.
    pub timeout: Duration,
}

impl VeniceSettings {
    pub fn from_env() -> Self {
        Self {
            api_base: non_empty_env("VENICE_API_BASE")
                .unwrap_or_else(|| DEFAULT_VENICE_API_BASE.to_string()),
            api_key: non_empty_env("VENICE_API_KEY"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct VeniceBackend {
    api_base: String,
    api_key: Option<String>,
    http: HttpClient,
}

impl VeniceBackend {
    pub fn new(settings: VeniceSettings) -> anyhow::Result<Self> {
        let http = HttpClient::builder()
            .timeout(settings.timeout)
            .build()
            .context("failed building Venice HTTP client")?;
        Ok(Self {
            api_base: settings.api_base.trim().trim_end_matches('/').to_string(),
            api_key: settings
                .api_key
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    fn api_key(&self) -> Result<&str, BackendError> {
        self.api_key.as_deref().ok_or_else(|| {
            BackendError::MissingCredentials(
                "VENICE_API_KEY not set; pass --api-key or export VENICE_API_KEY".to_string(),
            )
        })
    }
}

impl ImageBackend for VeniceBackend {
    fn name(&self) -> &str {
        "venice"
    }

    fn generate_image(&self, request: &GenerateRequest) -> Result<String, BackendError> {
        let api_key = self.api_key()?;
        let payload = json!({
            "height": request.height,
            "width": request.width,
            "steps": request.steps,
            "return_binary": false,
            "hide_watermark": true,
            "format": "png",
            "embed_exif_metadata": false,
            "model": request.model,
            "prompt": request.prompt,
        });
        let response = self
            .http
            .post(self.endpoint("image/generate"))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .map_err(transport_error)?;
        let body = response_json_or_error(response)?;
        extract_image_location(&body).ok_or_else(|| BackendError::Malformed {
            backend: BACKEND.to_string(),
            message: format!("no image in response: {}", truncate_text(&body.to_string(), 256)),
        })
    }

    fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError> {
        let api_key = self.api_key()?;
        let response = self
            .http
            .get(self.endpoint("models"))
            .query(&[("type", "image")])
            .bearer_auth(api_key)
            .send()
            .map_err(transport_error)?;
        let body = response_json_or_error(response)?;
        parse_models(&body).ok_or_else(|| BackendError::Malformed {
            backend: BACKEND.to_string(),
            message: "model listing has no `data` array".to_string(),
        })
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::Timeout {
            backend: BACKEND.to_string(),
        };
    }
    BackendError::Transport {
        backend: BACKEND.to_string(),
        message: err.to_string(),
    }
}

fn response_json_or_error(response: HttpResponse) -> Result<Value, BackendError> {
    let status = response.status();
    let body = response.text().map_err(transport_error)?;
    if !status.is_success() {
        return Err(BackendError::Status {
            backend: BACKEND.to_string(),
            status: status.as_u16(),
            body: truncate_text(&body, 512),
        });
    }
    serde_json::from_str(&body).map_err(|err| BackendError::Malformed {
        backend: BACKEND.to_string(),
        message: format!("invalid JSON payload ({err})"),
    })
}

fn extract_image_location(payload: &Value) -> Option<String> {
    for key in ["image_url", "url"] {
        if let Some(location) = payload.get(key).and_then(Value::as_str).and_then(as_location) {
            return Some(location);
        }
    }
    for key in ["images", "data"] {
        let Some(rows) = payload.get(key).and_then(Value::as_array) else {
            continue;
        };
        for row in rows {
            let found = match row {
                Value::String(raw) => as_location(raw).or_else(|| as_png_data_url(raw)),
                Value::Object(obj) => obj
                    .get("url")
                    .or_else(|| obj.get("image_url"))
                    .and_then(Value::as_str)
                    .and_then(as_location)
                    .or_else(|| {
                        obj.get("b64_json")
                            .and_then(Value::as_str)
                            .and_then(as_png_data_url)
                    }),
                _ => None,
            };
            if found.is_some() {
                return found;
            }
        }
    }
    None
}

fn as_location(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let lowered = trimmed.to_ascii_lowercase();
    if lowered.starts_with("http://")
        || lowered.starts_with("https://")
        || lowered.starts_with("data:image/")
    {
        return Some(trimmed.to_string());
    }
    None
}

fn as_png_data_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let is_base64 = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '/' | '='));
    is_base64.then(|| format!("data:image/png;base64,{trimmed}"))
}

fn parse_models(payload: &Value) -> Option<Vec<ModelInfo>> {
    let rows = payload
        .get("data")
        .or_else(|| payload.get("models"))
        .and_then(Value::as_array)?;
    Some(rows.iter().filter_map(model_from_row).collect())
}

fn model_from_row(row: &Value) -> Option<ModelInfo> {
    let id = row.get("id")?.as_str()?.trim();
    if id.is_empty() {
        return None;
    }
    if let Some(kind) = row.get("type").and_then(Value::as_str) {
        if kind != "image" {
            return None;
        }
    }
    let spec = row.get("model_spec");
    let text = |key: &str| -> Option<String> {
        row.get(key)
            .or_else(|| spec.and_then(|spec| spec.get(key)))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    Some(ModelInfo::new(
        id,
        text("name").unwrap_or_else(|| id.to_string()),
        text("description").unwrap_or_default(),
    ))
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
