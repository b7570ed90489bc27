//! Image generation with Amazon Nova Canvas on AWS Bedrock
//!

use async_trait::async_trait;
use aws_sdk_bedrockruntime::config::retry::RetryConfig;
use aws_sdk_bedrockruntime::config::timeout::TimeoutConfig;
use aws_sdk_bedrockruntime::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{ImageRenderer, RenderError, RenderRequest};
use crate::config::NovaSettings;

const IMAGE_SIZE: u32 = 1024;
const CFG_SCALE: f64 = 7.0;
/// Nova Canvas rejects seeds above this.
const MAX_SEED: u32 = 858_993_459;
const CONTENT_FILTER_MESSAGE: &str = "content filters";

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct NovaRenderer {
    client: Client,
    model_id: String,
}

impl NovaRenderer {
    pub fn new(settings: &NovaSettings, access_key_id: String, secret_access_key: String) -> Self {
        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            settings.session_token.clone(),
            None,
            "dazzign",
        );
        let mut config = aws_sdk_bedrockruntime::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            // failures fall through to the next renderer in the chain
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(settings.timeout)
                    .build(),
            );
        if let Some(endpoint_url) = &settings.endpoint_url {
            config = config.endpoint_url(endpoint_url);
        }
        Self {
            client: Client::from_conf(config.build()),
            model_id: settings.model_id.clone(),
        }
    }

    fn request_body(req: &RenderRequest) -> Value {
        let mut text_params = json!({ "text": req.prompt });
        if let Some(negative_prompt) = req.negative_prompt.as_deref().filter(|s| !s.is_empty()) {
            text_params["negativeText"] = json!(negative_prompt);
        }
        let mut generation_config = json!({
            "numberOfImages": 1,
            "quality": "standard",
            "width": IMAGE_SIZE,
            "height": IMAGE_SIZE,
            "cfgScale": CFG_SCALE,
        });
        if let Some(seed) = req.seed {
            generation_config["seed"] = json!(seed.min(MAX_SEED));
        }
        json!({
            "taskType": "TEXT_IMAGE",
            "textToImageParams": text_params,
            "imageGenerationConfig": generation_config,
        })
    }
}

#[async_trait]
impl ImageRenderer for NovaRenderer {
    fn name(&self) -> &'static str {
        "nova"
    }

    /// Nova Canvas always returns PNG, the requested format is not honoured.
    async fn render(&self, req: &RenderRequest) -> Result<String, RenderError> {
        let body = serde_json::to_vec(&Self::request_body(req))
            .map_err(|err| RenderError::InvalidResponse(err.to_string()))?;
        debug!("Invoking Bedrock model {}", self.model_id);

        let output = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|err| {
                let message = DisplayErrorContext(&err).to_string();
                if message.contains(CONTENT_FILTER_MESSAGE) {
                    RenderError::ContentFiltered
                } else {
                    RenderError::Bedrock(message)
                }
            })?;

        let response: InvokeResponse = serde_json::from_slice(output.body().as_ref())
            .map_err(|err| RenderError::InvalidResponse(err.to_string()))?;
        if let Some(error) = response.error.filter(|e| !e.is_empty()) {
            return Err(RenderError::Bedrock(error));
        }
        response
            .images
            .into_iter()
            .next()
            .ok_or_else(|| RenderError::InvalidResponse("no images in Nova response".to_string()))
    }
}
