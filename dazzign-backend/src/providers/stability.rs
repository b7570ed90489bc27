//! Image generation via the Stability AI stable-image REST API
//!

use async_trait::async_trait;
use base64::Engine;
use reqwest::multipart::Form;
use tracing::debug;

use super::{ImageRenderer, RenderError, RenderRequest};
use crate::config::StabilitySettings;

const ASPECT_RATIO: &str = "1:1";
const FINISH_REASON: &str = "finish-reason";
const CONTENT_FILTERED: &str = "CONTENT_FILTERED";

/// Which generation endpoint a model name maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StabilityModel {
    Core,
    Ultra,
    /// One of the `sd3.5-*` models, sent to the sd3 endpoint with its name.
    Sd3(String),
}

impl StabilityModel {
    pub fn parse(model: &str) -> Option<Self> {
        match model {
            "core" => Some(Self::Core),
            "ultra" => Some(Self::Ultra),
            m if m.starts_with("sd3.5") => Some(Self::Sd3(m.to_string())),
            _ => None,
        }
    }

    fn endpoint(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Ultra => "ultra",
            Self::Sd3(_) => "sd3",
        }
    }
}

pub struct StabilityRenderer {
    client: reqwest::Client,
    api_key: String,
    model: StabilityModel,
    base_url: String,
}

impl StabilityRenderer {
    pub fn new(
        settings: &StabilitySettings,
        api_key: String,
        model: StabilityModel,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v2beta/stable-image/generate/{}",
            self.base_url,
            self.model.endpoint()
        )
    }

    fn form(&self, req: &RenderRequest) -> Form {
        let mut form = Form::new()
            .text("prompt", req.prompt.clone())
            .text("aspect_ratio", ASPECT_RATIO)
            .text("seed", req.seed.unwrap_or(0).to_string())
            .text("output_format", req.format.as_str());
        if let Some(negative_prompt) = &req.negative_prompt {
            form = form.text("negative_prompt", negative_prompt.clone());
        }
        if let StabilityModel::Sd3(name) = &self.model {
            form = form
                .text("model", name.clone())
                .text("mode", "text-to-image");
        }
        form
    }
}

#[async_trait]
impl ImageRenderer for StabilityRenderer {
    fn name(&self) -> &'static str {
        "stability"
    }

    async fn render(&self, req: &RenderRequest) -> Result<String, RenderError> {
        let url = self.url();
        debug!("Sending generation request to {url}");
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "image/*")
            .multipart(self.form(req))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RenderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        if response
            .headers()
            .get(FINISH_REASON)
            .and_then(|v| v.to_str().ok())
            == Some(CONTENT_FILTERED)
        {
            return Err(RenderError::ContentFiltered);
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(RenderError::InvalidResponse("empty image body".to_string()));
        }
        Ok(base64::engine::general_purpose::STANDARD.encode(&bytes))
    }
}
