//! Request and response shapes for design nodes and generation
//!

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::attributes::PCCaseAttributes;

pub const DEFAULT_ACTION_TYPE: &str = "generate";
pub const DEFAULT_NEGATIVE_PROMPT: &str =
    "text, logo, watermark, signature, blurry, lowres, noisy, grainy";
pub const DEFAULT_SEED: u32 = 202;

/// Everything needed to insert a node. `id`, `is_root` and `created_at` are
/// always assigned server-side.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct NodeDraft {
    pub prompt: String,
    #[serde(default)]
    pub parent_id: Option<i32>,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub spec_json: Option<PCCaseAttributes>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub request_params: Option<serde_json::Value>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub action_type: Option<String>,
}

impl NodeDraft {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn parent(mut self, parent_id: i32) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/v1/image-gen/generate`
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    /// When present, attribute extraction is skipped and these are used as-is.
    #[serde(default)]
    pub spec_json: Option<PCCaseAttributes>,
    #[serde(default)]
    pub parent_id: Option<i32>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub seed: Option<u32>,
    #[serde(default)]
    pub output_format: Option<ImageFormat>,
    /// Optional reference image, base64 encoded, passed to the extractor.
    #[serde(default)]
    pub image_base64: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToSpecRequest {
    pub prompt: String,
    #[serde(default)]
    pub image_base64: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ToSpecResponse {
    pub prompt: String,
    pub attributes: PCCaseAttributes,
    pub structured_prompt: String,
}
