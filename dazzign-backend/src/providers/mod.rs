//! External capabilities: turning text into attributes, and prompts into images.
//!
//! Each capability is a trait so the orchestrator can hold an ordered chain of
//! implementations and fall through them at call time.

pub mod chain;
pub mod keyword;
pub mod nova;
pub mod openai;
pub mod placeholder;
pub mod stability;

use async_trait::async_trait;
use dazzign_shared::attributes::PCCaseAttributes;
use dazzign_shared::node::ImageFormat;

pub use chain::{ExtractorChain, Rendered, RendererChain};
pub use keyword::KeywordExtractor;
pub use nova::NovaRenderer;
pub use openai::OpenAiExtractor;
pub use placeholder::PlaceholderRenderer;
pub use stability::StabilityRenderer;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("extractor API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("could not parse extractor response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("renderer API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Bedrock request failed: {0}")]
    Bedrock(String),

    #[error("generation failed the content filter")]
    ContentFiltered,

    #[error("unexpected renderer response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub seed: Option<u32>,
    pub format: ImageFormat,
}

#[async_trait]
pub trait AttributeExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(
        &self,
        text: Option<&str>,
        image: Option<&[u8]>,
    ) -> Result<PCCaseAttributes, ExtractionError>;
}

#[async_trait]
pub trait ImageRenderer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the rendered image, base64 encoded.
    async fn render(&self, req: &RenderRequest) -> Result<String, RenderError>;
}
