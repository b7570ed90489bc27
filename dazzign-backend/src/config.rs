//! Provider selection, built once at startup
//!

use std::time::Duration;

use clap::ValueEnum;
use dazzign_shared::error::DazzignError;
use tracing::{info, warn};

use crate::cli::CliOpts;
use crate::providers::stability::StabilityModel;
use crate::providers::{
    AttributeExtractor, ExtractorChain, ImageRenderer, KeywordExtractor, NovaRenderer,
    OpenAiExtractor, RendererChain, StabilityRenderer,
};

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const STABILITY_BASE_URL: &str = "https://api.stability.ai";
pub const NOVA_MODEL_ID: &str = "amazon.nova-canvas-v1:0";
pub const AWS_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererKind {
    Stability,
    Nova,
    Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExtractorKind {
    Openai,
    Keyword,
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o".to_string(),
            api_url: OPENAI_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StabilitySettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for StabilitySettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "core".to_string(),
            base_url: STABILITY_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NovaSettings {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub region: String,
    pub model_id: String,
    /// Overrides the regional Bedrock endpoint.
    pub endpoint_url: Option<String>,
    pub timeout: Duration,
}

impl Default for NovaSettings {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            region: AWS_REGION.to_string(),
            model_id: NOVA_MODEL_ID.to_string(),
            endpoint_url: None,
            timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: RendererKind,
    pub fallback_chain: Vec<RendererKind>,
    pub extractor: ExtractorKind,
    pub use_placeholder_only: bool,
    pub openai: OpenAiSettings,
    pub stability: StabilitySettings,
    pub nova: NovaSettings,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: RendererKind::Stability,
            fallback_chain: Vec::new(),
            extractor: ExtractorKind::Openai,
            use_placeholder_only: false,
            openai: OpenAiSettings::default(),
            stability: StabilitySettings::default(),
            nova: NovaSettings::default(),
        }
    }
}

impl ProviderConfig {
    /// Offline configuration: keyword extraction and the placeholder image.
    pub fn placeholder_only() -> Self {
        Self {
            use_placeholder_only: true,
            ..Default::default()
        }
    }

    pub fn renderer_chain(&self) -> Result<RendererChain, DazzignError> {
        if self.use_placeholder_only {
            return Ok(RendererChain::new(Vec::new()));
        }

        let mut seen = Vec::new();
        let mut renderers: Vec<Box<dyn ImageRenderer>> = Vec::new();
        for kind in std::iter::once(self.provider).chain(self.fallback_chain.iter().copied()) {
            if seen.contains(&kind) {
                continue;
            }
            seen.push(kind);

            match kind {
                // appended by the chain itself
                RendererKind::Placeholder => {}
                RendererKind::Stability => match &self.stability.api_key {
                    Some(api_key) => {
                        let model = StabilityModel::parse(&self.stability.model).ok_or_else(|| {
                            DazzignError::Configuration(format!(
                                "Unknown Stability model {:?}",
                                self.stability.model
                            ))
                        })?;
                        let renderer =
                            StabilityRenderer::new(&self.stability, api_key.clone(), model)
                                .map_err(|err| DazzignError::Configuration(err.to_string()))?;
                        renderers.push(Box::new(renderer));
                    }
                    None => warn!("Stability renderer requested but no API key is set, skipping"),
                },
                RendererKind::Nova => match (
                    &self.nova.access_key_id,
                    &self.nova.secret_access_key,
                ) {
                    (Some(access_key_id), Some(secret_access_key)) => {
                        renderers.push(Box::new(NovaRenderer::new(
                            &self.nova,
                            access_key_id.clone(),
                            secret_access_key.clone(),
                        )));
                    }
                    _ => warn!("Nova renderer requested but AWS credentials are not set, skipping"),
                },
            }
        }

        let chain = RendererChain::new(renderers);
        info!(renderers = ?chain.names(), "Configured renderer chain");
        Ok(chain)
    }

    pub fn extractor_chain(&self) -> Result<ExtractorChain, DazzignError> {
        let mut extractors: Vec<Box<dyn AttributeExtractor>> = Vec::new();

        if !self.use_placeholder_only && self.extractor == ExtractorKind::Openai {
            match &self.openai.api_key {
                Some(api_key) => {
                    let extractor = OpenAiExtractor::new(&self.openai, api_key.clone())
                        .map_err(|err| DazzignError::Configuration(err.to_string()))?;
                    extractors.push(Box::new(extractor));
                }
                None => warn!("OpenAI extractor requested but no API key is set, skipping"),
            }
        }
        extractors.push(Box::new(KeywordExtractor));

        let chain = ExtractorChain::new(extractors);
        info!(extractors = ?chain.names(), "Configured extractor chain");
        Ok(chain)
    }
}

impl From<&CliOpts> for ProviderConfig {
    fn from(cli: &CliOpts) -> Self {
        Self {
            provider: cli.renderer,
            fallback_chain: cli.fallback_chain.clone(),
            extractor: cli.extractor,
            use_placeholder_only: cli.placeholder_only,
            openai: OpenAiSettings {
                api_key: cli.openai_api_key.clone().filter(|k| !k.is_empty()),
                model: cli.openai_model.clone(),
                ..Default::default()
            },
            stability: StabilitySettings {
                api_key: cli.stability_api_key.clone().filter(|k| !k.is_empty()),
                model: cli.stability_model.clone(),
                ..Default::default()
            },
            nova: NovaSettings {
                access_key_id: cli.aws_access_key_id.clone().filter(|k| !k.is_empty()),
                secret_access_key: cli.aws_secret_access_key.clone().filter(|k| !k.is_empty()),
                session_token: cli.aws_session_token.clone().filter(|k| !k.is_empty()),
                region: cli.aws_region.clone(),
                model_id: cli.nova_model.clone(),
                ..Default::default()
            },
        }
    }
}
