//! Ordered fallback over providers, evaluated per call.
//!

use dazzign_shared::attributes::PCCaseAttributes;
use tracing::{debug, warn};

use super::{AttributeExtractor, ImageRenderer, PlaceholderRenderer, RenderRequest};

pub struct ExtractorChain {
    extractors: Vec<Box<dyn AttributeExtractor>>,
}

impl ExtractorChain {
    pub fn new(extractors: Vec<Box<dyn AttributeExtractor>>) -> Self {
        Self { extractors }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// First successful extraction wins. If everything fails the result is
    /// empty attributes, never an error.
    pub async fn extract(&self, text: Option<&str>, image: Option<&[u8]>) -> PCCaseAttributes {
        for extractor in &self.extractors {
            match extractor.extract(text, image).await {
                Ok(attrs) => {
                    debug!(provider = extractor.name(), "Extracted attributes");
                    return attrs;
                }
                Err(err) => {
                    warn!(provider = extractor.name(), error = %err, "Extractor failed, trying next");
                }
            }
        }
        warn!(
            providers = ?self.names(),
            "degraded provider result: every extractor failed, using empty attributes"
        );
        PCCaseAttributes::default()
    }
}

/// The image and the name of the renderer that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub image_base64: String,
    pub provider: &'static str,
}

/// Renderers in preference order, with the placeholder always last.
pub struct RendererChain {
    renderers: Vec<Box<dyn ImageRenderer>>,
    fallback: PlaceholderRenderer,
}

impl RendererChain {
    pub fn new(renderers: Vec<Box<dyn ImageRenderer>>) -> Self {
        Self {
            renderers,
            fallback: PlaceholderRenderer,
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.renderers
            .iter()
            .map(|r| r.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }

    pub async fn render(&self, req: &RenderRequest) -> Rendered {
        for renderer in &self.renderers {
            match renderer.render(req).await {
                Ok(image_base64) => {
                    return Rendered {
                        image_base64,
                        provider: renderer.name(),
                    }
                }
                Err(err) => {
                    warn!(provider = renderer.name(), error = %err, "Renderer failed, trying next");
                }
            }
        }
        if !self.renderers.is_empty() {
            warn!("degraded provider result: every renderer failed, returning placeholder image");
        }
        Rendered {
            image_base64: self.fallback.image(),
            provider: self.fallback.name(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use dazzign_shared::node::ImageFormat;

    use super::*;
    use crate::providers::placeholder::PLACEHOLDER_PNG_BASE64;
    use crate::providers::{ExtractionError, KeywordExtractor, RenderError};

    pub(crate) struct FailingRenderer;

    #[async_trait]
    impl ImageRenderer for FailingRenderer {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn render(&self, _req: &RenderRequest) -> Result<String, RenderError> {
            Err(RenderError::Api {
                status: 500,
                body: "boom".to_string(),
            })
        }
    }

    pub(crate) struct FailingExtractor;

    #[async_trait]
    impl AttributeExtractor for FailingExtractor {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn extract(
            &self,
            _text: Option<&str>,
            _image: Option<&[u8]>,
        ) -> Result<PCCaseAttributes, ExtractionError> {
            Err(ExtractionError::InvalidResponse("nonsense".to_string()))
        }
    }

    struct CountingRenderer(Arc<AtomicUsize>);

    #[async_trait]
    impl ImageRenderer for CountingRenderer {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn render(&self, _req: &RenderRequest) -> Result<String, RenderError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("aW1hZ2U=".to_string())
        }
    }

    fn request() -> RenderRequest {
        RenderRequest {
            prompt: "A high-resolution render of a PC case.".to_string(),
            negative_prompt: None,
            seed: Some(202),
            format: ImageFormat::Jpeg,
        }
    }

    #[tokio::test]
    async fn test_renderer_falls_through_to_placeholder() {
        let chain = RendererChain::new(vec![Box::new(FailingRenderer), Box::new(FailingRenderer)]);
        assert_eq!(chain.names(), vec!["failing", "failing", "placeholder"]);
        let rendered = chain.render(&request()).await;
        assert_eq!(rendered.provider, "placeholder");
        assert_eq!(rendered.image_base64, PLACEHOLDER_PNG_BASE64);
    }

    #[tokio::test]
    async fn test_renderer_stops_at_first_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = RendererChain::new(vec![
            Box::new(FailingRenderer),
            Box::new(CountingRenderer(calls.clone())),
            Box::new(CountingRenderer(calls.clone())),
        ]);
        let rendered = chain.render(&request()).await;
        assert_eq!(rendered.provider, "counting");
        assert_eq!(rendered.image_base64, "aW1hZ2U=");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_renderer_chain() {
        let chain = RendererChain::new(vec![]);
        assert_eq!(chain.names(), vec!["placeholder"]);
        assert_eq!(chain.render(&request()).await.provider, "placeholder");
    }

    #[tokio::test]
    async fn test_extractor_fallback() {
        let chain = ExtractorChain::new(vec![Box::new(FailingExtractor), Box::new(KeywordExtractor)]);
        let attrs = chain.extract(Some("a steampunk cube"), None).await;
        assert_eq!(attrs.shape, Some(vec!["Cube".to_string()]));
        assert_eq!(attrs.style, Some(vec!["Steampunk".to_string()]));
    }

    #[tokio::test]
    async fn test_extractor_degrades_to_empty() {
        let chain = ExtractorChain::new(vec![Box::new(FailingExtractor)]);
        let attrs = chain.extract(Some("a steampunk cube"), None).await;
        assert!(attrs.is_empty());
    }
}
