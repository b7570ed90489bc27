use async_trait::async_trait;

use super::{ImageRenderer, RenderError, RenderRequest};

/// A 1x1 transparent PNG.
pub const PLACEHOLDER_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// Last renderer in every chain. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    pub fn image(&self) -> String {
        PLACEHOLDER_PNG_BASE64.to_string()
    }
}

#[async_trait]
impl ImageRenderer for PlaceholderRenderer {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    async fn render(&self, _req: &RenderRequest) -> Result<String, RenderError> {
        Ok(self.image())
    }
}
