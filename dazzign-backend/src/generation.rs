//! Text (and optional image) in, rendered design node out.
//!
//! The pipeline is extract, compose, render, persist. Only persistence can
//! fail a generation: extraction degrades to empty attributes and rendering
//! falls back to the placeholder image.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use base64::Engine;
use dazzign_shared::error::DazzignError;
use dazzign_shared::node::{
    GenerateRequest, NodeDraft, ToSpecRequest, ToSpecResponse, DEFAULT_NEGATIVE_PROMPT,
    DEFAULT_SEED,
};
use dazzign_shared::prompt::compose;
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::config::ProviderConfig;
use crate::db;
use crate::entity::node;
use crate::nodes::WebError;
use crate::providers::{ExtractorChain, RenderRequest, RendererChain};
use crate::SharedState;

/// Decode an optional base64 image, accepting a `data:...;base64,` prefix.
pub fn decode_image(encoded: Option<&str>) -> Result<Option<Vec<u8>>, DazzignError> {
    let Some(encoded) = encoded.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => encoded,
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map(Some)
        .map_err(|err| DazzignError::Validation(format!("image_base64 is not valid base64: {err}")))
}

pub struct Generator {
    extractors: ExtractorChain,
    renderers: RendererChain,
}

impl Generator {
    pub fn new(extractors: ExtractorChain, renderers: RendererChain) -> Self {
        Self {
            extractors,
            renderers,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, DazzignError> {
        Ok(Self::new(config.extractor_chain()?, config.renderer_chain()?))
    }

    #[instrument(level = "info", skip_all, fields(parent_id = ?req.parent_id))]
    pub async fn generate(
        &self,
        conn: &DatabaseConnection,
        req: GenerateRequest,
    ) -> Result<node::Model, DazzignError> {
        let image = decode_image(req.image_base64.as_deref())?;

        // no point paying for provider calls if the insert is going to be rejected
        if let Some(parent_id) = req.parent_id {
            if db::node::get_by_id(conn, parent_id).await?.is_none() {
                return Err(DazzignError::NotFound(format!(
                    "Parent node {} not found",
                    parent_id
                )));
            }
        }

        let attributes = match req.spec_json {
            Some(attributes) => attributes,
            None => {
                self.extractors
                    .extract(Some(&req.prompt), image.as_deref())
                    .await
            }
        };
        let structured_prompt = compose(&attributes);
        debug!("Composed prompt: {structured_prompt}");

        let render_request = RenderRequest {
            prompt: structured_prompt,
            negative_prompt: Some(
                req.negative_prompt
                    .clone()
                    .unwrap_or_else(|| DEFAULT_NEGATIVE_PROMPT.to_string()),
            ),
            seed: Some(req.seed.unwrap_or(DEFAULT_SEED)),
            format: req.output_format.unwrap_or_default(),
        };
        let rendered = self.renderers.render(&render_request).await;
        info!(provider = rendered.provider, "Rendered image");

        let request_params = json!({
            "prompt": render_request.prompt,
            "negative_prompt": render_request.negative_prompt,
            "seed": render_request.seed,
            "output_format": render_request.format,
            "provider": rendered.provider,
        });

        db::node::create(
            conn,
            NodeDraft {
                prompt: req.prompt,
                parent_id: req.parent_id,
                negative_prompt: render_request.negative_prompt,
                spec_json: Some(attributes),
                request_params: Some(request_params),
                image_base64: Some(rendered.image_base64),
                image_path: None,
                action_type: req.action_type,
            },
        )
        .await
    }

    pub async fn to_spec(&self, prompt: &str, image: Option<&[u8]>) -> ToSpecResponse {
        let attributes = self.extractors.extract(Some(prompt), image).await;
        let structured_prompt = compose(&attributes);
        ToSpecResponse {
            prompt: prompt.to_string(),
            attributes,
            structured_prompt,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/image-gen/generate",
    tag = "generation",
    request_body = GenerateRequest,
    responses(
        (status = 201, description = "Generated and stored a new node", body = node::Model),
        (status = 400, description = "Invalid input image"),
        (status = 404, description = "Parent node not found"),
    )
)]
pub async fn generate_image(
    State(state): State<SharedState>,
    Json(req): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<node::Model>), WebError> {
    let node = state.generator.generate(&state.conn, req).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

#[utoipa::path(
    post,
    path = "/api/v1/text-gen/text-to-image",
    tag = "generation",
    request_body = ToSpecRequest,
    responses(
        (status = 200, description = "Extracted attributes and the composed prompt", body = ToSpecResponse),
        (status = 400, description = "Invalid input image"),
    )
)]
pub async fn text_to_spec(
    State(state): State<SharedState>,
    Json(req): Json<ToSpecRequest>,
) -> Result<Json<ToSpecResponse>, WebError> {
    let image = decode_image(req.image_base64.as_deref())?;
    Ok(Json(
        state.generator.to_spec(&req.prompt, image.as_deref()).await,
    ))
}
