//! LLM-backed attribute extraction over the OpenAI chat-completions API.
//!

use async_trait::async_trait;
use base64::Engine;
use dazzign_shared::attributes::PCCaseAttributes;
use serde_json::{json, Value};
use tracing::debug;

use super::{AttributeExtractor, ExtractionError};
use crate::config::OpenAiSettings;

const SYSTEM_PROMPT: &str = r#"You are an AI assistant whose job is to extract structured PC case design attributes from a free-form user prompt.

Please extract the following attributes **as arrays of English strings**:

- color: Main and accent colors (e.g., "Black", "Red", "Navy Blue", "Gold").
- style: Design style or theme (e.g., "Minimalist", "Futuristic", "Steampunk", "Cthulhu-Ghibli").
- shape: Form factor or silhouette (e.g., "Mid-Tower", "Cube", "Spherical", "Open-Frame").
- material: Construction materials (e.g., "Aluminum", "Tempered Glass", "Wood", "Acrylic").
- ventilation: Vent and airflow features (e.g., "Mesh Front", "Side Vents", "Open-Air Design").
- lighting: Lighting setup (e.g., "ARGB Fans", "LED Strips", "Ambient Glow", "No Lighting").
- features: Functional features (e.g., "Water Cooling", "Vertical GPU Mount", "Cable Management", "LCD Display").
- environment: Visual setting or background (e.g., "Dark Room", "On a Gaming Desk", "Futuristic Lab").

You MUST follow these rules:
1. Return a **single JSON object** containing only the keys that were confidently extracted.
2. Each attribute must be represented as an **array** of strings, even if only one value is extracted.
3. All extracted values must be in **English**, even if the user input is in another language.
4. If no attribute can be extracted, return an **empty JSON object**: `{}`.
5. Do NOT add any explanations or extra text. Output ONLY the JSON object.
6. If an image is supplied, describe the case shown in it using the same attributes.

Below are a few examples:

User Prompt: "我想要一個木頭風格的中塔機殼，有RGB燈條和側邊透氣孔，內建水冷，整體走日系極簡風，擺在書桌上很好看"
Output:
{"material": ["Wood"], "shape": ["Mid-Tower"], "lighting": ["RGB Lighting"], "ventilation": ["Side Vents"], "features": ["Water Cooling"], "style": ["Minimalist", "Japanese"], "environment": ["On a Desk"]}

---

User Prompt: "A cyberpunk cube case with open sides, neon ARGB glow, and vertical GPU mount. It should be small and look good in a dark gaming room."
Output:
{"style": ["Cyberpunk"], "shape": ["Cube", "Compact"], "ventilation": ["Open-Air Design"], "lighting": ["ARGB Lighting", "Neon"], "features": ["Vertical GPU Mount"], "environment": ["Dark Room", "Gaming Setup"]}
"#;

const TEMPERATURE: f32 = 0.1;

/// Best-effort content type from the image's magic bytes.
fn sniff_mime(image: &[u8]) -> &'static str {
    if image.starts_with(b"\x89PNG") {
        "image/png"
    } else if image.len() >= 12 && &image[..4] == b"RIFF" && &image[8..12] == b"WEBP" {
        "image/webp"
    } else if image.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "image/jpeg"
    }
}

/// Pull the attributes out of the assistant's reply, tolerating a Markdown code fence around the JSON.
pub(crate) fn parse_attributes(content: &str) -> Result<PCCaseAttributes, ExtractionError> {
    let trimmed = content.trim();
    let body = match trimmed.strip_prefix("```") {
        Some(fenced) => {
            let fenced = fenced.strip_prefix("json").unwrap_or(fenced);
            fenced.strip_suffix("```").unwrap_or(fenced).trim()
        }
        None => trimmed,
    };
    serde_json::from_str(body).map_err(|err| {
        let excerpt: String = body.chars().take(200).collect();
        ExtractionError::InvalidResponse(format!("{err}: {excerpt}"))
    })
}

pub struct OpenAiExtractor {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_url: String,
}

impl OpenAiExtractor {
    pub fn new(settings: &OpenAiSettings, api_key: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            client,
            api_key,
            model: settings.model.clone(),
            api_url: settings.api_url.clone(),
        })
    }

    fn request_body(&self, text: Option<&str>, image: Option<&[u8]>) -> Value {
        let text = text.unwrap_or("Describe the PC case in the attached image.");
        let user_content = match image {
            Some(image) => {
                let data_url = format!(
                    "data:{};base64,{}",
                    sniff_mime(image),
                    base64::engine::general_purpose::STANDARD.encode(image)
                );
                json!([
                    {"type": "text", "text": text},
                    {"type": "image_url", "image_url": {"url": data_url}}
                ])
            }
            None => Value::String(text.to_string()),
        };

        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_content}
            ],
            "temperature": TEMPERATURE,
        })
    }
}

#[async_trait]
impl AttributeExtractor for OpenAiExtractor {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn extract(
        &self,
        text: Option<&str>,
        image: Option<&[u8]>,
    ) -> Result<PCCaseAttributes, ExtractionError> {
        if text.is_none() && image.is_none() {
            return Ok(PCCaseAttributes::default());
        }

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(text, image))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ExtractionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response_json: Value = response.json().await?;
        let content = response_json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                ExtractionError::InvalidResponse("no message content in completion".to_string())
            })?;
        debug!(model = %self.model, "Extractor response: {content}");

        parse_attributes(content)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::routing::post;
    use axum::{Json, Router};

    use super::*;

    fn settings(api_url: String) -> OpenAiSettings {
        OpenAiSettings {
            api_key: None,
            model: "gpt-4o".to_string(),
            api_url,
            timeout: Duration::from_secs(5),
        }
    }

    async fn fake_api(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake API");
        let addr = listener.local_addr().expect("No local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Fake API died");
        });
        format!("http://{addr}/v1/chat/completions")
    }

    #[test]
    fn test_parse_attributes() {
        let attrs = parse_attributes(r#"{"shape": ["Cube"], "style": ["Cyberpunk"]}"#).unwrap();
        assert_eq!(attrs.shape, Some(vec!["Cube".to_string()]));

        let attrs =
            parse_attributes("```json\n{\"lighting\": [\"Neon\"]}\n```").expect("Fenced JSON");
        assert_eq!(attrs.lighting, Some(vec!["Neon".to_string()]));

        assert!(parse_attributes("{}").unwrap().is_empty());
        assert!(matches!(
            parse_attributes("Sorry, I can't help with that"),
            Err(ExtractionError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_request_body_with_image() {
        let extractor =
            OpenAiExtractor::new(&settings("http://localhost".to_string()), "key".to_string())
                .unwrap();
        let body = extractor.request_body(Some("make it blue"), Some(&b"\x89PNG\r\n"[..]));
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        let parts = &body["messages"][1]["content"];
        assert_eq!(parts[0]["text"], "make it blue");
        assert!(parts[1]["image_url"]["url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));

        let body = extractor.request_body(Some("plain"), None);
        assert_eq!(body["messages"][1]["content"], "plain");
    }

    #[tokio::test]
    async fn test_extract_against_fake_api() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "gpt-4o");
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "```json\n{\"shape\": [\"Cube\"], \"mood\": [\"calm\"]}\n```"}}]
                }))
            }),
        );
        let url = fake_api(router).await;
        let extractor = OpenAiExtractor::new(&settings(url), "key".to_string()).unwrap();
        let attrs = extractor
            .extract(Some("a cube"), None)
            .await
            .expect("Extraction should succeed");
        assert_eq!(attrs.shape, Some(vec!["Cube".to_string()]));
        assert!(attrs.style.is_none());
    }

    #[tokio::test]
    async fn test_extract_api_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (axum::http::StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let url = fake_api(router).await;
        let extractor = OpenAiExtractor::new(&settings(url), "nope".to_string()).unwrap();
        match extractor.extract(Some("a cube"), None).await {
            Err(ExtractionError::Api { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("Expected an API error, got {other:?}"),
        }
    }
}
