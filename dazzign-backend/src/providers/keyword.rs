//! Offline attribute extraction by keyword scan. Used when no LLM is
//! configured and as the last extractor in every chain.

use async_trait::async_trait;
use dazzign_shared::attributes::PCCaseAttributes;

use super::{AttributeExtractor, ExtractionError};

const SHAPES: &[&str] = &[
    "mid-tower",
    "cube",
    "spherical",
    "slim",
    "open-frame",
    "compact",
    "ultra-tower",
];
const STYLES: &[&str] = &[
    "futuristic",
    "steampunk",
    "minimalist",
    "modern",
    "sleek",
    "industrial",
    "cthulhu",
    "ghibli",
];
const COLORS: &[&str] = &[
    "black", "white", "red", "blue", "green", "silver", "gray", "gold", "brown", "navy",
];
const MATERIALS: &[&str] = &[
    "aluminum",
    "tempered glass",
    "wood",
    "acrylic",
    "steel",
    "carbon fiber",
    "glass",
];
const VENTILATION: &[&str] = &[
    "mesh",
    "side vents",
    "open-air",
    "airflow",
    "intake",
    "cooling",
];
const LIGHTING: &[&str] = &[
    "argb",
    "rgb",
    "led",
    "ambient glow",
    "neon",
    "illuminated",
    "no lighting",
];
const FEATURES: &[&str] = &[
    "lcd",
    "handle",
    "psu shroud",
    "decorative",
    "water cooling",
    "cable management",
    "vertical gpu",
];
const ENVIRONMENTS: &[&str] = &[
    "dark room",
    "spotlight",
    "studio",
    "on a desk",
    "with peripherals",
    "in a showcase",
    "in a gaming setup",
    "cyberpunk city",
    "nature background",
    "futuristic lab",
];

/// Uppercase the first letter of every word, where a word starts after any
/// non-alphabetic character ("mid-tower" becomes "Mid-Tower").
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphabetic();
    }
    out
}

fn lighting_label(keyword: &str) -> String {
    match keyword {
        "rgb" | "argb" | "led" => format!("{} lighting", keyword.to_uppercase()),
        other => title_case(other),
    }
}

fn scan(text: &str, keywords: &[&str], label: fn(&str) -> String) -> Option<Vec<String>> {
    let found: Vec<String> = keywords
        .iter()
        .filter(|keyword| text.contains(*keyword))
        .map(|keyword| label(keyword))
        .collect();
    (!found.is_empty()).then_some(found)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordExtractor;

impl KeywordExtractor {
    pub fn scan_text(&self, text: &str) -> PCCaseAttributes {
        let text = text.to_lowercase();
        PCCaseAttributes {
            shape: scan(&text, SHAPES, title_case),
            style: scan(&text, STYLES, title_case),
            color: scan(&text, COLORS, title_case),
            material: scan(&text, MATERIALS, title_case),
            ventilation: scan(&text, VENTILATION, title_case),
            lighting: scan(&text, LIGHTING, lighting_label),
            features: scan(&text, FEATURES, title_case),
            environment: scan(&text, ENVIRONMENTS, title_case),
        }
    }
}

#[async_trait]
impl AttributeExtractor for KeywordExtractor {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn extract(
        &self,
        text: Option<&str>,
        _image: Option<&[u8]>,
    ) -> Result<PCCaseAttributes, ExtractionError> {
        Ok(text.map(|t| self.scan_text(t)).unwrap_or_default())
    }
}
