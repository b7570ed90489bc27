//! Structured PC case design attributes
//!

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Design attributes pulled out of a free-form request. Every category is
/// optional; an absent category means "unspecified" and is left out of the
/// serialized form. Unknown keys are ignored on the way in.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PCCaseAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ventilation: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Vec<String>>,
}

impl PCCaseAttributes {
    /// True when no category carries a value.
    pub fn is_empty(&self) -> bool {
        [
            &self.shape,
            &self.style,
            &self.color,
            &self.material,
            &self.ventilation,
            &self.lighting,
            &self.features,
            &self.environment,
        ]
        .iter()
        .all(|category| category.as_ref().is_none_or(|values| values.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_categories_are_omitted() {
        let attrs = PCCaseAttributes {
            shape: Some(vec!["Cube".to_string()]),
            ..Default::default()
        };
        let encoded = serde_json::to_value(&attrs).expect("Failed to serialize");
        assert_eq!(encoded, serde_json::json!({"shape": ["Cube"]}));

        let encoded = serde_json::to_string(&PCCaseAttributes::default()).unwrap();
        assert_eq!(encoded, "{}");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let attrs: PCCaseAttributes = serde_json::from_str(
            r#"{"style": ["Cyberpunk"], "mood": ["Brooding"], "lighting": ["Neon"]}"#,
        )
        .expect("Failed to parse attributes");
        assert_eq!(attrs.style, Some(vec!["Cyberpunk".to_string()]));
        assert_eq!(attrs.lighting, Some(vec!["Neon".to_string()]));
        assert!(attrs.shape.is_none());
    }

    #[test]
    fn test_is_empty() {
        assert!(PCCaseAttributes::default().is_empty());
        assert!(PCCaseAttributes {
            color: Some(vec![]),
            ..Default::default()
        }
        .is_empty());
        assert!(!PCCaseAttributes {
            color: Some(vec!["Black".to_string()]),
            ..Default::default()
        }
        .is_empty());
    }
}
