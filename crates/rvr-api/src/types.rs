//! Ollama model-management wire types.

use serde::{Deserialize, Serialize};

/// An installed model, as listed by `/api/tags`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub digest: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PullRequest<'a> {
    pub model: &'a str,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

fn base_name(model: &str) -> &str {
    model.split(':').next().unwrap_or(model)
}

/// Whether `wanted` is installed, either under its exact name or under the
/// same base name with any tag (`qwen2.5` matches `qwen2.5:7b`).
pub fn model_is_available(models: &[ModelInfo], wanted: &str) -> bool {
    let wanted_base = base_name(wanted);
    models
        .iter()
        .any(|m| m.name == wanted || base_name(&m.name) == wanted_base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models(names: &[&str]) -> Vec<ModelInfo> {
        names
            .iter()
            .map(|n| ModelInfo {
                name: n.to_string(),
                modified_at: None,
                size: None,
                digest: None,
            })
            .collect()
    }

    #[test]
    fn exact_name_matches() {
        assert!(model_is_available(&models(&["qwen2.5:7b"]), "qwen2.5:7b"));
    }

    #[test]
    fn base_name_matches_any_tag() {
        let installed = models(&["qwen2.5:1.5b", "llama3.2:latest"]);
        assert!(model_is_available(&installed, "qwen2.5:7b"));
        assert!(model_is_available(&installed, "llama3.2"));
    }

    #[test]
    fn missing_model() {
        let installed = models(&["llama3.2:latest"]);
        assert!(!model_is_available(&installed, "qwen2.5:7b"));
        assert!(!model_is_available(&[], "qwen2.5:7b"));
    }

    #[test]
    fn tags_response_parses() {
        let tags: TagsResponse = serde_json::from_str(
            r#"{"models":[{"name":"qwen2.5:7b","modified_at":"2024-11-01T10:00:00Z","size":4683087332,"digest":"abc"}]}"#,
        )
        .unwrap();
        assert_eq!(tags.models.len(), 1);
        assert_eq!(tags.models[0].size, Some(4_683_087_332));
    }

    #[test]
    fn pull_request_serializes() {
        let json = serde_json::to_value(PullRequest {
            model: "qwen2.5:7b",
            stream: false,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"model": "qwen2.5:7b", "stream": false}));
    }
}
