//! OpenAI-compatible model listing types

use serde::{Deserialize, Serialize};

/// Model entry (OpenAI format)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelObject {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
}

impl ModelObject {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: "model".to_string(),
            created: chrono::Utc::now().timestamp(),
            owned_by: "nexus".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub object: String,
    pub data: Vec<ModelObject>,
}

impl ModelsResponse {
    pub fn new(models: Vec<ModelObject>) -> Self {
        Self {
            object: "list".to_string(),
            data: models,
        }
    }
}
