use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchUsernameRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchUsernameResponse {
    pub message: String,
    /// Omitted when empty, both for free names and when no candidate is free.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl SearchUsernameResponse {
    pub const TAKEN: &'static str = "Username already exists";
    pub const AVAILABLE: &'static str = "Username is Ready to use";

    #[must_use]
    pub fn taken(suggestions: Vec<String>) -> Self {
        Self {
            message: Self::TAKEN.to_string(),
            suggestions,
        }
    }

    #[must_use]
    pub fn available() -> Self {
        Self {
            message: Self::AVAILABLE.to_string(),
            suggestions: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_suggestions_are_omitted() {
        let json = serde_json::to_value(SearchUsernameResponse::taken(Vec::new())).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "Username already exists" }));

        let json = serde_json::to_value(SearchUsernameResponse::taken(vec!["a.b".to_string()]))
            .unwrap();
        assert_eq!(json["suggestions"], serde_json::json!(["a.b"]));
    }
}
