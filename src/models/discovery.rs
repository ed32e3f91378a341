use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Title;

/// A free-text suggestion from the recommendation backend, not yet matched
/// against storage or the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestionStub {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub reason: String,
    /// Kind hint as the model sent it, usually `movie` or `tv`
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
}

fn default_kind() -> String {
    "movie".to_string()
}

impl SuggestionStub {
    pub fn new(title: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            year: None,
            genre: None,
            reason: reason.into(),
            kind: default_kind(),
        }
    }

    /// Genre then type, skipping empty values
    pub fn badges(&self) -> Vec<String> {
        [self.genre.as_deref(), Some(self.kind.as_str())]
            .into_iter()
            .flatten()
            .filter(|badge| !badge.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A suggestion matched to a concrete title
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResolvedRecommendation {
    #[serde(flatten)]
    pub title: Title,
    pub reason: String,
    pub badges: Vec<String>,
    resolved: bool,
}

/// A suggestion that matched nothing, echoed back as-is
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UnresolvedRecommendation {
    pub name: String,
    pub year: Option<i32>,
    #[serde(rename = "type")]
    pub kind: String,
    pub genres: Vec<String>,
    pub reason: String,
    pub badges: Vec<String>,
    resolved: bool,
}

/// Output of the enrichment routine, one per suggestion
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum EnrichedRecommendation {
    Resolved(ResolvedRecommendation),
    Unresolved(UnresolvedRecommendation),
}

impl EnrichedRecommendation {
    pub fn resolved(title: Title, stub: &SuggestionStub) -> Self {
        EnrichedRecommendation::Resolved(ResolvedRecommendation {
            title,
            reason: stub.reason.clone(),
            badges: stub.badges(),
            resolved: true,
        })
    }

    pub fn unresolved(stub: &SuggestionStub) -> Self {
        EnrichedRecommendation::Unresolved(UnresolvedRecommendation {
            name: stub.title.clone(),
            year: stub.year,
            kind: stub.kind.clone(),
            genres: stub.genre.iter().cloned().collect(),
            reason: stub.reason.clone(),
            badges: stub.badges(),
            resolved: false,
        })
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, EnrichedRecommendation::Resolved(_))
    }

    pub fn name(&self) -> &str {
        match self {
            EnrichedRecommendation::Resolved(r) => &r.title.name,
            EnrichedRecommendation::Unresolved(u) => &u.name,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            EnrichedRecommendation::Resolved(r) => &r.reason,
            EnrichedRecommendation::Unresolved(u) => &u.reason,
        }
    }

    pub fn title(&self) -> Option<&Title> {
        match self {
            EnrichedRecommendation::Resolved(r) => Some(&r.title),
            EnrichedRecommendation::Unresolved(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the discovery conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Parsed reply from the recommendation backend
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub message: String,
    pub recommendations: Vec<SuggestionStub>,
    pub continues: bool,
}

impl ChatReply {
    pub const DEFAULT_MESSAGE: &'static str = "I'd be happy to help you find some great movies!";

    /// Reply used when the backend answered nothing usable
    pub fn fallback() -> Self {
        Self {
            message: Self::DEFAULT_MESSAGE.to_string(),
            recommendations: Vec::new(),
            continues: true,
        }
    }
}

/// Body of `POST /api/ai/chat`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 2000, message = "Message required"))]
    pub message: String,
    pub session_id: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub recommendations: Vec<EnrichedRecommendation>,
    pub conversation_continues: bool,
    pub session_id: String,
}

/// Body of `POST /api/ai/search`
#[derive(Debug, Deserialize, Validate)]
pub struct AiSearchRequest {
    #[validate(length(min = 1, max = 500, message = "Query required"))]
    pub query: String,
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AiSearchResponse {
    pub results: Vec<EnrichedRecommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TitleType;

    #[test]
    fn test_badges_keep_genre_then_type() {
        let stub = SuggestionStub {
            genre: Some("Comedy".to_string()),
            kind: "tv".to_string(),
            ..SuggestionStub::new("The Bear", "kitchen chaos")
        };
        assert_eq!(stub.badges(), vec!["Comedy", "tv"]);
    }

    #[test]
    fn test_badges_skip_empty_genre() {
        let stub = SuggestionStub {
            genre: Some("  ".to_string()),
            ..SuggestionStub::new("Heat", "")
        };
        assert_eq!(stub.badges(), vec!["movie"]);
    }

    #[test]
    fn test_stub_defaults_missing_fields() {
        let stub: SuggestionStub = serde_json::from_str(r#"{"title":"Arrival"}"#).unwrap();
        assert_eq!(stub.title, "Arrival");
        assert_eq!(stub.reason, "");
        assert_eq!(stub.kind, "movie");
        assert!(stub.year.is_none());
    }

    #[test]
    fn test_unresolved_serialization() {
        let stub = SuggestionStub {
            year: Some(1999),
            genre: Some("Drama".to_string()),
            kind: "tv".to_string(),
            ..SuggestionStub::new("Nonexistent Film XYZ", "test")
        };
        let json = serde_json::to_value(EnrichedRecommendation::unresolved(&stub)).unwrap();

        assert_eq!(json["resolved"], false);
        assert_eq!(json["name"], "Nonexistent Film XYZ");
        assert_eq!(json["year"], 1999);
        assert_eq!(json["type"], "tv");
        assert_eq!(json["badges"], serde_json::json!(["Drama", "tv"]));
        assert_eq!(json["genres"][0], "Drama");
        assert_eq!(json["reason"], "test");
    }

    #[test]
    fn test_resolved_serialization_flattens_title() {
        let title = Title::new("Dune", TitleType::Movie);
        let stub = SuggestionStub::new("dune", "spice");
        let json = serde_json::to_value(EnrichedRecommendation::resolved(title.clone(), &stub)).unwrap();

        assert_eq!(json["resolved"], true);
        assert_eq!(json["id"], title.id.to_string());
        assert_eq!(json["name"], "Dune");
        assert_eq!(json["reason"], "spice");
        assert_eq!(json["badges"][0], "movie");
    }
}
