pub mod discovery;
pub mod follow;
pub mod interaction;
pub mod list;
pub mod post;
pub mod recommendation;
pub mod report;
pub mod title;
pub mod tmdb;
pub mod user;

pub use discovery::{
    AiSearchRequest, AiSearchResponse, ChatMessage, ChatReply, ChatRequest, ChatResponse,
    ChatRole, EnrichedRecommendation, SuggestionStub,
};
pub use follow::Follow;
pub use interaction::{CreateCommentRequest, Interaction, InteractionType, NewInteraction};
pub use list::{CreateListRequest, List, ListUpdate, NewList, SystemList};
pub use post::{CreatePostRequest, EnrichedPost, NewPost, Post, PostWithRefs};
pub use recommendation::{CreateRecommendationRequest, Recommendation, RecommendationWithTitle};
pub use report::{CreateReportRequest, Report, ReportStatus, UpdateReportRequest};
pub use title::{CreateTitleRequest, Title, TitleType};
pub use user::{FollowStats, UpsertUser, User};

/// Raised when a stored or submitted string is not a known enum value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enum_error_display() {
        let error = ParseEnumError::new("title type", "podcast");
        assert_eq!(error.to_string(), "unknown title type: podcast");
    }
}
