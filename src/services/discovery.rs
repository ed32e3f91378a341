use std::sync::Arc;

use crate::{
    models::{ChatMessage, ChatReply, EnrichedRecommendation},
    services::{enrichment::enrich, providers::CatalogProvider, recommender::Recommender},
    storage::Storage,
};

/// Result of one discovery chat turn after enrichment
#[derive(Debug)]
pub struct ChatOutcome {
    pub message: String,
    pub recommendations: Vec<EnrichedRecommendation>,
    pub continues: bool,
}

/// Asks the recommender for a reply and resolves its suggestions.
/// A recommender failure degrades to the generic reply with nothing to resolve.
pub async fn chat(
    recommender: &dyn Recommender,
    storage: Arc<dyn Storage>,
    catalog: Option<Arc<dyn CatalogProvider>>,
    message: &str,
    history: &[ChatMessage],
) -> ChatOutcome {
    let reply = match recommender.chat(message, history).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(error = %e, recommender = recommender.name(), "Chat failed, using fallback reply");
            ChatReply::fallback()
        }
    };

    let recommendations = enrich(reply.recommendations, storage, catalog).await;

    ChatOutcome {
        message: reply.message,
        recommendations,
        continues: reply.continues,
    }
}

/// Free-text AI search. A recommender failure yields no results.
pub async fn search(
    recommender: &dyn Recommender,
    storage: Arc<dyn Storage>,
    catalog: Option<Arc<dyn CatalogProvider>>,
    query: &str,
    context: Option<String>,
) -> Vec<EnrichedRecommendation> {
    let stubs = match recommender.search(query, context).await {
        Ok(stubs) => stubs,
        Err(e) => {
            tracing::warn!(error = %e, recommender = recommender.name(), "AI search failed");
            Vec::new()
        }
    };

    enrich(stubs, storage, catalog).await
}
