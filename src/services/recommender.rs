//! Conversational recommendation backend
//!
//! Sends a persona prompt plus the conversation so far to an OpenAI-compatible
//! chat completion endpoint and parses the JSON reply into [`SuggestionStub`]s.

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{ChatMessage, ChatReply, ChatRole, SuggestionStub},
};

const CHAT_TEMPERATURE: f32 = 0.8;
const CHAT_MAX_TOKENS: u32 = 1500;
const SEARCH_TEMPERATURE: f32 = 0.9;

const CHAT_SYSTEM_PROMPT: &str = r#"You are a knowledgeable movie and TV show enthusiast who helps people discover content they'll love. You have extensive knowledge of movies and TV shows from all eras, genres, and regions.

Your goals:
1. Act like a friendly, enthusiastic friend who loves talking about movies
2. Provide a wide variety of movie/TV suggestions based on what the user describes
3. Think creatively about what they might enjoy based on their preferences
4. Give personalized reasons why each recommendation fits their request
5. Keep the conversation going by asking follow-up questions or offering alternatives

Guidelines:
- Suggest 3-6 diverse recommendations per response
- Include a mix of popular titles and hidden gems
- Consider different decades, genres, and styles
- Explain why each recommendation fits the request
- Be conversational and friendly, not robotic
- Ask follow-up questions to refine suggestions

Respond with a JSON object containing:
- message: your conversational reply
- recommendations: an array of objects with title, year, genre, reason, and type ("movie" or "tv")
- conversationContinues: true to keep chatting, false when wrapping up"#;

const SEARCH_SYSTEM_PROMPT: &str = "You are a movie expert who finds diverse, creative recommendations. \
     Always respond with valid JSON containing an array named recommendations.";

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Recommender: Send + Sync {
    /// One conversational turn. `history` excludes the new message.
    async fn chat(&self, message: &str, history: &[ChatMessage]) -> AppResult<ChatReply>;

    /// Free-text search, 5-8 suggestions
    async fn search(&self, query: &str, context: Option<String>) -> AppResult<Vec<SuggestionStub>>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<PromptMessage<'a>>,
    response_format: ResponseFormat,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct PromptMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiRecommender {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiRecommender {
    pub fn new(config: &Config, api_key: String) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(config.ai_timeout()).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: config.openai_api_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
        })
    }

    /// Runs one completion and returns the raw message content
    async fn complete(
        &self,
        messages: Vec<PromptMessage<'_>>,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> AppResult<String> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature,
            max_tokens,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Chat completion returned status {}: {}",
                status, body
            )));
        }

        let completion: CompletionResponse = response.json().await?;
        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl Recommender for OpenAiRecommender {
    async fn chat(&self, message: &str, history: &[ChatMessage]) -> AppResult<ChatReply> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(PromptMessage {
            role: "system",
            content: CHAT_SYSTEM_PROMPT,
        });
        messages.extend(history.iter().map(|turn| PromptMessage {
            role: match turn.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            },
            content: &turn.content,
        }));
        messages.push(PromptMessage {
            role: "user",
            content: message,
        });

        let content = self
            .complete(messages, CHAT_TEMPERATURE, Some(CHAT_MAX_TOKENS))
            .await?;
        let reply = parse_chat_reply(&content);

        tracing::info!(
            recommendations = reply.recommendations.len(),
            model = %self.model,
            "Chat completion parsed"
        );

        Ok(reply)
    }

    async fn search(&self, query: &str, context: Option<String>) -> AppResult<Vec<SuggestionStub>> {
        let prompt = search_prompt(query, context.as_deref());
        let messages = vec![
            PromptMessage {
                role: "system",
                content: SEARCH_SYSTEM_PROMPT,
            },
            PromptMessage {
                role: "user",
                content: &prompt,
            },
        ];

        let content = self.complete(messages, SEARCH_TEMPERATURE, None).await?;
        let stubs = parse_json_object(&content)
            .map(|value| parse_suggestions(&value))
            .unwrap_or_default();

        tracing::info!(query = %query, suggestions = stubs.len(), "AI search parsed");
        Ok(stubs)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

fn search_prompt(query: &str, context: Option<&str>) -> String {
    let context = context
        .filter(|c| !c.trim().is_empty())
        .map(|c| format!("\nAdditional context: {}", c))
        .unwrap_or_default();

    format!(
        r#"Find movies and TV shows that match this search: "{query}"{context}

Think broadly and creatively. Consider:
- Direct matches to the title or theme
- Titles with similar vibes, moods, or feelings
- Different interpretations of what the search might mean
- Hidden gems and popular classics
- Various genres and time periods

Provide 5-8 diverse recommendations as JSON with a recommendations array whose entries have title, year, genre, reason, and type."#
    )
}

fn parse_json_object(content: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(content) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Chat completion was not valid JSON");
            None
        }
    }
}

/// Parses a chat completion body, defaulting every missing or malformed field
pub fn parse_chat_reply(content: &str) -> ChatReply {
    let Some(value) = parse_json_object(content) else {
        return ChatReply::fallback();
    };

    let message = value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| ChatReply::DEFAULT_MESSAGE.to_string());

    // only an explicit false ends the conversation
    let continues = value.get("conversationContinues").and_then(Value::as_bool) != Some(false);

    ChatReply {
        message,
        recommendations: parse_suggestions(&value),
        continues,
    }
}

/// Reads the `recommendations` array, dropping entries without a usable title
fn parse_suggestions(value: &Value) -> Vec<SuggestionStub> {
    value
        .get("recommendations")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(parse_suggestion).collect())
        .unwrap_or_default()
}

fn parse_suggestion(entry: &Value) -> Option<SuggestionStub> {
    let title = entry
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())?;

    let year = entry.get("year").and_then(|year| match year {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().get(..4).and_then(|y| y.parse().ok()),
        _ => None,
    });

    let genre = entry
        .get("genre")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string);

    let reason = entry
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let kind = entry
        .get("type")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let mut stub = SuggestionStub {
        year,
        genre,
        ..SuggestionStub::new(title, reason)
    };
    if let Some(kind) = kind {
        stub.kind = kind;
    }
    Some(stub)
}
