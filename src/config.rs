use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL. Without it the service runs on in-memory storage.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL for catalog response caching
    #[serde(default)]
    pub redis_url: Option<String>,

    /// TMDB API key. Without it catalog-backed features degrade to local data.
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// TMDB image CDN base URL
    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    /// OpenAI API key. Without it the AI routes answer 503.
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL
    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,

    /// Chat completion model
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Per-request timeout for catalog calls, in seconds
    #[serde(default = "default_catalog_timeout_secs")]
    pub catalog_timeout_secs: u64,

    /// Per-request timeout for chat completion calls, in seconds
    #[serde(default = "default_ai_timeout_secs")]
    pub ai_timeout_secs: u64,

    /// Deployment environment (`development` or `production`)
    #[serde(default = "default_app_env")]
    pub app_env: String,

    /// Header carrying the user id asserted by the upstream proxy
    #[serde(default = "default_identity_header")]
    pub identity_header: String,

    /// Header carrying the user name asserted by the upstream proxy
    #[serde(default = "default_identity_name_header")]
    pub identity_name_header: String,

    /// Identity injected outside production when no identity header is present
    #[serde(default = "default_dev_user_id")]
    pub dev_user_id: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_openai_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_catalog_timeout_secs() -> u64 {
    10
}

fn default_ai_timeout_secs() -> u64 {
    30
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_identity_header() -> String {
    "x-replit-user-id".to_string()
}

fn default_identity_name_header() -> String {
    "x-replit-user-name".to_string()
}

fn default_dev_user_id() -> String {
    "dev-user".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            redis_url: None,
            tmdb_api_key: None,
            tmdb_api_url: default_tmdb_api_url(),
            tmdb_image_url: default_tmdb_image_url(),
            openai_api_key: None,
            openai_api_url: default_openai_api_url(),
            openai_model: default_openai_model(),
            catalog_timeout_secs: default_catalog_timeout_secs(),
            ai_timeout_secs: default_ai_timeout_secs(),
            app_env: default_app_env(),
            identity_header: default_identity_header(),
            identity_name_header: default_identity_name_header(),
            dev_user_id: default_dev_user_id(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }

    /// Socket address string the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
