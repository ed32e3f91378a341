use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::ParseEnumError;

/// Kind of catalog entry
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TitleType {
    #[default]
    Movie,
    #[serde(alias = "tv", alias = "tv_series", alias = "show")]
    Series,
}

impl TitleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleType::Movie => "movie",
            TitleType::Series => "series",
        }
    }

    /// Path segment TMDB uses for this kind
    pub fn tmdb_path(&self) -> &'static str {
        match self {
            TitleType::Movie => "movie",
            TitleType::Series => "tv",
        }
    }
}

impl std::fmt::Display for TitleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TitleType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" | "film" => Ok(TitleType::Movie),
            "series" | "tv" | "tv_series" | "show" => Ok(TitleType::Series),
            other => Err(ParseEnumError::new("title type", other)),
        }
    }
}

impl TryFrom<String> for TitleType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A movie or TV series catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    pub id: Uuid,
    /// Catalog source key, unique when present
    pub external_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub title_type: TitleType,
    pub year: Option<i32>,
    pub genres: Vec<String>,
    pub synopsis: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    /// Runtime in minutes
    pub runtime: Option<i32>,
    pub cast: Vec<String>,
    pub crew: Vec<String>,
    /// Average rating on a 0-5 scale
    pub rating: Option<f32>,
    pub created_at: DateTime<Utc>,
}

impl Title {
    /// Creates a bare title with a fresh id
    pub fn new(name: impl Into<String>, title_type: TitleType) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id: None,
            name: name.into(),
            title_type,
            year: None,
            genres: Vec::new(),
            synopsis: None,
            poster_url: None,
            backdrop_url: None,
            runtime: None,
            cast: Vec::new(),
            crew: Vec::new(),
            rating: None,
            created_at: Utc::now(),
        }
    }

    /// Case-insensitive substring match on the name
    pub fn name_matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }

    pub fn shares_genre_with(&self, other: &Title) -> bool {
        self.genres.iter().any(|g| other.genres.contains(g))
    }
}

/// Body of `POST /api/titles` for locally authored titles
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTitleRequest {
    #[validate(length(min = 1, max = 300, message = "Name is required"))]
    pub name: String,
    #[serde(rename = "type", default)]
    pub title_type: TitleType,
    #[validate(range(min = 1870, max = 2200, message = "Year is out of range"))]
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub synopsis: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    #[validate(range(min = 1, message = "Runtime must be positive"))]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub crew: Vec<String>,
}

impl From<CreateTitleRequest> for Title {
    fn from(request: CreateTitleRequest) -> Self {
        Self {
            year: request.year,
            genres: request.genres,
            synopsis: request.synopsis,
            poster_url: request.poster_url,
            backdrop_url: request.backdrop_url,
            runtime: request.runtime,
            cast: request.cast,
            crew: request.crew,
            ..Title::new(request.name, request.title_type)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_title() {
        let title = Title::new("Dune", TitleType::Movie);
        assert_eq!(title.name, "Dune");
        assert_eq!(title.title_type, TitleType::Movie);
        assert!(title.external_id.is_none());
        assert!(title.genres.is_empty());
    }

    #[test]
    fn test_title_type_serialization() {
        assert_eq!(serde_json::to_string(&TitleType::Movie).unwrap(), "\"movie\"");
        assert_eq!(serde_json::to_string(&TitleType::Series).unwrap(), "\"series\"");

        let tv: TitleType = serde_json::from_str("\"tv\"").unwrap();
        assert_eq!(tv, TitleType::Series);
    }

    #[test]
    fn test_title_type_parse() {
        assert_eq!("TV".parse::<TitleType>().unwrap(), TitleType::Series);
        assert_eq!("movie".parse::<TitleType>().unwrap(), TitleType::Movie);
        assert!("podcast".parse::<TitleType>().is_err());
    }

    #[test]
    fn test_name_matches_is_case_insensitive_substring() {
        let title = Title::new("Blade Runner 2049", TitleType::Movie);
        assert!(title.name_matches("blade runner"));
        assert!(title.name_matches("2049"));
        assert!(!title.name_matches("Dune"));
    }

    #[test]
    fn test_title_serializes_camel_case() {
        let mut title = Title::new("The Bear", TitleType::Series);
        title.external_id = Some("136315".to_string());
        let json = serde_json::to_value(&title).unwrap();
        assert_eq!(json["externalId"], "136315");
        assert_eq!(json["type"], "series");
        assert!(json.get("posterUrl").is_some());
    }
}
