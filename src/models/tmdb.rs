// ============================================================================
// TMDB API Types
// ============================================================================

use serde::Deserialize;

/// Movie or TV record as returned by TMDB list and detail endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbTitle {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    /// Present on list endpoints
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    /// Present on detail endpoints
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub episode_run_time: Vec<i32>,
    #[serde(default)]
    pub media_type: Option<String>,
}

/// Paged list envelope
#[derive(Debug, Deserialize)]
pub struct TmdbPage {
    #[serde(default)]
    pub results: Vec<TmdbTitle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TmdbGenreList {
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
    #[serde(default)]
    pub crew: Vec<TmdbCrewMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCastMember {
    pub name: String,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCrewMember {
    pub name: String,
    #[serde(default)]
    pub job: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tmdb_movie_deserialization() {
        let json = r#"{
            "id": 438631,
            "title": "Dune",
            "overview": "Paul Atreides...",
            "poster_path": "/d5NXSklXo0qyIYkgV94XAgMIckC.jpg",
            "backdrop_path": null,
            "release_date": "2021-09-15",
            "genre_ids": [878, 12],
            "vote_average": 7.8,
            "media_type": "movie"
        }"#;

        let title: TmdbTitle = serde_json::from_str(json).unwrap();
        assert_eq!(title.id, 438631);
        assert_eq!(title.title.as_deref(), Some("Dune"));
        assert_eq!(title.genre_ids, vec![878, 12]);
        assert!(title.backdrop_path.is_none());
        assert!(title.episode_run_time.is_empty());
    }

    #[test]
    fn test_tmdb_page_tolerates_missing_results() {
        let page: TmdbPage = serde_json::from_str("{}").unwrap();
        assert!(page.results.is_empty());
    }
}
