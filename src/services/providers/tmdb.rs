/// TMDB catalog provider
///
/// API flow:
/// 1. Genres: /genre/movie/list + /genre/tv/list, loaded once at construction
/// 2. Lists: /search/multi, /trending/all/{window}, /{kind}/popular, /{kind}/top_rated,
///    /{kind}/{id}/similar
/// 3. Details: /{kind}/{id}
/// 4. Credits: /{kind}/{id}/credits, fetched per hit in parallel
use crate::{
    cached,
    config::Config,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        tmdb::{TmdbCredits, TmdbGenreList, TmdbPage, TmdbTitle},
        Title, TitleType,
    },
    services::providers::{CatalogProvider, TimeWindow},
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use std::{collections::HashMap, sync::Arc};

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const LIST_CACHE_TTL: u64 = 21600; // 6 hours
const DETAILS_CACHE_TTL: u64 = 604800; // 1 week

const LIST_LIMIT: usize = 20;
const SIMILAR_LIMIT: usize = 10;
const CAST_LIMIT: usize = 10;
const CREW_JOBS: [&str; 3] = ["Director", "Writer", "Creator"];

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_url: String,
    cache: Option<Cache>,
    /// Genre id → name for movies and TV, loaded once at startup
    genres: Arc<HashMap<u32, String>>,
}

impl TmdbProvider {
    /// Creates the provider and loads the genre table.
    ///
    /// A failed genre load leaves the table empty; titles then come back without genres.
    pub async fn new(config: &Config, api_key: String, cache: Option<Cache>) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.catalog_timeout())
            .build()?;

        let mut provider = Self {
            http_client,
            api_key,
            api_url: config.tmdb_api_url.trim_end_matches('/').to_string(),
            image_url: config.tmdb_image_url.trim_end_matches('/').to_string(),
            cache,
            genres: Arc::new(HashMap::new()),
        };

        match provider.load_genres().await {
            Ok(genres) => {
                tracing::info!(genres_count = genres.len(), "Loaded TMDB genre table");
                provider.genres = Arc::new(genres);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load TMDB genres, continuing without them");
            }
        }

        Ok(provider)
    }

    async fn load_genres(&self) -> AppResult<HashMap<u32, String>> {
        let (movie, tv) = tokio::try_join!(
            self.request::<TmdbGenreList>("/genre/movie/list", &[]),
            self.request::<TmdbGenreList>("/genre/tv/list", &[]),
        )?;

        Ok(movie
            .genres
            .into_iter()
            .chain(tv.genres)
            .map(|genre| (genre.id, genre.name))
            .collect())
    }

    /// GETs a TMDB endpoint and decodes the JSON body
    async fn request<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("TMDB resource {} not found", path)));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn credits(&self, id: u64, kind: TitleType) -> AppResult<TmdbCredits> {
        self.request(&format!("/{}/{}/credits", kind.tmdb_path(), id), &[])
            .await
    }

    fn image(&self, path: Option<&str>, size: &str) -> Option<String> {
        path.filter(|p| !p.is_empty())
            .map(|p| format!("{}/{}{}", self.image_url, size, p))
    }

    /// Maps a TMDB record plus its credits into a [`Title`]
    fn convert(&self, tmdb: TmdbTitle, kind: TitleType, credits: TmdbCredits) -> Title {
        let name = tmdb.title.clone().or(tmdb.name.clone()).unwrap_or_default();

        let year = tmdb
            .release_date
            .as_deref()
            .or(tmdb.first_air_date.as_deref())
            .and_then(parse_year);

        let runtime = match kind {
            TitleType::Movie => tmdb.runtime,
            TitleType::Series => tmdb.episode_run_time.first().copied(),
        };

        let genres = if tmdb.genre_ids.is_empty() {
            tmdb.genres.iter().map(|g| g.name.clone()).collect()
        } else {
            tmdb.genre_ids
                .iter()
                .filter_map(|id| self.genres.get(id).cloned())
                .collect()
        };

        let mut cast = credits.cast;
        cast.sort_by_key(|member| member.order);
        let cast = cast
            .into_iter()
            .take(CAST_LIMIT)
            .map(|member| member.name)
            .collect();

        let crew = credits
            .crew
            .into_iter()
            .filter(|member| CREW_JOBS.contains(&member.job.as_str()))
            .map(|member| member.name)
            .collect();

        Title {
            external_id: Some(tmdb.id.to_string()),
            year,
            genres,
            synopsis: tmdb.overview.clone().filter(|s| !s.is_empty()),
            poster_url: self.image(tmdb.poster_path.as_deref(), "w500"),
            backdrop_url: self.image(tmdb.backdrop_path.as_deref(), "w1280"),
            runtime,
            cast,
            crew,
            rating: tmdb.vote_average.map(rescale_rating),
            ..Title::new(name, kind)
        }
    }

    /// Fetches credits for every hit in parallel and converts in the original order
    async fn hydrate(&self, hits: Vec<(TmdbTitle, TitleType)>) -> Vec<Title> {
        let mut tasks = Vec::with_capacity(hits.len());

        for (hit, kind) in hits {
            let provider = self.clone();
            let task = tokio::spawn(async move {
                let credits = match provider.credits(hit.id, kind).await {
                    Ok(credits) => credits,
                    Err(e) => {
                        tracing::warn!(error = %e, tmdb_id = hit.id, "Credits fetch failed");
                        TmdbCredits::default()
                    }
                };
                provider.convert(hit, kind, credits)
            });
            tasks.push(task);
        }

        let mut titles = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(title) => titles.push(title),
                Err(e) => tracing::error!(error = %e, "Task join error"),
            }
        }
        titles
    }

    async fn fetch_list(
        &self,
        path: &str,
        params: &[(&str, &str)],
        kind: Option<TitleType>,
        limit: usize,
    ) -> AppResult<Vec<Title>> {
        let page: TmdbPage = self.request(path, params).await?;

        let hits: Vec<(TmdbTitle, TitleType)> = page
            .results
            .into_iter()
            .filter_map(|hit| {
                let kind = kind.or_else(|| media_kind(hit.media_type.as_deref()))?;
                Some((hit, kind))
            })
            .take(limit)
            .collect();

        let titles = self.hydrate(hits).await;

        tracing::info!(
            path = %path,
            results = titles.len(),
            provider = "tmdb",
            "Catalog list fetched"
        );

        Ok(titles)
    }

    async fn fetch_details(&self, external_id: &str, kind: TitleType) -> AppResult<Option<Title>> {
        let id: u64 = external_id.parse().map_err(|_| {
            AppError::InvalidInput(format!("Invalid TMDB id: {}", external_id))
        })?;

        let path = format!("/{}/{}", kind.tmdb_path(), id);
        let (details, credits) = tokio::join!(
            self.request::<TmdbTitle>(&path, &[]),
            self.credits(id, kind)
        );

        let details = match details {
            Ok(details) => details,
            Err(AppError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let credits = credits.unwrap_or_else(|e| {
            tracing::warn!(error = %e, tmdb_id = id, "Credits fetch failed");
            TmdbCredits::default()
        });

        Ok(Some(self.convert(details, kind, credits)))
    }
}

/// Maps TMDB's `media_type` to a title kind; people and unknown types are skipped
fn media_kind(media_type: Option<&str>) -> Option<TitleType> {
    match media_type {
        Some("movie") => Some(TitleType::Movie),
        Some("tv") => Some(TitleType::Series),
        _ => None,
    }
}

fn parse_year(date: &str) -> Option<i32> {
    date.get(..4).and_then(|year| year.parse().ok())
}

/// TMDB votes run 0-10; titles are rated 0-5 with one decimal
fn rescale_rating(vote_average: f64) -> f32 {
    ((vote_average / 2.0 * 10.0).round() / 10.0) as f32
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn search(&self, query: &str) -> AppResult<Vec<Title>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        cached!(
            self.cache.as_ref(),
            CacheKey::CatalogSearch(query.to_string()),
            SEARCH_CACHE_TTL,
            self.fetch_list("/search/multi", &[("query", query)], None, LIST_LIMIT)
        )
    }

    async fn trending(&self, window: TimeWindow) -> AppResult<Vec<Title>> {
        let path = format!("/trending/all/{}", window.as_str());
        cached!(
            self.cache.as_ref(),
            CacheKey::Trending(window.as_str().to_string()),
            LIST_CACHE_TTL,
            self.fetch_list(&path, &[], None, LIST_LIMIT)
        )
    }

    async fn popular(&self, kind: TitleType) -> AppResult<Vec<Title>> {
        let path = format!("/{}/popular", kind.tmdb_path());
        cached!(
            self.cache.as_ref(),
            CacheKey::Popular(kind),
            LIST_CACHE_TTL,
            self.fetch_list(&path, &[], Some(kind), LIST_LIMIT)
        )
    }

    async fn top_rated(&self, kind: TitleType) -> AppResult<Vec<Title>> {
        let path = format!("/{}/top_rated", kind.tmdb_path());
        cached!(
            self.cache.as_ref(),
            CacheKey::TopRated(kind),
            LIST_CACHE_TTL,
            self.fetch_list(&path, &[], Some(kind), LIST_LIMIT)
        )
    }

    async fn details(&self, external_id: &str, kind: TitleType) -> AppResult<Option<Title>> {
        cached!(
            self.cache.as_ref(),
            CacheKey::Details(kind, external_id.to_string()),
            DETAILS_CACHE_TTL,
            self.fetch_details(external_id, kind)
        )
    }

    async fn similar(&self, external_id: &str, kind: TitleType) -> AppResult<Vec<Title>> {
        let path = format!("/{}/{}/similar", kind.tmdb_path(), external_id);
        cached!(
            self.cache.as_ref(),
            CacheKey::Similar(kind, external_id.to_string()),
            LIST_CACHE_TTL,
            self.fetch_list(&path, &[], Some(kind), SIMILAR_LIMIT)
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tmdb::{TmdbCastMember, TmdbCrewMember, TmdbGenre};

    fn create_test_provider() -> TmdbProvider {
        let genres = HashMap::from([
            (878, "Science Fiction".to_string()),
            (12, "Adventure".to_string()),
            (18, "Drama".to_string()),
        ]);

        TmdbProvider {
            http_client: HttpClient::new(),
            api_key: "test_key".to_string(),
            api_url: "http://test.local".to_string(),
            image_url: "https://image.tmdb.org/t/p".to_string(),
            cache: None,
            genres: Arc::new(genres),
        }
    }

    fn dune() -> TmdbTitle {
        serde_json::from_str(
            r#"{
                "id": 438631,
                "title": "Dune",
                "overview": "Paul Atreides...",
                "poster_path": "/poster.jpg",
                "backdrop_path": "/backdrop.jpg",
                "release_date": "2021-09-15",
                "genre_ids": [878, 12, 9999],
                "vote_average": 7.84,
                "runtime": 155
            }"#,
        )
        .unwrap()
    }

    fn credits() -> TmdbCredits {
        let cast = (0..12)
            .rev()
            .map(|order| TmdbCastMember {
                name: format!("Actor {}", order),
                order,
            })
            .collect();
        let crew = vec![
            TmdbCrewMember {
                name: "Denis Villeneuve".to_string(),
                job: "Director".to_string(),
            },
            TmdbCrewMember {
                name: "Hans Zimmer".to_string(),
                job: "Original Music Composer".to_string(),
            },
            TmdbCrewMember {
                name: "Jon Spaihts".to_string(),
                job: "Writer".to_string(),
            },
        ];
        TmdbCredits { cast, crew }
    }

    #[test]
    fn test_convert_movie() {
        let provider = create_test_provider();
        let title = provider.convert(dune(), TitleType::Movie, credits());

        assert_eq!(title.name, "Dune");
        assert_eq!(title.external_id.as_deref(), Some("438631"));
        assert_eq!(title.title_type, TitleType::Movie);
        assert_eq!(title.year, Some(2021));
        assert_eq!(title.runtime, Some(155));
        assert_eq!(title.genres, vec!["Science Fiction", "Adventure"]);
        assert_eq!(
            title.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/poster.jpg")
        );
        assert_eq!(
            title.backdrop_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w1280/backdrop.jpg")
        );
        assert_eq!(title.rating, Some(3.9));
    }

    #[test]
    fn test_convert_keeps_top_billed_cast_and_key_crew() {
        let provider = create_test_provider();
        let title = provider.convert(dune(), TitleType::Movie, credits());

        assert_eq!(title.cast.len(), 10);
        assert_eq!(title.cast[0], "Actor 0");
        assert_eq!(title.cast[9], "Actor 9");
        assert_eq!(title.crew, vec!["Denis Villeneuve", "Jon Spaihts"]);
    }

    #[test]
    fn test_convert_series_uses_first_air_date_and_episode_runtime() {
        let provider = create_test_provider();
        let tmdb: TmdbTitle = serde_json::from_str(
            r#"{
                "id": 136315,
                "name": "The Bear",
                "first_air_date": "2022-06-23",
                "episode_run_time": [30, 45],
                "genres": [{"id": 18, "name": "Drama"}],
                "poster_path": null
            }"#,
        )
        .unwrap();

        let title = provider.convert(tmdb, TitleType::Series, TmdbCredits::default());
        assert_eq!(title.name, "The Bear");
        assert_eq!(title.year, Some(2022));
        assert_eq!(title.runtime, Some(30));
        assert_eq!(title.genres, vec!["Drama"]);
        assert!(title.poster_url.is_none());
        assert!(title.rating.is_none());
        assert!(title.cast.is_empty());
    }

    #[test]
    fn test_detail_genres_used_when_ids_absent() {
        let provider = create_test_provider();
        let mut tmdb = dune();
        tmdb.genre_ids.clear();
        tmdb.genres = vec![TmdbGenre {
            id: 1,
            name: "Epic".to_string(),
        }];

        let title = provider.convert(tmdb, TitleType::Movie, TmdbCredits::default());
        assert_eq!(title.genres, vec!["Epic"]);
    }

    #[test]
    fn test_media_kind() {
        assert_eq!(media_kind(Some("movie")), Some(TitleType::Movie));
        assert_eq!(media_kind(Some("tv")), Some(TitleType::Series));
        assert_eq!(media_kind(Some("person")), None);
        assert_eq!(media_kind(None), None);
    }

    #[test]
    fn test_rescale_rating() {
        assert_eq!(rescale_rating(10.0), 5.0);
        assert_eq!(rescale_rating(7.84), 3.9);
        assert_eq!(rescale_rating(0.0), 0.0);
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2021-09-15"), Some(2021));
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("20"), None);
    }

    #[tokio::test]
    async fn test_empty_search_skips_the_network() {
        let provider = create_test_provider();
        let titles = provider.search("   ").await.unwrap();
        assert!(titles.is_empty());
    }
}
