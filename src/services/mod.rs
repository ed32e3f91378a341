pub mod discovery;
pub mod enrichment;
pub mod feed;
pub mod providers;
pub mod recommender;

pub use providers::{CatalogProvider, TmdbProvider};
pub use recommender::{OpenAiRecommender, Recommender};
