//! Search module
//!
//! Cache-backed search over SearXNG. The HTTP layer in [`crate::handlers`]
//! validates query strings and turns them into the request types here.
//!
//! # Shapes
//!
//! ```text
//! general  categories=general  engines from caller  lang from caller
//! news     categories=news     time_range defaults to "day"
//! tech     categories=it       engines=github,stackoverflow,hackernews,google
//! images   categories=images
//! ```

pub mod service;

pub use service::{
    GeneralSearch, ImageSearch, NewsSearch, SearchService, TechSearch, DEFAULT_LANGUAGE,
    DEFAULT_NEWS_FRESHNESS, TECH_ENGINES,
};
