//! Deduplication stores consulted before every fetch.
//!
//! Each store has its own lifetime:
//!
//! | Store | Lifetime | Durable file |
//! |-------|----------|--------------|
//! | [`VisitedRecord`] | forever, append-only | `visited_urls.txt` |
//! | [`NonArticleCache`] | TTL per entry | `non_article_urls.jsonl` |
//! | [`InFlightSet`] | one fetch + extract | none |
//!
//! All of them synchronize internally, so workers share them through an
//! `Arc` without any outer lock.

pub mod in_flight;
pub mod non_article;
pub mod visited;

pub use in_flight::InFlightSet;
pub use non_article::NonArticleCache;
pub use visited::VisitedRecord;
