use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One worklist item: a place to fetch, identified by a cityId_typeCode_seq
/// string and the page URL it lives at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub url: String,
}

/// Unprocessed scrape result for one place. Numeric-looking fields stay
/// strings until normalization; extraction only defaults them, it never
/// fails on them.
#[derive(Debug, Clone, Default)]
pub struct RawEntity {
    pub name: String,
    pub address: String,
    pub rating: String,
    pub latitude: String,
    pub longitude: String,
    pub properties: Vec<String>,
    pub description: String,
    pub reviews: Vec<RawReview>,
    pub url: String,
}

/// One unprocessed review, appended during pagination.
#[derive(Debug, Clone, Default)]
pub struct RawReview {
    pub title: String,
    pub description: String,
    pub rating: String,
    pub date: String,
    pub url: String,
}

/// Community QA post as read from the posts corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub url: String,
    pub title: String,
    pub question: String,
    pub city: String,
    pub answers: Vec<Answer>,
}

/// One reply to a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub date: String,
    pub body: String,
}

/// Core trait implemented once per entity type. A crawler turns one worklist
/// ref into a raw entity record, including its full paginated review history.
#[async_trait::async_trait]
pub trait EntityCrawler: Send + Sync {
    /// Unique identifier for this crawler
    fn crawler_name(&self) -> &'static str;

    /// Fetch the detail page for `entity` and assemble its raw record
    async fn crawl(&self, entity: &EntityRef) -> Result<RawEntity>;
}
