use super::Configuration;

/// How many articles the home page lists.
pub struct RecentArticleCount;

impl Configuration for RecentArticleCount {
    type Type = i64;

    fn default() -> Option<Self::Type> {
        Some(database::schema::cms::DEFAULT_RECENT_LIMIT)
    }

    fn key() -> &'static str {
        "recent-article-count"
    }
}
