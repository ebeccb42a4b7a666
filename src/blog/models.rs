use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Article record as returned by the dev.to articles endpoint. Only the
/// fields the site renders are kept; everything else is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawBlogPost {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub social_image: Option<String>,
    pub url: String,
    pub readable_publish_date: String,
    pub user: RawBlogAuthor,
    #[serde(default)]
    pub tag_list: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawBlogAuthor {
    pub name: String,
    pub profile_image: String,
}

/// Normalized post summary rendered by the blog cards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogSummary {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub post_url: String,
    pub published_date: String,
    pub user_full_name: String,
    pub user_profile_image_url: String,
    #[serde(default)]
    pub tag_list: Vec<String>,
}

impl From<RawBlogPost> for BlogSummary {
    fn from(raw: RawBlogPost) -> Self {
        Self {
            title: raw.title,
            description: raw.description,
            image_url: raw.cover_image.or(raw.social_image),
            post_url: raw.url,
            published_date: raw.readable_publish_date,
            user_full_name: raw.user.name,
            user_profile_image_url: raw.user.profile_image,
            tag_list: raw.tag_list.unwrap_or_default(),
        }
    }
}

/// What gets persisted under the cache key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedBlogSnapshot {
    #[serde(rename = "date")]
    pub fetched_at: DateTime<Utc>,
    pub posts: Vec<BlogSummary>,
}
