//! Blog Post Model

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Blog post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    /// Markdown source; rendered by the front end
    pub body: String,
    pub cover_image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// `None` while still a draft
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Post {
    pub fn is_published(&self, now: i64) -> bool {
        self.published_at.is_some_and(|p| p <= now)
    }
}

/// Create post payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCreate {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub body: String,
    pub cover_image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    pub published_at: Option<i64>,
}

/// Update post payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub excerpt: Option<Option<String>>,
    pub body: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub cover_image: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub published_at: Option<Option<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drafts_and_scheduled_posts_stay_hidden() {
        let mut post: Post = serde_json::from_str(
            r#"{"id":"p1","slug":"tintes-naturales","title":"Tintes naturales","excerpt":null,
                "body":"...","cover_image":null,"tags":null,"published_at":null,
                "created_at":0,"updated_at":0}"#,
        )
        .unwrap();
        assert!(post.tags.is_empty());
        assert!(!post.is_published(1_000));

        post.published_at = Some(500);
        assert!(post.is_published(500));
        assert!(!post.is_published(499));
    }

    #[test]
    fn test_update_distinguishes_unpublish_from_untouched() {
        let untouched: PostUpdate = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(untouched.published_at, None);

        let unpublish: PostUpdate = serde_json::from_str(r#"{"published_at":null}"#).unwrap();
        assert_eq!(unpublish.published_at, Some(None));
    }
}
