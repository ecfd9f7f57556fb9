use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// How many related articles an article page lists
pub const RELATED_POSTS_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bio: None,
            avatar_url: None,
        }
    }

    /// Shown in place of a missing avatar
    pub fn initial(&self) -> Option<char> {
        self.name.trim_start().chars().next()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    /// Used in `/blog?category=` links
    pub id: SmolStr,
    pub name: String,
}

/// A published article as handed over by the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub slug: SmolStr,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub tags: Vec<SmolStr>,
    /// Markdown body with embedded LaTeX and fenced code
    pub content: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub featured_image: Option<String>,
}

impl Post {
    pub fn new(title: impl Into<String>, slug: impl Into<SmolStr>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            excerpt: String::new(),
            tags: Vec::new(),
            content: content.into(),
            published_at: None,
            author: None,
            category: None,
            featured_image: None,
        }
    }

    /// Pick up to `limit` other posts to list under this one, newest first.
    ///
    /// When this post has a category only posts in the same category count.
    /// Undated posts sort last.
    pub fn related<'p>(&self, candidates: &'p [Post], limit: usize) -> Vec<&'p Post> {
        let category = self.category.as_ref().map(|c| &c.id);
        let mut related: Vec<&Post> = candidates
            .iter()
            .filter(|post| post.slug != self.slug)
            .filter(|post| match category {
                Some(id) => post.category.as_ref().is_some_and(|c| &c.id == id),
                None => true,
            })
            .collect();
        related.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        related.truncate(limit);
        related
    }
}
