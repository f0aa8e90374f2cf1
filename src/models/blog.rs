use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PAGE_SIZE;
use crate::validation::rules::{image_url, known_category};

/// A blog post as listed by the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogSummary {
    /// The unique identifier for the blog.
    #[serde(alias = "_id")]
    pub id: String,
    /// The title of the blog.
    #[serde(default)]
    pub title: String,
    /// The category the blog is filed under.
    #[serde(default)]
    pub category: String,
    /// The body of the blog.
    #[serde(default)]
    pub content: String,
    /// The author's display name, if the remote supplied one.
    #[serde(default)]
    pub author: Option<String>,
    /// The cover image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// The timestamp when the blog was created.
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    /// The ID of the user who owns the blog.
    #[serde(rename = "userId", alias = "ownerUserId", default)]
    pub owner_user_id: String,
}

impl BlogSummary {
    /// The author name to display.
    pub fn author_label(&self) -> &str {
        self.author
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Anonymous")
    }

    /// The first `max_chars` characters of the content, with an ellipsis when cut.
    pub fn excerpt(&self, max_chars: usize) -> String {
        if self.content.chars().count() <= max_chars {
            return self.content.clone();
        }
        let cut: String = self.content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct BlogPage {
    /// The blogs on this page, in remote order.
    pub items: Vec<BlogSummary>,
    /// The 1-based page number.
    pub current_page: u32,
    /// The number of pages available.
    pub total_pages: u32,
    /// The number of blogs matching the query.
    pub total_count: u64,
}

impl BlogPage {
    /// A page with no results.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            total_pages: 1,
            total_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The filter and pagination parameters of a listing.
///
/// Changing any filter field resets the page to 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogQuerySpec {
    category: Option<String>,
    author: Option<String>,
    search_term: Option<String>,
    page: u32,
    page_size: u32,
}

impl Default for BlogQuerySpec {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl BlogQuerySpec {
    /// Creates an unfiltered spec for the first page.
    pub fn new(page_size: u32) -> Self {
        Self {
            category: None,
            author: None,
            search_term: None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search_term.as_deref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.category = non_empty(category);
        self.page = 1;
    }

    pub fn set_author(&mut self, author: Option<String>) {
        self.author = non_empty(author);
        self.page = 1;
    }

    pub fn set_search_term(&mut self, search_term: Option<String>) {
        self.search_term = non_empty(search_term);
        self.page = 1;
    }

    /// Moves to `page`. Page 0 is treated as page 1.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Builder form of `set_category`.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.set_category(Some(category.into()));
        self
    }

    /// Builder form of `set_author`.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.set_author(Some(author.into()));
        self
    }

    /// Builder form of `set_search_term`.
    pub fn with_search_term(mut self, search_term: impl Into<String>) -> Self {
        self.set_search_term(Some(search_term.into()));
        self
    }

    /// Builder form of `set_page`.
    pub fn with_page(mut self, page: u32) -> Self {
        self.set_page(page);
        self
    }

    /// Whether any filter field is set.
    pub fn has_filters(&self) -> bool {
        self.category.is_some() || self.author.is_some() || self.search_term.is_some()
    }

    /// The query string pairs sent to the remote. Empty filters are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(5);
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(author) = &self.author {
            pairs.push(("author", author.clone()));
        }
        if let Some(search) = &self.search_term {
            pairs.push(("search", search.clone()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("limit", self.page_size.to_string()));
        pairs
    }
}

/// The editable fields of a blog, used to create and update posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct BlogDraft {
    #[garde(length(chars, min = 3, max = 100))]
    pub title: String,
    #[garde(custom(known_category))]
    pub category: String,
    #[garde(length(chars, min = 10, max = 10000))]
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[garde(custom(image_url))]
    pub image: Option<String>,
}

impl BlogDraft {
    /// Creates a draft, trimming the title and dropping an empty image URL.
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        content: impl Into<String>,
        image: Option<String>,
    ) -> Self {
        Self {
            title: title.into().trim().to_string(),
            category: category.into().trim().to_string(),
            content: content.into(),
            image: non_empty(image),
        }
    }
}

impl From<&BlogSummary> for BlogDraft {
    fn from(blog: &BlogSummary) -> Self {
        Self {
            title: blog.title.clone(),
            category: blog.category.clone(),
            content: blog.content.clone(),
            image: blog.image.clone().filter(|url| !url.is_empty()),
        }
    }
}

/// The two shapes `GET /api/blog/:id` can answer with.
#[derive(Debug, Clone, PartialEq)]
pub enum BlogLookup {
    /// A single post looked up by its id.
    Single(BlogSummary),
    /// The posts owned by the user whose id was passed.
    ByOwner(Vec<BlogSummary>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_changes_reset_page() {
        let mut spec = BlogQuerySpec::new(9).with_page(4);
        spec.set_category(Some("Travel".into()));
        assert_eq!(spec.page(), 1);

        spec.set_page(3);
        spec.set_author(Some("Ada".into()));
        assert_eq!(spec.page(), 1);

        spec.set_page(2);
        spec.set_search_term(None);
        assert_eq!(spec.page(), 1);
    }

    #[test]
    fn empty_filters_are_not_sent() {
        let spec = BlogQuerySpec::new(9)
            .with_category("  ")
            .with_author("")
            .with_search_term("rust");
        let pairs = spec.query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("search", "rust".to_string()),
                ("page", "1".to_string()),
                ("limit", "9".to_string()),
            ]
        );
    }

    #[test]
    fn page_zero_becomes_one() {
        let spec = BlogQuerySpec::new(0).with_page(0);
        assert_eq!(spec.page(), 1);
        assert_eq!(spec.page_size(), 1);
    }

    #[test]
    fn summary_decodes_remote_shape() {
        let blog: BlogSummary = sonic_rs::from_str(
            r#"{"_id":"b1","title":"Lisbon","category":"Travel","content":"Trams.","userId":"u1","createdAt":"2024-05-01T10:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(blog.id, "b1");
        assert_eq!(blog.owner_user_id, "u1");
        assert_eq!(blog.author_label(), "Anonymous");
        assert!(blog.created_at.is_some());
    }

    #[test]
    fn draft_validation() {
        let draft = BlogDraft::new("Hi", "Travel", "Long enough content", None);
        assert!(draft.validate().is_err());

        let draft = BlogDraft::new("Hello", "Cooking", "Long enough content", None);
        assert!(draft.validate().is_err());

        let draft = BlogDraft::new(
            "Hello",
            "Travel",
            "Long enough content",
            Some("https://img.example.com/x.webp".into()),
        );
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn title_length_counts_characters() {
        let content = "Long enough content";
        assert!(BlogDraft::new("日".repeat(40), "Travel", content, None).validate().is_ok());
        assert!(BlogDraft::new("日".repeat(100), "Travel", content, None).validate().is_ok());
        assert!(BlogDraft::new("日".repeat(101), "Travel", content, None).validate().is_err());
        assert!(BlogDraft::new("日本", "Travel", content, None).validate().is_err());
        assert!(BlogDraft::new("日本語", "Travel", "旅行の話をします。短い", None).validate().is_ok());
    }

    #[test]
    fn excerpt_cuts_on_chars() {
        let blog = BlogSummary {
            id: "b".into(),
            title: "t".into(),
            category: "Travel".into(),
            content: "ééééé".into(),
            author: None,
            image: None,
            created_at: None,
            owner_user_id: "u".into(),
        };
        assert_eq!(blog.excerpt(3), "ééé...");
        assert_eq!(blog.excerpt(10), "ééééé");
    }
}
