use std::cmp::Ordering;

use crate::models::blog::BlogSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

/// A local view over the logged-in user's posts.
///
/// The posts are fetched once; filtering and sorting happen here without
/// another request.
#[derive(Debug, Clone, Default)]
pub struct OwnedBlogView {
    blogs: Vec<BlogSummary>,
    category: Option<String>,
    title_filter: Option<String>,
    order: SortOrder,
}

impl OwnedBlogView {
    pub fn new(blogs: Vec<BlogSummary>) -> Self {
        Self {
            blogs,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.blogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blogs.is_empty()
    }

    /// Keeps only posts in `category`. `None` or an empty string shows all.
    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category.filter(|c| !c.is_empty());
    }

    /// Keeps only posts whose title contains `text`, ignoring case.
    pub fn set_title_filter(&mut self, text: Option<String>) {
        self.title_filter = text
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
    }

    pub fn set_order(&mut self, order: SortOrder) {
        self.order = order;
    }

    /// The distinct categories among the posts, in first-appearance order.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for blog in &self.blogs {
            if !categories.contains(&blog.category.as_str()) {
                categories.push(&blog.category);
            }
        }
        categories
    }

    /// The posts that pass the filters, sorted by creation date. Undated
    /// posts come last in either order.
    pub fn visible(&self) -> Vec<&BlogSummary> {
        let mut visible: Vec<&BlogSummary> = self
            .blogs
            .iter()
            .filter(|blog| match &self.category {
                Some(category) => &blog.category == category,
                None => true,
            })
            .filter(|blog| match &self.title_filter {
                Some(text) => blog.title.to_lowercase().contains(text.as_str()),
                None => true,
            })
            .collect();

        visible.sort_by(|a, b| match (a.created_at, b.created_at) {
            (Some(x), Some(y)) => match self.order {
                SortOrder::Newest => y.cmp(&x),
                SortOrder::Oldest => x.cmp(&y),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        visible
    }
}
