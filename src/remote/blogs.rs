use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ClientError, Result},
    models::blog::{BlogDraft, BlogLookup, BlogPage, BlogQuerySpec, BlogSummary},
    models::session::SessionToken,
    remote::client::{with_bearer, with_json, ApiClient},
};

/// A list element that may not be a well-formed blog.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientBlog {
    Blog(BlogSummary),
    Other(IgnoredAny),
}

/// A count the remote may send as a number, a numeric string, or junk.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientCount {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl LenientCount {
    fn value(&self) -> Option<u64> {
        match self {
            LenientCount::Number(n) if n.is_finite() && *n >= 0.0 => Some(*n as u64),
            LenientCount::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Deserialize, Default)]
struct RawBlogPage {
    #[serde(default)]
    blogs: Option<Vec<LenientBlog>>,
    #[serde(rename = "totalPages", default)]
    total_pages: Option<LenientCount>,
    #[serde(rename = "currentPage", default)]
    current_page: Option<LenientCount>,
    #[serde(rename = "totalBlogs", default)]
    total_blogs: Option<LenientCount>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WrappedBlog {
    Many(Vec<LenientBlog>),
    One(BlogSummary),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLookup {
    Wrapped { blog: WrappedBlog },
    Listed { blogs: Vec<LenientBlog> },
    Single(BlogSummary),
}

#[derive(Deserialize)]
struct BlogEnvelope {
    #[serde(default)]
    blog: Option<BlogSummary>,
}

#[derive(Serialize)]
struct CreateBlogBody<'a> {
    title: &'a str,
    category: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    #[serde(rename = "userId")]
    user_id: &'a str,
}

fn keep_blogs(items: Vec<LenientBlog>) -> Vec<BlogSummary> {
    let total = items.len();
    let blogs: Vec<BlogSummary> = items
        .into_iter()
        .filter_map(|item| match item {
            LenientBlog::Blog(blog) => Some(blog),
            LenientBlog::Other(_) => None,
        })
        .collect();

    if blogs.len() < total {
        tracing::warn!("Dropped {} malformed blog entries", total - blogs.len());
    }
    blogs
}

/// Turns a listing response into a `BlogPage`, whatever shape it arrived in.
///
/// Missing fields default to no items, page 1 of 1, and a count of zero.
/// The current page is clamped to the page count, and surplus items beyond
/// `page_size` are cut.
fn normalize_page(body: &[u8], page_size: u32) -> BlogPage {
    let raw: RawBlogPage = match sonic_rs::from_slice(body) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Listing response is not a JSON object, treating as empty: {}", e);
            RawBlogPage::default()
        }
    };

    let mut items = raw.blogs.map(keep_blogs).unwrap_or_default();
    if items.len() > page_size as usize {
        tracing::warn!(
            "Remote returned {} blogs for a page of {}, truncating",
            items.len(),
            page_size
        );
        items.truncate(page_size as usize);
    }

    let to_page = |count: Option<LenientCount>| {
        count
            .and_then(|c| c.value())
            .filter(|n| *n > 0)
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
            .unwrap_or(1)
    };
    let total_pages = to_page(raw.total_pages);
    let current_page = to_page(raw.current_page).min(total_pages);
    let total_count = raw.total_blogs.and_then(|c| c.value()).unwrap_or(0);

    BlogPage {
        items,
        current_page,
        total_pages,
        total_count,
    }
}

fn normalize_lookup(raw: RawLookup) -> BlogLookup {
    match raw {
        RawLookup::Wrapped {
            blog: WrappedBlog::Many(items),
        }
        | RawLookup::Listed { blogs: items } => BlogLookup::ByOwner(keep_blogs(items)),
        RawLookup::Wrapped {
            blog: WrappedBlog::One(blog),
        }
        | RawLookup::Single(blog) => BlogLookup::Single(blog),
    }
}

/// Fetches one page of the public listing.
///
/// # Arguments
///
/// * `api` - The API client.
/// * `spec` - The filters and page to fetch. Empty filters are not sent.
///
/// # Returns
///
/// A `Result` containing the normalized page.
pub async fn fetch_page(api: &ApiClient, spec: &BlogQuerySpec) -> Result<BlogPage> {
    let query = spec.query_pairs();
    tracing::debug!("Fetching blogs: {:?}", query);

    let body = api
        .execute(api.get("/api/blog").query(&query), "Failed to fetch blogs!")
        .await?;

    Ok(normalize_page(&body, spec.page_size()))
}

/// Calls `GET /api/blog/:id`, which answers either with one post or with the
/// posts owned by the user whose id was passed.
pub async fn fetch_blog(api: &ApiClient, id: &str) -> Result<BlogLookup> {
    let raw: RawLookup = api
        .execute_json(
            api.get(&format!("/api/blog/{}", id)),
            "Failed to fetch blog details!",
        )
        .await?;
    Ok(normalize_lookup(raw))
}

/// Fetches a single post by its id.
pub async fn fetch_blog_by_id(api: &ApiClient, id: &str) -> Result<BlogSummary> {
    match fetch_blog(api, id).await? {
        BlogLookup::Single(blog) => Ok(blog),
        BlogLookup::ByOwner(mut blogs) if blogs.len() == 1 => Ok(blogs.remove(0)),
        BlogLookup::ByOwner(blogs) => Err(ClientError::Serialization(format!(
            "Expected one blog for id {}, got a list of {}",
            id,
            blogs.len()
        ))),
    }
}

/// Fetches every post owned by `user_id`.
pub async fn fetch_blogs_by_owner(api: &ApiClient, user_id: &str) -> Result<Vec<BlogSummary>> {
    match fetch_blog(api, user_id).await? {
        BlogLookup::ByOwner(blogs) => Ok(blogs),
        BlogLookup::Single(blog) => Ok(vec![blog]),
    }
}

/// Creates a post owned by `user_id`.
///
/// # Returns
///
/// A `Result` containing the created post, when the remote echoes it.
pub async fn create_blog(
    api: &ApiClient,
    token: &SessionToken,
    draft: &BlogDraft,
    user_id: &str,
) -> Result<Option<BlogSummary>> {
    let body = CreateBlogBody {
        title: &draft.title,
        category: &draft.category,
        content: &draft.content,
        image: draft.image.as_deref(),
        user_id,
    };
    let builder = with_json(with_bearer(api.post("/api/blog"), token), &body)?;
    let envelope: BlogEnvelope = api.execute_json(builder, "Failed to create blog!").await?;
    Ok(envelope.blog)
}

/// Replaces the editable fields of a post.
pub async fn update_blog(
    api: &ApiClient,
    token: &SessionToken,
    id: &str,
    draft: &BlogDraft,
) -> Result<Option<BlogSummary>> {
    let builder = with_json(
        with_bearer(api.put(&format!("/api/blog/{}", id)), token),
        draft,
    )?;
    let body = api.execute(builder, "Failed to update blog").await?;
    Ok(sonic_rs::from_slice::<BlogEnvelope>(&body)
        .ok()
        .and_then(|envelope| envelope.blog))
}

/// Deletes a post.
pub async fn delete_blog(api: &ApiClient, token: &SessionToken, id: &str) -> Result<()> {
    api.execute(
        with_bearer(api.delete(&format!("/api/blog/{}", id)), token),
        "Failed to delete blog",
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog_json(id: &str) -> String {
        format!(
            r#"{{"_id":"{}","title":"T","category":"Travel","content":"C","userId":"u1"}}"#,
            id
        )
    }

    #[test]
    fn missing_fields_get_defaults() {
        let page = normalize_page(b"{}", 9);
        assert_eq!(page, BlogPage::empty());
    }

    #[test]
    fn non_json_body_is_an_empty_page() {
        let page = normalize_page(b"<html>oops</html>", 9);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn surplus_items_are_cut_to_page_size() {
        let body = format!(
            r#"{{"blogs":[{},{},{}],"totalPages":1,"currentPage":1,"totalBlogs":3}}"#,
            blog_json("a"),
            blog_json("b"),
            blog_json("c")
        );
        let page = normalize_page(body.as_bytes(), 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_count, 3);
    }

    #[test]
    fn current_page_never_exceeds_total() {
        let page = normalize_page(br#"{"blogs":[],"totalPages":2,"currentPage":5}"#, 9);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn counts_as_strings_and_junk() {
        let page = normalize_page(
            br#"{"totalPages":"3","currentPage":null,"totalBlogs":{"n":1}}"#,
            9,
        );
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_count, 0);
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let body = format!(r#"{{"blogs":[{},{{"title":"no id"}},42]}}"#, blog_json("a"));
        let page = normalize_page(body.as_bytes(), 9);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "a");
    }

    #[test]
    fn lookup_shapes() {
        let single: RawLookup = sonic_rs::from_str(&blog_json("a")).unwrap();
        assert!(matches!(normalize_lookup(single), BlogLookup::Single(b) if b.id == "a"));

        let listed: RawLookup =
            sonic_rs::from_str(&format!(r#"{{"blog":[{},{}]}}"#, blog_json("a"), blog_json("b")))
                .unwrap();
        assert!(matches!(normalize_lookup(listed), BlogLookup::ByOwner(v) if v.len() == 2));

        let wrapped_one: RawLookup =
            sonic_rs::from_str(&format!(r#"{{"blog":{}}}"#, blog_json("a"))).unwrap();
        assert!(matches!(normalize_lookup(wrapped_one), BlogLookup::Single(_)));

        let empty: RawLookup = sonic_rs::from_str(r#"{"blog":[]}"#).unwrap();
        assert!(matches!(normalize_lookup(empty), BlogLookup::ByOwner(v) if v.is_empty()));
    }
}
