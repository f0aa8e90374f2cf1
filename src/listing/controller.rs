use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{
    error::{ClientError, Result},
    models::blog::{BlogPage, BlogQuerySpec},
    remote::{blogs as blog_remote, client::ApiClient},
    validation::rules::CATEGORIES,
};

/// Where listing pages come from.
pub trait BlogSource {
    fn fetch_page(&self, spec: &BlogQuerySpec) -> impl Future<Output = Result<BlogPage>> + Send;
}

impl BlogSource for ApiClient {
    fn fetch_page(&self, spec: &BlogQuerySpec) -> impl Future<Output = Result<BlogPage>> + Send {
        blog_remote::fetch_page(self, spec)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStatus {
    Idle,
    Loading,
    Error,
}

/// What became of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result was the latest and now shows, with this status.
    Applied(ListingStatus),
    /// A newer fetch was issued first; the result was dropped.
    Discarded,
}

/// Everything a listing view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingState {
    pub spec: BlogQuerySpec,
    pub status: ListingStatus,
    pub page: Option<BlogPage>,
    pub error: Option<ClientError>,
    pub search_draft: String,
}

struct Inner {
    state: ListingState,
    latest_seq: u64,
}

/// Drives the public listing: filters, search, pagination and the fetch
/// that follows each change.
///
/// Fetches may overlap. Each one is numbered when issued and only the most
/// recently issued one may write its result; older results, successes and
/// failures alike, are dropped when they land.
pub struct ListingController<S> {
    source: S,
    inner: Mutex<Inner>,
}

impl<S: BlogSource> ListingController<S> {
    pub fn new(source: S, page_size: u32) -> Self {
        Self::with_spec(source, BlogQuerySpec::new(page_size))
    }

    /// Starts from `spec` instead of an unfiltered first page.
    pub fn with_spec(source: S, spec: BlogQuerySpec) -> Self {
        Self {
            source,
            inner: Mutex::new(Inner {
                state: ListingState {
                    spec,
                    status: ListingStatus::Idle,
                    page: None,
                    error: None,
                    search_draft: String::new(),
                },
                latest_seq: 0,
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ListingState {
        self.inner().state.clone()
    }

    pub fn status(&self) -> ListingStatus {
        self.inner().state.status
    }

    pub fn spec(&self) -> BlogQuerySpec {
        self.inner().state.spec.clone()
    }

    pub fn page(&self) -> Option<BlogPage> {
        self.inner().state.page.clone()
    }

    pub fn error(&self) -> Option<ClientError> {
        self.inner().state.error.clone()
    }

    pub fn error_message(&self) -> Option<String> {
        self.inner().state.error.as_ref().map(ToString::to_string)
    }

    pub fn search_draft(&self) -> String {
        self.inner().state.search_draft.clone()
    }

    /// The distinct authors on the current page, in order of first
    /// appearance.
    pub fn displayed_authors(&self) -> Vec<String> {
        let inner = self.inner();
        let mut authors: Vec<String> = Vec::new();
        for blog in inner.state.page.iter().flat_map(|page| page.items.iter()) {
            let author = blog.author_label();
            if !authors.iter().any(|a| a == author) {
                authors.push(author.to_string());
            }
        }
        authors
    }

    pub fn categories(&self) -> &'static [&'static str] {
        &CATEGORIES
    }

    /// Initial load.
    pub async fn mount(&self) -> FetchOutcome {
        self.refresh().await
    }

    /// Fetches with the current spec.
    pub async fn refresh(&self) -> FetchOutcome {
        let (seq, spec) = self.begin(|_| {});
        let result = self.source.fetch_page(&spec).await;
        self.commit(seq, result)
    }

    /// Fetches again after an error, with the same spec.
    pub async fn retry(&self) -> FetchOutcome {
        self.refresh().await
    }

    pub async fn set_category(&self, category: Option<String>) -> FetchOutcome {
        self.update_and_fetch(|state| state.spec.set_category(category))
            .await
    }

    pub async fn set_author(&self, author: Option<String>) -> FetchOutcome {
        self.update_and_fetch(|state| state.spec.set_author(author)).await
    }

    /// Edits the search box. Nothing is fetched until `submit_search`.
    pub fn edit_search(&self, text: impl Into<String>) {
        self.inner().state.search_draft = text.into();
    }

    /// Commits the search box to the query and fetches from page 1.
    pub async fn submit_search(&self) -> FetchOutcome {
        self.update_and_fetch(|state| {
            let term = state.search_draft.trim().to_string();
            state.spec.set_search_term(Some(term));
        })
        .await
    }

    /// Moves to page `page`. The page count is not checked; the remote
    /// answers out-of-range pages with an empty page.
    pub async fn set_page(&self, page: u32) -> FetchOutcome {
        self.update_and_fetch(|state| state.spec.set_page(page)).await
    }

    /// Drops every filter and the search box, then fetches page 1.
    pub async fn clear_filters(&self) -> FetchOutcome {
        self.update_and_fetch(|state| {
            state.spec = BlogQuerySpec::new(state.spec.page_size());
            state.search_draft.clear();
        })
        .await
    }

    async fn update_and_fetch(&self, update: impl FnOnce(&mut ListingState)) -> FetchOutcome {
        let (seq, spec) = self.begin(update);
        let result = self.source.fetch_page(&spec).await;
        self.commit(seq, result)
    }

    /// Applies `update`, enters `Loading` and issues the next sequence number.
    fn begin(&self, update: impl FnOnce(&mut ListingState)) -> (u64, BlogQuerySpec) {
        let mut inner = self.inner();
        update(&mut inner.state);
        inner.latest_seq += 1;
        inner.state.status = ListingStatus::Loading;
        inner.state.error = None;

        tracing::debug!("Listing fetch {} issued: {:?}", inner.latest_seq, inner.state.spec);
        (inner.latest_seq, inner.state.spec.clone())
    }

    fn commit(&self, seq: u64, result: Result<BlogPage>) -> FetchOutcome {
        let mut inner = self.inner();
        if seq != inner.latest_seq {
            tracing::debug!(
                "Dropping stale listing result {} (latest is {})",
                seq,
                inner.latest_seq
            );
            return FetchOutcome::Discarded;
        }

        match result {
            Ok(page) => {
                inner.state.page = Some(page);
                inner.state.error = None;
                inner.state.status = ListingStatus::Idle;
            }
            Err(e) => {
                tracing::warn!("Listing fetch failed: {}", e);
                inner.state.page = None;
                inner.state.error = Some(e);
                inner.state.status = ListingStatus::Error;
            }
        }
        FetchOutcome::Applied(inner.state.status)
    }
}
