// ── Table controller ──
//
// Binds URL state to a resource port. The URL (`QueryParams`) is the only
// source of truth for what the table shows: every sort, filter and page
// event rewrites it, then refetches. Fetches may resolve out of order, so
// each one carries a generation and only the newest may write the view.

pub mod columns;

use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::port::{PageResult, Resource, ResourcePort};
use crate::query::{PageRequest, QueryCodec, QueryParams, SortDirection, SortSpec};
use crate::validate::FieldErrors;

pub use columns::{ColumnDescriptor, render_rows};

/// Placeholder cell shown while a page is loading.
pub const SKELETON_CELL: &str = "░░░░";

// ── View state ──────────────────────────────────────────────────────

/// Placeholder grid with the row/column count of the pending page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skeleton {
    pub rows: usize,
    pub columns: usize,
}

impl Skeleton {
    pub fn cells(&self) -> Vec<Vec<String>> {
        vec![vec![SKELETON_CELL.to_owned(); self.columns]; self.rows]
    }
}

/// A successfully fetched page and the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage<R> {
    pub request: PageRequest,
    pub items: Vec<R>,
    pub total_count: u64,
}

/// What the table currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum TableView<R> {
    /// Nothing fetched yet.
    Idle,
    /// A fetch is outstanding; the previous rows are hidden.
    Loading(Skeleton),
    Ready(TablePage<R>),
    /// The latest fetch failed. Not retried.
    Failed { request: PageRequest, message: String },
}

impl<R> TableView<R> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading(_))
    }

    pub fn page(&self) -> Option<&TablePage<R>> {
        match self {
            Self::Ready(page) => Some(page),
            _ => None,
        }
    }
}

/// Result of applying a fetch to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was current and is now displayed.
    Applied,
    /// A newer navigation superseded this fetch; the response was dropped.
    Stale,
}

/// Page summary for a pager widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based.
    pub page: u64,
    /// At least 1, even for an empty result.
    pub page_count: u64,
    pub page_size: u64,
    pub total_count: u64,
    /// 1-based index of the first row shown, 0 when empty.
    pub first_row: u64,
    pub last_row: u64,
}

impl Pagination {
    pub fn new(request: &PageRequest, shown: usize, total_count: u64) -> Self {
        let page_size = request.limit.max(1);
        let shown = u64::try_from(shown).unwrap_or(u64::MAX);
        let (first_row, last_row) = if shown == 0 {
            (0, 0)
        } else {
            (request.offset + 1, request.offset + shown)
        };
        Self {
            page: request.page(),
            page_count: total_count.div_ceil(page_size).max(1),
            page_size,
            total_count,
            first_row,
            last_row,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }
}

impl fmt::Display for Pagination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total_count == 0 {
            return f.write_str("No results");
        }
        write!(
            f,
            "Showing {}-{} of {} (page {}/{})",
            self.first_row, self.last_row, self.total_count, self.page, self.page_count
        )
    }
}

// ── Controller ──────────────────────────────────────────────────────

/// Ticket for one outstanding fetch.
#[derive(Debug)]
struct FetchTicket {
    generation: u64,
    request: PageRequest,
}

/// Paginated, sortable, filterable view of resource `R` kept in sync with
/// the URL.
pub struct TableController<R: Resource> {
    port: Arc<dyn ResourcePort<R>>,
    codec: QueryCodec,
    columns: Vec<ColumnDescriptor<R>>,
    location: watch::Sender<QueryParams>,
    /// Bumped by every fetch. Held across the staleness check and the view
    /// write in `apply`, so a newer fetch's skeleton is never overwritten.
    generation: Mutex<u64>,
    view: watch::Sender<Arc<TableView<R>>>,
}

impl<R: Resource> TableController<R> {
    /// Controller over `R`'s own columns. The codec's sortable and
    /// filterable keys come from the column descriptors.
    pub fn new(
        port: Arc<dyn ResourcePort<R>>,
        default_limit: u64,
        max_limit: u64,
        location: QueryParams,
    ) -> Self {
        Self::with_columns(port, R::columns(), default_limit, max_limit, location)
    }

    pub fn with_columns(
        port: Arc<dyn ResourcePort<R>>,
        columns: Vec<ColumnDescriptor<R>>,
        default_limit: u64,
        max_limit: u64,
        location: QueryParams,
    ) -> Self {
        let codec = QueryCodec::new(default_limit)
            .max_limit(max_limit)
            .sortable(columns.iter().filter(|c| c.sortable).map(|c| c.key))
            .filterable(columns.iter().filter(|c| c.filterable).map(|c| c.key));
        let (location, _) = watch::channel(location);
        let (view, _) = watch::channel(Arc::new(TableView::Idle));
        Self {
            port,
            codec,
            columns,
            location,
            generation: Mutex::new(0),
            view,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn codec(&self) -> &QueryCodec {
        &self.codec
    }

    pub fn columns(&self) -> &[ColumnDescriptor<R>] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header).collect()
    }

    /// Current URL parameters.
    pub fn location(&self) -> QueryParams {
        self.location.borrow().clone()
    }

    /// The request the current URL decodes to.
    pub fn request(&self) -> PageRequest {
        self.codec.decode(&self.location.borrow())
    }

    pub fn view(&self) -> Arc<TableView<R>> {
        Arc::clone(&self.view.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<TableView<R>>> {
        self.view.subscribe()
    }

    /// URL changes, for callers that mirror them into an address bar.
    pub fn subscribe_location(&self) -> watch::Receiver<QueryParams> {
        self.location.subscribe()
    }

    /// Pager summary for the page on screen, if any.
    pub fn pagination(&self) -> Option<Pagination> {
        self.view
            .borrow()
            .page()
            .map(|p| Pagination::new(&p.request, p.items.len(), p.total_count))
    }

    /// Cells for the current view: data rows when ready, placeholder rows
    /// while loading, nothing otherwise.
    pub fn rows(&self) -> Vec<Vec<String>> {
        match &**self.view.borrow() {
            TableView::Ready(page) => render_rows(&self.columns, &page.items),
            TableView::Loading(skeleton) => skeleton.cells(),
            TableView::Idle | TableView::Failed { .. } => Vec::new(),
        }
    }

    // ── Fetching ─────────────────────────────────────────────────────

    /// Replace the URL and fetch the page it describes.
    pub async fn navigate(&self, params: QueryParams) -> Result<FetchOutcome, CoreError> {
        self.location.send_replace(params);
        self.refresh().await
    }

    /// Refetch the page for the current URL.
    pub async fn refresh(&self) -> Result<FetchOutcome, CoreError> {
        let ticket = self.begin();
        let result = self.port.list(&ticket.request).await;
        self.apply(ticket, result)
    }

    fn begin(&self) -> FetchTicket {
        let mut generation = self.generation.lock().expect("generation lock poisoned");
        *generation += 1;
        let request = self.request();
        debug!(resource = %R::KIND, generation = *generation, %request, "fetching page");

        let rows = usize::try_from(request.limit).unwrap_or(usize::MAX);
        self.view.send_replace(Arc::new(TableView::Loading(Skeleton {
            rows,
            columns: self.columns.len(),
        })));
        FetchTicket {
            generation: *generation,
            request,
        }
    }

    fn apply(
        &self,
        ticket: FetchTicket,
        result: Result<PageResult<R>, CoreError>,
    ) -> Result<FetchOutcome, CoreError> {
        let generation = self.generation.lock().expect("generation lock poisoned");
        if ticket.generation != *generation {
            debug!(
                resource = %R::KIND,
                stale = ticket.generation,
                current = *generation,
                "discarding superseded page"
            );
            return Ok(FetchOutcome::Stale);
        }

        match result {
            Ok(page) => {
                self.view.send_replace(Arc::new(TableView::Ready(TablePage {
                    request: ticket.request,
                    items: page.data,
                    total_count: page.total_count,
                })));
                Ok(FetchOutcome::Applied)
            }
            Err(err) => {
                warn!(resource = %R::KIND, error = %err, "page fetch failed");
                self.view.send_replace(Arc::new(TableView::Failed {
                    request: ticket.request,
                    message: err.to_string(),
                }));
                Err(err)
            }
        }
    }

    // ── URL events ───────────────────────────────────────────────────

    /// Sort by `field`. Re-selecting the current sort field flips its
    /// direction. Returns to the first page.
    pub async fn sort_by(&self, field: &str) -> Result<FetchOutcome, CoreError> {
        if !self.codec.is_sortable(field) {
            return Err(invalid("sort", format!("'{field}' is not sortable")));
        }
        let mut request = self.request();
        let direction = match &request.sort {
            Some(current) if current.field == field => current.direction.toggled(),
            _ => SortDirection::Asc,
        };
        request.sort = Some(SortSpec {
            field: field.to_owned(),
            direction,
        });
        request.offset = 0;
        self.push(&request).await
    }

    /// Set (`Some`) or clear (`None`) a filter. Returns to the first page.
    pub async fn filter(&self, field: &str, value: Option<&str>) -> Result<FetchOutcome, CoreError> {
        if !self.codec.is_filterable(field) {
            return Err(invalid(field, format!("'{field}' is not filterable")));
        }
        let mut request = self.request();
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => {
                request.filters.insert(field.to_owned(), v.to_owned());
            }
            None => {
                request.filters.remove(field);
            }
        }
        request.offset = 0;
        self.push(&request).await
    }

    /// Jump to a 1-based page.
    pub async fn go_to_page(&self, page: u64) -> Result<FetchOutcome, CoreError> {
        if page == 0 {
            return Err(invalid("page", "must be at least 1"));
        }
        let mut request = self.request();
        request.offset = (page - 1).saturating_mul(request.limit);
        self.push(&request).await
    }

    pub async fn next_page(&self) -> Result<FetchOutcome, CoreError> {
        self.go_to_page(self.request().page().saturating_add(1)).await
    }

    pub async fn previous_page(&self) -> Result<FetchOutcome, CoreError> {
        self.go_to_page(self.request().page().saturating_sub(1).max(1))
            .await
    }

    /// Change rows per page. Returns to the first page.
    pub async fn set_page_size(&self, size: u64) -> Result<FetchOutcome, CoreError> {
        if size == 0 {
            return Err(invalid("page_size", "must be at least 1"));
        }
        let probe = PageRequest::first_page(size);
        let mut request = self.request();
        request.limit = self
            .codec
            .decode(&self.codec.encode(&probe))
            .limit;
        request.offset = 0;
        self.push(&request).await
    }

    async fn push(&self, request: &PageRequest) -> Result<FetchOutcome, CoreError> {
        let params = self.codec.merge(&self.location(), request);
        self.navigate(params).await
    }
}

fn invalid(field: &str, message: impl Into<String>) -> CoreError {
    let mut errors = FieldErrors::new();
    errors.add(field, message);
    CoreError::Validation(errors)
}
