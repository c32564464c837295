//! Pagination resolver - orchestrates one connection resolution.
//!
//! # Flow
//!
//! 1. Validate `first`/`last` and apply the `first`-over-`last` precedence
//! 2. Decode the `after`/`before` cursors
//! 3. Compile the range (filter + sort) against the base filter
//! 4. Read the page, the grand total and a bounded edges count concurrently
//! 5. Assemble edges and page info
//!
//! No state survives a call. The three reads are not a snapshot: under
//! concurrent writes `total_count`, the page and the page flags may disagree.

use std::fmt;
use std::sync::Arc;

use futures::try_join;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::codec::{CursorCodec, JsonCursorCodec};
use crate::error::{PaginationError, PaginationResult};
use crate::metrics::{ResolutionTimer, record_resolution, record_resolution_error};
use crate::models::{DEFAULT_ID_FIELD, Document, leaf};
use crate::ports::{
    Connection, Cursor, DataSource, Edge, Filter, OrderDirection, PageInfo, PaginationRequest,
    PopulateHint,
};

use super::range::{RangeCompiler, SortSpec};

// =============================================================================
// Configuration
// =============================================================================

/// Projection applied to every document before it becomes an edge node.
pub type NodeMapper<N> = Arc<dyn Fn(Document) -> N + Send + Sync>;

/// Options for [`resolve`].
///
/// Defaults: sort by the id field, ascending, [`JsonCursorCodec`], identity
/// mapping, no population.
pub struct ResolveOptions<N = Document> {
    /// Dotted path used for ordering and cursors. `None` sorts by the id.
    pub sort_field: Option<String>,
    /// Dotted path of the unique id field.
    pub id_field: String,
    pub direction: OrderDirection,
    pub codec: Arc<dyn CursorCodec>,
    pub map_node: NodeMapper<N>,
    pub populate: PopulateHint,
}

impl Default for ResolveOptions<Document> {
    fn default() -> Self {
        Self {
            sort_field: None,
            id_field: DEFAULT_ID_FIELD.to_string(),
            direction: OrderDirection::Asc,
            codec: Arc::new(JsonCursorCodec),
            map_node: Arc::new(|document| document),
            populate: PopulateHint::none(),
        }
    }
}

impl<N> ResolveOptions<N> {
    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_field = Some(field.into());
        self
    }

    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    pub fn direction(mut self, direction: OrderDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Set the direction from an untrusted value (`1`, `-1`, anything else).
    ///
    /// Non-numeric values fall back to ascending instead of failing.
    pub fn direction_value(self, value: &Value) -> Self {
        self.direction(OrderDirection::from_value(value))
    }

    pub fn codec(mut self, codec: impl CursorCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    pub fn populate(mut self, populate: PopulateHint) -> Self {
        self.populate = populate;
        self
    }

    /// Replace the node projection, changing the node type.
    pub fn map_node<M>(self, map: impl Fn(Document) -> M + Send + Sync + 'static) -> ResolveOptions<M> {
        ResolveOptions {
            sort_field: self.sort_field,
            id_field: self.id_field,
            direction: self.direction,
            codec: self.codec,
            map_node: Arc::new(map),
            populate: self.populate,
        }
    }

    /// Effective sort field.
    pub fn sort_field(&self) -> &str {
        self.sort_field.as_deref().unwrap_or(&self.id_field)
    }

    fn sort_spec(&self) -> SortSpec<'_> {
        SortSpec {
            sort_field: self.sort_field(),
            id_field: &self.id_field,
            direction: self.direction,
        }
    }
}

impl<N> Clone for ResolveOptions<N> {
    fn clone(&self) -> Self {
        Self {
            sort_field: self.sort_field.clone(),
            id_field: self.id_field.clone(),
            direction: self.direction,
            codec: Arc::clone(&self.codec),
            map_node: Arc::clone(&self.map_node),
            populate: self.populate.clone(),
        }
    }
}

impl<N> fmt::Debug for ResolveOptions<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveOptions")
            .field("sort_field", &self.sort_field())
            .field("id_field", &self.id_field)
            .field("direction", &self.direction)
            .field("codec", &self.codec)
            .field("populate", &self.populate)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Page Window
// =============================================================================

/// Validated `first`/`last` after precedence.
///
/// A zero `first` or `last` is no limit at all: the read is unbounded and the
/// corresponding page flag stays false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageWindow {
    first: Option<u64>,
    last: Option<u64>,
}

impl PageWindow {
    fn from_request(request: &PaginationRequest) -> PaginationResult<Self> {
        // if both first and last are given, last is ignored
        let last = if request.first.is_some() {
            None
        } else {
            request.last
        };
        let first = request.first.map(|v| non_negative("first", v)).transpose()?;
        let last = last.map(|v| non_negative("last", v)).transpose()?;
        Ok(Self {
            first: first.filter(|&v| v > 0),
            last: last.filter(|&v| v > 0),
        })
    }

    fn limit(&self) -> Option<u64> {
        self.first.or(self.last)
    }

    fn is_backward(&self) -> bool {
        self.last.is_some()
    }

    fn label(&self) -> &'static str {
        match (self.first, self.last) {
            (Some(_), _) => "forward",
            (None, Some(_)) => "backward",
            (None, None) => "unbounded",
        }
    }
}

fn non_negative(argument: &'static str, value: i32) -> PaginationResult<u64> {
    u64::try_from(value).map_err(|_| PaginationError::InvalidArgument { argument, value })
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolve one page of a connection.
///
/// # Errors
///
/// - [`PaginationError::InvalidArgument`] for a negative `first` or `last`,
///   before any call to `source`
/// - [`PaginationError::Backend`] when any read fails; no partial result
#[instrument(skip_all, fields(sort_field = %options.sort_field(), first = ?request.first, last = ?request.last))]
pub async fn resolve<D, N>(
    request: PaginationRequest,
    source: &D,
    base_filter: &Filter,
    options: &ResolveOptions<N>,
) -> PaginationResult<Connection<N>>
where
    D: DataSource + ?Sized,
{
    let _timer = ResolutionTimer::new();

    let result = resolve_inner(&request, source, base_filter, options).await;
    match &result {
        Ok((window, connection)) => record_resolution(window.label(), connection.edges.len()),
        Err(e) => record_resolution_error(e.kind()),
    }
    result.map(|(_, connection)| connection)
}

async fn resolve_inner<D, N>(
    request: &PaginationRequest,
    source: &D,
    base_filter: &Filter,
    options: &ResolveOptions<N>,
) -> PaginationResult<(PageWindow, Connection<N>)>
where
    D: DataSource + ?Sized,
{
    let window = PageWindow::from_request(request)?;

    // Decode
    let after = request.after.as_ref().map(|c| options.codec.decode(c));
    let before = request.before.as_ref().map(|c| options.codec.decode(c));

    // Compile
    let spec = options.sort_spec();
    let range = RangeCompiler::new(spec, base_filter)
        .compile(source, after.as_ref(), before.as_ref(), window.is_backward())
        .await?;

    // Read
    let limit = window.limit();
    let (documents, total_count, edges_count) = try_join!(
        source.find(&range.filter, &range.sort, limit, &options.populate),
        source.count(base_filter, None),
        source.count(&range.filter, limit.map(|l| l + 1)),
    )?;

    // Assemble
    let mut edges: Vec<Edge<N>> = documents
        .into_iter()
        .map(|document| {
            let cursor = cursor_for(options.codec.as_ref(), &document, &spec);
            Edge {
                node: (options.map_node)(document),
                cursor,
            }
        })
        .collect();

    if window.is_backward() {
        edges.reverse();
    }

    let page_info = PageInfo {
        has_next_page: window.first.is_some_and(|first| edges_count > first),
        has_previous_page: window.last.is_some_and(|last| edges_count > last),
        start_cursor: edges.first().map(|e| e.cursor.clone()),
        end_cursor: edges.last().map(|e| e.cursor.clone()),
    };

    debug!(
        edges = edges.len(),
        total_count,
        edges_count,
        has_next_page = page_info.has_next_page,
        has_previous_page = page_info.has_previous_page,
        "Connection resolved"
    );

    Ok((
        window,
        Connection {
            edges,
            page_info,
            total_count,
        },
    ))
}

/// Cursor of a document from its sort value and id (null when missing).
fn cursor_for(codec: &dyn CursorCodec, document: &Document, spec: &SortSpec<'_>) -> Cursor {
    codec.encode(
        leaf(document, spec.sort_field).unwrap_or(&Value::Null),
        leaf(document, spec.id_field).unwrap_or(&Value::Null),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use crate::codec::CursorPosition;
    use crate::error::{StorageError, StorageResult};
    use crate::ports::Sort;

    // -------------------------------------------------------------------------
    // Test data source
    // -------------------------------------------------------------------------

    /// Vec-backed data source recording every call.
    #[derive(Default)]
    struct VecSource {
        documents: Vec<Document>,
        calls: AtomicUsize,
        fail: bool,
        last_find_limit: Mutex<Option<Option<u64>>>,
    }

    impl VecSource {
        fn new(documents: Vec<Document>) -> Self {
            Self {
                documents,
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn check(&self) -> StorageResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StorageError::QueryError("connection reset".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DataSource for VecSource {
        async fn count(&self, filter: &Filter, limit: Option<u64>) -> StorageResult<u64> {
            self.check()?;
            let matched = self.documents.iter().filter(|d| filter.matches(d));
            let count = match limit {
                Some(limit) => matched.take(limit as usize).count(),
                None => matched.count(),
            };
            Ok(count as u64)
        }

        async fn find(
            &self,
            filter: &Filter,
            sort: &Sort,
            limit: Option<u64>,
            _populate: &PopulateHint,
        ) -> StorageResult<Vec<Document>> {
            self.check()?;
            *self.last_find_limit.lock().unwrap() = Some(limit);
            let mut matched: Vec<Document> = self
                .documents
                .iter()
                .filter(|d| filter.matches(d))
                .cloned()
                .collect();
            matched.sort_by(|a, b| sort.compare(a, b));
            if let Some(limit) = limit {
                matched.truncate(limit as usize);
            }
            Ok(matched)
        }
    }

    /// 36 ships over 6 classes, inserted out of order.
    fn starships() -> Vec<Document> {
        let classes = ["corvette", "freighter", "cruiser", "starfighter", "yacht", "transport"];
        (0..36)
            .rev()
            .map(|i| {
                json!({
                    "id": format!("s{:02}", i),
                    "model": format!("Model {}", i),
                    "starshipClass": classes[i % classes.len()],
                })
            })
            .collect()
    }

    fn ids<N>(connection: &Connection<N>, id: impl Fn(&N) -> String) -> Vec<String> {
        connection.edges.iter().map(|e| id(&e.node)).collect()
    }

    fn doc_ids(connection: &Connection<Document>) -> Vec<String> {
        ids(connection, |d| d["id"].as_str().unwrap_or_default().to_string())
    }

    fn by_class() -> ResolveOptions {
        ResolveOptions::default().sort_by("starshipClass")
    }

    async fn all(source: &VecSource, options: &ResolveOptions) -> Connection<Document> {
        resolve(PaginationRequest::default(), source, &Filter::all(), options)
            .await
            .unwrap()
    }

    // -------------------------------------------------------------------------
    // Scenarios
    // -------------------------------------------------------------------------

    // Test critique: parcours complet par pages de 10 sur 36 éléments
    #[tokio::test]
    async fn test_forward_traversal_exhausts_collection() {
        let source = VecSource::new(starships());
        let options = by_class();
        let full = doc_ids(&all(&source, &options).await);

        let mut seen = Vec::new();
        let mut after: Option<Cursor> = None;
        let mut sizes = Vec::new();
        let mut flags = Vec::new();
        for _ in 0..5 {
            let request = PaginationRequest {
                first: Some(10),
                after: after.clone(),
                ..Default::default()
            };
            let page = resolve(request, &source, &Filter::all(), &options).await.unwrap();
            assert_eq!(page.total_count, 36);
            sizes.push(page.edges.len());
            flags.push(page.page_info.has_next_page);
            seen.extend(doc_ids(&page));
            if let Some(end) = page.page_info.end_cursor.clone() {
                after = Some(end);
            } else {
                assert!(page.page_info.start_cursor.is_none());
            }
        }

        assert_eq!(sizes, [10, 10, 10, 6, 0]);
        assert_eq!(flags, [true, true, true, false, false]);
        assert_eq!(seen, full);
    }

    #[tokio::test]
    async fn test_unconstrained_order_is_total_and_stable() {
        let source = VecSource::new(starships());
        let options = by_class();
        let first = all(&source, &options).await;
        let second = all(&source, &options).await;
        assert_eq!(doc_ids(&first), doc_ids(&second));

        // Tri par classe puis par id croissant
        let mut expected = starships();
        expected.sort_by(|a, b| {
            a["starshipClass"]
                .as_str()
                .cmp(&b["starshipClass"].as_str())
                .then(a["id"].as_str().cmp(&b["id"].as_str()))
        });
        let expected: Vec<String> = expected
            .iter()
            .map(|d| d["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(doc_ids(&first), expected);
        assert!(!first.page_info.has_next_page && !first.page_info.has_previous_page);
        assert!(first.page_info.start_cursor.is_some() && first.page_info.end_cursor.is_some());
    }

    // Test critique: 16 valeurs identiques en tête, aucun doublon après la page
    #[tokio::test]
    async fn test_non_unique_ties_are_not_repeated() {
        let mut documents: Vec<Document> = (0..16)
            .map(|i| json!({"id": format!("r{:02}", i), "group": "a"}))
            .collect();
        documents.extend((16..30).map(|i| json!({"id": format!("r{:02}", i), "group": "b"})));
        let source = VecSource::new(documents);
        let options = ResolveOptions::default().sort_by("group");

        let page = resolve(PaginationRequest::first(16), &source, &Filter::all(), &options)
            .await
            .unwrap();
        assert_eq!(page.edges.len(), 16);

        let next = PaginationRequest::first(3).after(page.edges[15].cursor.clone());
        let next = resolve(next, &source, &Filter::all(), &options).await.unwrap();
        assert_eq!(doc_ids(&next), ["r16", "r17", "r18"]);

        // Curseur au milieu des ex-aequo
        let mid = PaginationRequest::first(3).after(page.edges[7].cursor.clone());
        let mid = resolve(mid, &source, &Filter::all(), &options).await.unwrap();
        assert_eq!(doc_ids(&mid), ["r08", "r09", "r10"]);
        assert!(mid.page_info.has_next_page);
    }

    #[tokio::test]
    async fn test_after_cursor_returns_next_edge() {
        let source = VecSource::new(starships());
        let options = by_class();
        let full = all(&source, &options).await;

        for i in [0, 5, 17, 34] {
            let request = PaginationRequest::first(1).after(full.edges[i].cursor.clone());
            let page = resolve(request, &source, &Filter::all(), &options).await.unwrap();
            assert_eq!(page.edges.len(), 1);
            assert_eq!(page.edges[0].cursor, full.edges[i + 1].cursor);
        }
    }

    #[tokio::test]
    async fn test_backward_traversal_matches_forward_order() {
        let source = VecSource::new(starships());
        let options = by_class();
        let full = doc_ids(&all(&source, &options).await);

        let mut pages: Vec<Vec<String>> = Vec::new();
        let mut before: Option<Cursor> = None;
        loop {
            let request = PaginationRequest {
                last: Some(7),
                before: before.clone(),
                ..Default::default()
            };
            let page = resolve(request, &source, &Filter::all(), &options).await.unwrap();
            pages.push(doc_ids(&page));
            if !page.page_info.has_previous_page {
                break;
            }
            before = page.page_info.start_cursor.clone();
        }

        let collected: Vec<String> = pages.into_iter().rev().flatten().collect();
        assert_eq!(collected, full);
    }

    #[tokio::test]
    async fn test_last_before_returns_nearest_page() {
        let source = VecSource::new(starships());
        let options = by_class();
        let full = all(&source, &options).await;

        let request = PaginationRequest::last(3).before(full.edges[10].cursor.clone());
        let page = resolve(request, &source, &Filter::all(), &options).await.unwrap();
        let expected: Vec<_> = full.edges[7..10].iter().map(|e| e.cursor.clone()).collect();
        let actual: Vec<_> = page.edges.iter().map(|e| e.cursor.clone()).collect();
        assert_eq!(actual, expected);
        assert!(page.page_info.has_previous_page);
        // Asymétrie connue: hasNextPage n'est calculé que pour `first`
        assert!(!page.page_info.has_next_page);
    }

    #[tokio::test]
    async fn test_after_and_before_bound_both_sides() {
        let source = VecSource::new(starships());
        let options = by_class();
        let full = all(&source, &options).await;

        let request = PaginationRequest {
            after: Some(full.edges[3].cursor.clone()),
            before: Some(full.edges[8].cursor.clone()),
            ..Default::default()
        };
        let page = resolve(request, &source, &Filter::all(), &options).await.unwrap();
        let expected: Vec<_> = full.edges[4..8].iter().map(|e| e.cursor.clone()).collect();
        let actual: Vec<_> = page.edges.iter().map(|e| e.cursor.clone()).collect();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_first_wins_over_last() {
        let source = VecSource::new(starships());
        let options = by_class();

        let both = PaginationRequest {
            first: Some(4),
            last: Some(2),
            ..Default::default()
        };
        let both = resolve(both, &source, &Filter::all(), &options).await.unwrap();
        let first = resolve(PaginationRequest::first(4), &source, &Filter::all(), &options)
            .await
            .unwrap();
        assert_eq!(doc_ids(&both), doc_ids(&first));
        assert_eq!(both.page_info, first.page_info);
    }

    // Test critique: argument négatif rejeté sans toucher au backend
    #[tokio::test]
    async fn test_negative_arguments_fail_before_backend() {
        let source = VecSource::new(starships());

        let err = resolve(PaginationRequest::last(-3), &source, &Filter::all(), &by_class())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PaginationError::InvalidArgument {
                argument: "last",
                value: -3
            }
        ));

        let err = resolve(PaginationRequest::first(-1), &source, &Filter::all(), &by_class())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("first(-1)"));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let source = VecSource::failing();
        let err = resolve(PaginationRequest::first(2), &source, &Filter::all(), &by_class())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PaginationError::Backend(StorageError::QueryError(_))
        ));
    }

    #[tokio::test]
    async fn test_descending_pages_concatenate() {
        let documents: Vec<Document> = (0..20)
            .map(|i| json!({"id": format!("p{:02}", i), "price": (i * 7) % 5}))
            .collect();
        let source = VecSource::new(documents);
        let options = ResolveOptions::default()
            .sort_by("price")
            .direction_value(&json!(-1));
        let full = doc_ids(&all(&source, &options).await);

        let mut seen = Vec::new();
        let mut after: Option<Cursor> = None;
        loop {
            let request = PaginationRequest {
                first: Some(3),
                after: after.clone(),
                ..Default::default()
            };
            let page = resolve(request, &source, &Filter::all(), &options).await.unwrap();
            seen.extend(doc_ids(&page));
            if !page.page_info.has_next_page {
                break;
            }
            after = page.page_info.end_cursor.clone();
        }
        assert_eq!(seen, full);
        assert_eq!(full.first().map(String::as_str), Some("p02"));
    }

    #[tokio::test]
    async fn test_base_filter_scopes_pages_and_total() {
        let source = VecSource::new(starships());
        let options = by_class();
        let corvettes = Filter::eq("starshipClass", json!("corvette"));

        let page = resolve(PaginationRequest::first(4), &source, &corvettes, &options)
            .await
            .unwrap();
        assert_eq!(page.total_count, 6);
        assert_eq!(doc_ids(&page), ["s00", "s06", "s12", "s18"]);
        assert!(page.page_info.has_next_page);
    }

    #[tokio::test]
    async fn test_cursor_value_absent_from_collection_still_bounds() {
        let source = VecSource::new(starships());
        let options = by_class();
        let ghost = JsonCursorCodec::encode_pair(&json!("dreadnought"), &json!("zz"));

        let page = resolve(PaginationRequest::first(50).after(ghost), &source, &Filter::all(), &options)
            .await
            .unwrap();
        // Tout ce qui est strictement après "dreadnought": freighter, starfighter, transport, yacht
        assert_eq!(page.edges.len(), 24);
    }

    #[tokio::test]
    async fn test_malformed_cursor_is_no_constraint() {
        let source = VecSource::new(starships());
        let options = by_class();
        let page = resolve(
            PaginationRequest::first(5).after("%%%garbage%%%"),
            &source,
            &Filter::all(),
            &options,
        )
        .await
        .unwrap();
        let first = resolve(PaginationRequest::first(5), &source, &Filter::all(), &options)
            .await
            .unwrap();
        assert_eq!(doc_ids(&page), doc_ids(&first));
    }

    // Test critique: une limite nulle ne limite rien
    #[tokio::test]
    async fn test_zero_limit_reads_everything() {
        let source = VecSource::new(starships());
        let options = by_class();
        let full = doc_ids(&all(&source, &options).await);

        let page = resolve(PaginationRequest::first(0), &source, &Filter::all(), &options)
            .await
            .unwrap();
        assert_eq!(doc_ids(&page), full);
        assert!(!page.page_info.has_next_page);
        assert!(!page.page_info.has_previous_page);
        assert_eq!(*source.last_find_limit.lock().unwrap(), Some(None));

        let page = resolve(PaginationRequest::last(0), &source, &Filter::all(), &options)
            .await
            .unwrap();
        assert_eq!(doc_ids(&page), full);
        assert!(!page.page_info.has_previous_page);
    }

    /// Walk forward with `first: size`, stopping after `max_pages` at most.
    async fn walk_forward(
        source: &VecSource,
        options: &ResolveOptions,
        size: i32,
        max_pages: usize,
    ) -> Vec<String> {
        let mut seen = Vec::new();
        let mut after: Option<Cursor> = None;
        for _ in 0..max_pages {
            let request = PaginationRequest {
                first: Some(size),
                after: after.clone(),
                ..Default::default()
            };
            let page = resolve(request, source, &Filter::all(), options).await.unwrap();
            seen.extend(doc_ids(&page));
            if !page.page_info.has_next_page {
                break;
            }
            after = page.page_info.end_cursor.clone();
        }
        seen
    }

    /// Walk backward from the end with `last: size`, returned in sort order.
    async fn walk_backward(
        source: &VecSource,
        options: &ResolveOptions,
        size: i32,
        max_pages: usize,
    ) -> Vec<String> {
        let mut pages: Vec<Vec<String>> = Vec::new();
        let mut before: Option<Cursor> = None;
        for _ in 0..max_pages {
            let request = PaginationRequest {
                last: Some(size),
                before: before.clone(),
                ..Default::default()
            };
            let page = resolve(request, source, &Filter::all(), options).await.unwrap();
            pages.push(doc_ids(&page));
            if !page.page_info.has_previous_page {
                break;
            }
            before = page.page_info.start_cursor.clone();
        }
        pages.into_iter().rev().flatten().collect()
    }

    // Test critique: les valeurs nulles ou absentes se paginent sans boucler
    #[tokio::test]
    async fn test_null_sort_values_page_through() {
        let source = VecSource::new(vec![
            json!({"id": "d", "v": 2}),
            json!({"id": "a", "v": null}),
            json!({"id": "c", "v": 1}),
            json!({"id": "e", "v": null}),
            json!({"id": "b"}),
        ]);

        let asc = ResolveOptions::default().sort_by("v");
        let full = doc_ids(&all(&source, &asc).await);
        assert_eq!(full, ["a", "b", "e", "c", "d"]);
        assert_eq!(walk_forward(&source, &asc, 2, 10).await, full);
        assert_eq!(walk_backward(&source, &asc, 2, 10).await, full);

        let first = resolve(PaginationRequest::first(2), &source, &Filter::all(), &asc)
            .await
            .unwrap();
        let position = JsonCursorCodec::try_decode(&first.edges[1].cursor).unwrap();
        assert_eq!(position, CursorPosition::new(Value::Null, json!("b")));

        let desc = asc.clone().direction(OrderDirection::Desc);
        let full = doc_ids(&all(&source, &desc).await);
        assert_eq!(full, ["d", "c", "a", "b", "e"]);
        assert_eq!(walk_forward(&source, &desc, 2, 10).await, full);
        assert_eq!(walk_backward(&source, &desc, 2, 10).await, full);
    }

    #[tokio::test]
    async fn test_descending_backward_walk_over_ties() {
        let documents: Vec<Document> = (0..20)
            .map(|i| json!({"id": format!("p{:02}", i), "price": (i * 7) % 5}))
            .collect();
        let source = VecSource::new(documents);
        let options = ResolveOptions::default()
            .sort_by("price")
            .direction(OrderDirection::Desc);
        let full = doc_ids(&all(&source, &options).await);
        assert_eq!(full[..4], ["p02", "p07", "p12", "p17"]);

        for size in [1, 3, 4, 7] {
            assert_eq!(walk_backward(&source, &options, size, 25).await, full);
        }

        // Page juste avant un curseur situé au milieu des ex-aequo
        let request = PaginationRequest::last(3).before(
            JsonCursorCodec::encode_pair(&json!(4), &json!("p12")),
        );
        let page = resolve(request, &source, &Filter::all(), &options).await.unwrap();
        assert_eq!(doc_ids(&page), ["p02", "p07"]);
        assert!(!page.page_info.has_previous_page);
    }

    #[tokio::test]
    async fn test_nested_sort_field_and_mapping() {
        let documents: Vec<Document> = [(3, "c"), (1, "a"), (2, "b")]
            .into_iter()
            .map(|(size, id)| json!({"id": id, "stats": {"size": size}}))
            .collect();
        let source = VecSource::new(documents);
        let options = ResolveOptions::default()
            .sort_by("stats.size")
            .map_node(|d| d["stats"]["size"].as_i64().unwrap_or_default());

        let page = resolve(PaginationRequest::first(2), &source, &Filter::all(), &options)
            .await
            .unwrap();
        let sizes: Vec<i64> = page.edges.iter().map(|e| e.node).collect();
        assert_eq!(sizes, [1, 2]);

        let position = JsonCursorCodec::try_decode(&page.edges[1].cursor).unwrap();
        assert_eq!(position, CursorPosition::new(json!(2), json!("b")));
    }

    #[tokio::test]
    async fn test_sort_by_id_descending() {
        let source = VecSource::new(starships());
        let options = ResolveOptions::default().direction(OrderDirection::Desc);
        let page = resolve(PaginationRequest::first(3), &source, &Filter::all(), &options)
            .await
            .unwrap();
        assert_eq!(doc_ids(&page), ["s35", "s34", "s33"]);

        let next = PaginationRequest::first(2).after(page.page_info.end_cursor.clone().unwrap());
        let next = resolve(next, &source, &Filter::all(), &options).await.unwrap();
        assert_eq!(doc_ids(&next), ["s32", "s31"]);

        let back = PaginationRequest::last(2).before(page.edges[0].cursor.clone());
        let back = resolve(back, &source, &Filter::all(), &options).await.unwrap();
        assert!(back.edges.is_empty());
        assert!(!back.page_info.has_previous_page);
    }
}
