//! HTTP routing and request handlers.
//!
//! Routes:
//! - `GET /` and `GET /Home/SheetData`: the sheet view, optional `searchQuery`
//! - `GET /healthz`: liveness
//! - `/static/*`: files from the configured static directory (wasm bundle)

use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use serde::Deserialize;
use sheetview_core::{
    AppConfig, Clock, ColumnMap, Error, FreshnessPolicy, SheetCache, SheetSource, filter::search,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::error::WebError;
use crate::render::SheetPage;

/// Shared per-process state, constructed once at startup.
pub struct AppState {
    pub cache: SheetCache,
    pub policy: FreshnessPolicy,
    pub source: Arc<dyn SheetSource>,
    pub clock: Arc<dyn Clock>,
    pub columns: ColumnMap,
    pub title: String,
    pub max_query_len: usize,
}

impl AppState {
    pub fn new(config: &AppConfig, source: Arc<dyn SheetSource>, clock: Arc<dyn Clock>) -> Result<Self, Error> {
        Ok(Self {
            cache: SheetCache::new(),
            policy: FreshnessPolicy::from_config(config)?,
            source,
            clock,
            columns: ColumnMap::DEFAULT,
            title: config.sheet_name.clone(),
            max_query_len: config.max_query_len,
        })
    }
}

/// Query parameters of the sheet view.
#[derive(Debug, Default, Deserialize)]
pub struct SheetDataParams {
    #[serde(rename = "searchQuery", default)]
    pub search_query: Option<String>,
}

/// Build the application router.
pub fn router(state: Arc<AppState>, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(sheet_data))
        .route("/Home/SheetData", get(sheet_data))
        .route("/healthz", get(|| async { "ok" }))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Render the sheet, filtered by `searchQuery` when present.
async fn sheet_data(
    State(state): State<Arc<AppState>>, Query(params): Query<SheetDataParams>,
) -> Result<Html<String>, WebError> {
    let query = params.search_query.as_deref().filter(|q| !q.is_empty());

    if let Some(q) = query
        && q.chars().count() > state.max_query_len
    {
        return Err(WebError::InvalidInput(format!(
            "searchQuery too long: {} chars (max {})",
            q.chars().count(),
            state.max_query_len
        )));
    }

    let now = state.clock.now();
    let load = state.policy.resolve(now, &state.cache, state.source.as_ref()).await;
    tracing::debug!(origin = ?load.origin, rows = load.table.len(), "sheet resolved");

    let filtered = search(&load.table, query, &state.columns);
    let page = SheetPage::build(&state.title, &filtered, &state.columns, query, load.message);

    Ok(Html(page.render()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};
    use sheetview_core::clock::FixedClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct FakeSheet {
        rows: Value,
        fail: bool,
        values_calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SheetSource for FakeSheet {
        async fn values(&self) -> Result<Vec<Vec<Value>>, Error> {
            self.values_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Fetch("authentication failed: bad key".into()));
            }
            Ok(serde_json::from_value(self.rows.clone()).unwrap())
        }

        async fn row_count(&self) -> Result<u32, Error> {
            Ok(1000)
        }
    }

    fn fake(fail: bool) -> Arc<FakeSheet> {
        Arc::new(FakeSheet {
            rows: json!([
                ["SKU", "Title", "Price"],
                ["A1", "Widget", "10.00"],
                ["B2", "Gadget", "5.00"],
                ["", "", ""],
                ["C3", "Hidden", "1.00"]
            ]),
            fail,
            values_calls: AtomicUsize::new(0),
        })
    }

    fn app(source: Arc<FakeSheet>) -> Router {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 10, 14, 0, 0).unwrap()));
        let state = AppState::new(&AppConfig::default(), source, clock).unwrap();
        router(Arc::new(state), "./static")
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_renders_truncated_table() {
        let (status, body) = get_body(app(fake(false)), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Widget"));
        assert!(body.contains("Gadget"));
        assert!(!body.contains("Hidden"));
    }

    #[tokio::test]
    async fn test_search_query_filters_rows() {
        let (status, body) = get_body(app(fake(false)), "/Home/SheetData?searchQuery=gadget").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Gadget"));
        assert!(!body.contains("Widget"));
        assert!(body.contains(r#"value="gadget""#));
    }

    #[tokio::test]
    async fn test_search_without_match_keeps_header() {
        let (_, body) = get_body(app(fake(false)), "/?searchQuery=zzz").await;
        assert!(body.contains("<th>SKU</th>"));
        assert!(!body.contains(r#"name="selectedItems""#));
    }

    #[tokio::test]
    async fn test_fetch_failure_renders_message() {
        let (status, body) = get_body(app(fake(true)), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Error: authentication failed: bad key"));
    }

    #[tokio::test]
    async fn test_second_request_uses_cache() {
        let source = fake(false);
        let router = app(source.clone());
        get_body(router.clone(), "/").await;
        get_body(router, "/?searchQuery=widget").await;
        assert_eq!(source.values_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_query_is_not_trimmed() {
        let (_, body) = get_body(app(fake(false)), "/?searchQuery=%20gadget").await;
        assert!(!body.contains("Gadget"));

        let (_, body) = get_body(app(fake(false)), "/?searchQuery=").await;
        assert!(body.contains("Gadget"));
        assert!(body.contains("Widget"));
    }

    #[tokio::test]
    async fn test_overlong_query_is_rejected() {
        let uri = format!("/?searchQuery={}", "x".repeat(201));
        let (status, body) = get_body(app(fake(false)), &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("INVALID_INPUT"));
    }

    #[tokio::test]
    async fn test_healthz() {
        let (status, body) = get_body(app(fake(false)), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
