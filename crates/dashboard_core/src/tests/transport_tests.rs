use std::{collections::HashMap, sync::Arc};

use super::*;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap as AxumHeaders, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use shared::domain::FilterState;
use tokio::{net::TcpListener, sync::Mutex};

use crate::normalize::normalize;

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(HashMap<String, String>, Option<String>)>>>,
}

async fn record(state: &Recorded, query: HashMap<String, String>, headers: &AxumHeaders) {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.requests.lock().await.push((query, cookie));
}

async fn ok_filter(
    State(state): State<Recorded>,
    Query(query): Query<HashMap<String, String>>,
    headers: AxumHeaders,
) -> Json<serde_json::Value> {
    record(&state, query, &headers).await;
    Json(json!({
        "row_count": 2,
        "columns": ["timestamp", "hospital"],
        "table_html": "<table><tr><td>1</td></tr></table>"
    }))
}

async fn charts_with_error() -> Json<serde_json::Value> {
    Json(json!({ "error": "bigquery quota exceeded" }))
}

async fn unauthorized() -> StatusCode {
    StatusCode::UNAUTHORIZED
}

async fn login_redirect() -> Redirect {
    Redirect::temporary("/login-page")
}

async fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "table query failed" })),
    )
        .into_response()
}

async fn garbage() -> &'static str {
    "<html>not json</html>"
}

async fn spawn_server(app: Router) -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

fn sample_params() -> QueryParams {
    let mut state = FilterState::with_hospitals(vec!["Mercy".into(), "Alpha".into()]);
    state.escalation = "Fall Risk".into();
    state.hospitals.selected = vec!["Mercy".into()];
    state.exclude_camera_annotations = true;
    normalize(&state)
}

#[tokio::test]
async fn fetch_table_sends_params_and_session_cookie() {
    let recorded = Recorded::default();
    let app = Router::new()
        .route(FILTER_PATH, get(ok_filter))
        .with_state(recorded.clone());
    let server_url = spawn_server(app).await.expect("server");

    let api = HttpDashboardApi::new(
        &server_url,
        HttpOptions {
            session_cookie: Some("session=abc123".into()),
            request_timeout: None,
        },
    )
    .expect("client");

    let table = api.fetch_table(&sample_params()).await.expect("table");
    assert_eq!(table.row_count, 2);
    assert_eq!(table.columns, vec!["timestamp", "hospital"]);

    let requests = recorded.requests.lock().await;
    let (query, cookie) = &requests[0];
    assert_eq!(query.get("escalation").map(String::as_str), Some("Fall Risk"));
    assert_eq!(query.get("email").map(String::as_str), Some("all"));
    assert_eq!(query.get("hospital").map(String::as_str), Some("Mercy"));
    assert_eq!(query.get("date").map(String::as_str), Some("all"));
    assert_eq!(query.get("exclude_camera").map(String::as_str), Some("true"));
    assert_eq!(cookie.as_deref(), Some("session=abc123"));
}

#[tokio::test]
async fn unauthorized_status_requires_reauth() {
    let app = Router::new().route(FILTER_PATH, get(unauthorized));
    let server_url = spawn_server(app).await.expect("server");
    let api = HttpDashboardApi::new(&server_url, HttpOptions::default()).expect("client");

    let err = api.fetch_table(&sample_params()).await.expect_err("401");
    assert!(matches!(err, FetchError::Unauthorized { status: 401 }));
}

#[tokio::test]
async fn login_redirect_is_not_followed() {
    let app = Router::new()
        .route(CHARTS_PATH, get(login_redirect))
        .route("/login-page", get(garbage));
    let server_url = spawn_server(app).await.expect("server");
    let api = HttpDashboardApi::new(&server_url, HttpOptions::default()).expect("client");

    let err = api.fetch_charts(&sample_params()).await.expect_err("redirect");
    assert!(matches!(err, FetchError::Unauthorized { status: 307 }));
}

#[tokio::test]
async fn server_error_body_is_kept_as_detail() {
    let app = Router::new().route(FILTER_PATH, get(server_error));
    let server_url = spawn_server(app).await.expect("server");
    let api = HttpDashboardApi::new(&server_url, HttpOptions::default()).expect("client");

    match api.fetch_table(&sample_params()).await {
        Err(FetchError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message.as_deref(), Some("table query failed"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn chart_error_field_is_returned_not_raised() {
    let app = Router::new().route(CHARTS_PATH, get(charts_with_error));
    let server_url = spawn_server(app).await.expect("server");
    let api = HttpDashboardApi::new(&server_url, HttpOptions::default()).expect("client");

    let charts = api.fetch_charts(&sample_params()).await.expect("200");
    assert_eq!(charts.server_error(), Some("bigquery quota exceeded"));
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let app = Router::new().route(FILTER_PATH, get(garbage));
    let server_url = spawn_server(app).await.expect("server");
    let api = HttpDashboardApi::new(&server_url, HttpOptions::default()).expect("client");

    let err = api.fetch_table(&sample_params()).await.expect_err("decode");
    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let api = HttpDashboardApi::new(&format!("http://{addr}"), HttpOptions::default())
        .expect("client");
    let err = api.fetch_table(&sample_params()).await.expect_err("refused");
    assert!(matches!(err, FetchError::Transport(_)));
}

#[test]
fn endpoint_url_encodes_params_in_wire_order() {
    let api = HttpDashboardApi::new("http://dashboard.local", HttpOptions::default())
        .expect("client");
    let url = api
        .endpoint_url(FILTER_PATH, &sample_params())
        .expect("url");
    assert_eq!(
        url.as_str(),
        "http://dashboard.local/api/filter?escalation=Fall+Risk&email=all&hospital=Mercy&date=all&exclude_camera=true"
    );
}
