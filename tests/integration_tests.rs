//! End-to-end tests against a local HTTP endpoint.
//!
//! Fixtures live in tests/data/.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use rangecache::cache::Resolution;
use rangecache::interval::ContigInterval;
use rangecache::remote::{HttpTransport, RemoteRequest};
use rangecache::sources::{
    Coverage, CoverageDataSource, FeatureDataSource, Features, Notification, Progress,
};
use rangecache::types::GenomeRange;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Clone, Default)]
struct Hits(Arc<AtomicUsize>);

fn fixture(name: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name);
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

async fn features(State(hits): State<Hits>, Path(contig): Path<String>) -> Response {
    hits.0.fetch_add(1, Ordering::SeqCst);
    if contig == "chrM" {
        Json(fixture("features-chrM-1000-1200.json")).into_response()
    } else {
        // no data: empty body
        StatusCode::OK.into_response()
    }
}

async fn coverage(
    State(hits): State<Hits>,
    Path(contig): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    hits.0.fetch_add(1, Ordering::SeqCst);
    let param = |name: &str| params[name].parse::<u64>().unwrap();
    let (start, end, step) = (param("start"), param("end"), param("binning"));
    let counts: Vec<Value> = (start..=end)
        .filter(|p| p % step == 0)
        .map(|p| json!({"contig": contig, "position": p, "count": 10 + p % 7}))
        .collect();
    Json(Value::Array(counts))
}

async fn broken(State(hits): State<Hits>) -> StatusCode {
    hits.0.fetch_add(1, Ordering::SeqCst);
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn server_error(State(hits): State<Hits>) -> Json<Value> {
    hits.0.fetch_add(1, Ordering::SeqCst);
    Json(json!({"errorCode": 404, "message": "no such reference"}))
}

/// Serve the test routes on an ephemeral port; returns the base URL.
async fn spawn_server(hits: Hits) -> String {
    let app = Router::new()
        .route("/features/:contig", get(features))
        .route("/coverage/:contig", get(coverage))
        .route("/broken/:contig", get(broken))
        .route("/error/:contig", get(server_error))
        .with_state(hits);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_fetch_features_over_http() {
    let hits = Hits::default();
    let base = spawn_server(hits.clone()).await;
    let source = FeatureDataSource::from_url(Features, &format!("{}/features", base)).unwrap();
    let range = ContigInterval::new("chrM", 1000, 1200);

    assert!(source.get_features_in_range(&range, None).is_empty());

    let mut rx = source.subscribe();
    source.fetch(&GenomeRange::new("chrM", 1000, 1200)).await;

    let features = source.get_features_in_range(&range, None);
    assert_eq!(features.len(), 2);
    assert_eq!(features[0].start, 1011);
    assert_eq!(features[0].feature_type, "gene");
    assert_eq!(
        drain(&mut rx),
        vec![
            Notification::NetworkProgress(Progress::Gaps(1)),
            Notification::NewData(ContigInterval::new("chrM", 0, 10000)),
            Notification::NetworkDone,
        ]
    );
}

#[tokio::test]
async fn test_preconfigured_client() {
    let hits = Hits::default();
    let base = spawn_server(hits.clone()).await;
    let client = reqwest::Client::builder()
        .user_agent("rangecache-tests")
        .build()
        .unwrap();
    let transport = Arc::new(HttpTransport::with_client(client));
    let remote = RemoteRequest::new(&format!("{}/features", base), transport).unwrap();
    let source = FeatureDataSource::new(Features, remote);

    source.fetch(&GenomeRange::new("chrM", 1000, 1200)).await;

    assert_eq!(hits.0.load(Ordering::SeqCst), 1);
    assert_eq!(
        source
            .get_features_in_range(&ContigInterval::new("chrM", 1000, 1200), None)
            .len(),
        2
    );
}

#[tokio::test]
async fn test_repeated_range_is_served_from_cache() {
    let hits = Hits::default();
    let base = spawn_server(hits.clone()).await;
    let source = FeatureDataSource::from_url(Features, &format!("{}/features", base)).unwrap();

    source.fetch(&GenomeRange::new("chrM", 1000, 1200)).await;
    source.fetch(&GenomeRange::new("chrM", 1000, 1200)).await;
    source.fetch(&GenomeRange::new("chrM", 2000, 9000)).await;

    assert_eq!(hits.0.load(Ordering::SeqCst), 1);
    assert_eq!(source.num_network_requests(), 1);
}

#[tokio::test]
async fn test_empty_body_is_no_data() {
    let hits = Hits::default();
    let base = spawn_server(hits.clone()).await;
    let source = FeatureDataSource::from_url(Features, &format!("{}/features", base)).unwrap();
    let range = ContigInterval::new("chr22", 1, 500);
    let mut rx = source.subscribe();

    source.fetch(&GenomeRange::new("chr22", 1, 500)).await;

    assert!(source.covers_range(&range, None));
    assert!(source.get_features_in_range(&range, None).is_empty());
    assert!(!drain(&mut rx)
        .iter()
        .any(|e| matches!(e, Notification::NetworkFailure(_))));
}

#[tokio::test]
async fn test_http_error_is_network_failure() {
    let hits = Hits::default();
    let base = spawn_server(hits.clone()).await;
    let source = FeatureDataSource::from_url(Features, &format!("{}/broken", base)).unwrap();
    let mut rx = source.subscribe();

    source.fetch(&GenomeRange::new("chrM", 1000, 1200)).await;

    let events = drain(&mut rx);
    assert!(matches!(&events[1], Notification::NetworkFailure(msg) if msg.contains("500")));
    assert_eq!(events.last(), Some(&Notification::NetworkDone));

    // the range stays covered, so it is not retried
    source.fetch(&GenomeRange::new("chrM", 1000, 1200)).await;
    assert_eq!(hits.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_error_code_is_network_failure() {
    let hits = Hits::default();
    let base = spawn_server(hits.clone()).await;
    let source = FeatureDataSource::from_url(Features, &format!("{}/error", base)).unwrap();
    let mut rx = source.subscribe();

    source.fetch(&GenomeRange::new("chrM", 1000, 1200)).await;

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, Notification::NetworkFailure(msg) if msg.contains("errorCode"))));
    assert!(source
        .get_features_in_range(&ContigInterval::new("chrM", 0, 10000), None)
        .is_empty());
}

#[tokio::test]
async fn test_coverage_tiers_over_http() {
    let hits = Hits::default();
    let base = spawn_server(hits.clone()).await;
    let source = CoverageDataSource::from_url(Coverage, &format!("{}/coverage", base)).unwrap();

    // zoomed out, then zoomed in on part of the same region
    let wide = ContigInterval::new("chr1", 0, 200_000);
    let narrow = ContigInterval::new("chr1", 1000, 1100);
    source.fetch(&GenomeRange::from(&wide)).await;
    source.fetch(&GenomeRange::from(&narrow)).await;

    // the narrow view is a different tier, so it needed its own request
    assert_eq!(hits.0.load(Ordering::SeqCst), 2);

    let binned = source.get_coverage_in_range(&wide, Some(Resolution::new(100)));
    assert_eq!(binned.len(), 2001);
    assert!(binned.iter().all(|p| p.position % 100 == 0));

    let exact = source.get_coverage_in_range(&narrow, Some(Resolution::BASE));
    assert_eq!(exact.len(), 101);
    assert_eq!(source.max_coverage(&narrow, Some(Resolution::BASE)), Some(16));
}
