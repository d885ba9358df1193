// tests/http.rs

//! HTTP surface tests: rebuild endpoint, feed endpoints, downloads,
//! client-error handling.

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use nupkgd::server::{ServerState, create_router};
use nupkgd::{Config, db, index};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct Fixture {
    _dir: TempDir,
    packages: PathBuf,
    db_path: PathBuf,
    app: Router,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let packages = dir.path().join("packages");
    std::fs::create_dir(&packages).unwrap();
    let db_path = dir.path().join("index.db");
    db::init(&db_path).unwrap();

    let config = Config {
        package_directory: packages.clone(),
        db_path: db_path.clone(),
        ..Config::default()
    };
    let app = create_router(Arc::new(ServerState::new(config)));

    Fixture {
        _dir: dir,
        packages,
        db_path,
        app,
    }
}

impl Fixture {
    fn rebuild(&self) {
        let mut conn = db::open(&self.db_path).unwrap();
        index::rebuild(&mut conn, &self.packages, "http://localhost:5000").unwrap();
    }

    async fn get(&self, uri: &str) -> (StatusCode, String) {
        let response = self
            .app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }
}

#[tokio::test]
async fn test_build_index_returns_summary_json() {
    let fx = fixture();
    common::write_simple_nupkg(&fx.packages, "Alpha", "1.0.0");
    common::write_simple_nupkg(&fx.packages, "Beta", "2.0.0");

    let (status, body) = fx.get("/BuildIndex").await;
    assert_eq!(status, StatusCode::OK);

    let summary: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(summary["addedCount"], 2);
    assert_eq!(summary["added"][0], "Alpha:1.0.0");
    assert_eq!(summary["updatedCount"], 0);
    assert_eq!(summary["deletedCount"], 0);
}

#[tokio::test]
async fn test_search_returns_feed_document() {
    let fx = fixture();
    common::write_simple_nupkg(&fx.packages, "Alpha", "1.0.0");
    fx.rebuild();

    let (status, body) = fx.get("/Search()").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with(r#"<?xml version="1.0" encoding="utf-8"?><feed"#));
    assert!(body.contains("<m:count>1</m:count>"));
    assert!(body.contains("Packages(Id='Alpha',Version='1.0.0')"));
}

#[tokio::test]
async fn test_packages_route_is_search() {
    let fx = fixture();
    common::write_simple_nupkg(&fx.packages, "Alpha", "1.0.0");
    fx.rebuild();

    let (status, body) = fx.get("/Packages()?searchTerm='Alpha'").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<m:count>1</m:count>"));

    let (_, no_match) = fx.get("/Packages()?searchTerm='Zeta'").await;
    assert!(no_match.contains("<m:count>0</m:count>"));
}

#[tokio::test]
async fn test_pagination_default_take_is_five() {
    let fx = fixture();
    for i in 0..7 {
        common::write_simple_nupkg(&fx.packages, &format!("Pkg{i}"), "1.0.0");
    }
    fx.rebuild();

    let (_, body) = fx.get("/Search()").await;
    // count reflects the full filtered set, the page holds five entries
    assert!(body.contains("<m:count>7</m:count>"));
    assert_eq!(body.matches("<entry>").count(), 5);

    let (_, page2) = fx.get("/Search()?$skip=5&$top=5").await;
    assert_eq!(page2.matches("<entry>").count(), 2);
}

#[tokio::test]
async fn test_projection_via_select() {
    let fx = fixture();
    common::write_simple_nupkg(&fx.packages, "Alpha", "1.0.0");
    fx.rebuild();

    let (_, body) = fx.get("/Packages()?$select=Tags").await;
    assert!(body.contains("<d:Tags>test</d:Tags>"));
    assert!(!body.contains("<d:Description>"));
    assert!(body.contains("<author><name>Jane Dev</name></author>"));
}

#[tokio::test]
async fn test_find_packages_by_id() {
    let fx = fixture();
    common::write_simple_nupkg(&fx.packages, "Alpha", "1.0.0");
    common::write_simple_nupkg(&fx.packages, "Alpha", "1.1.0");
    common::write_simple_nupkg(&fx.packages, "Beta", "2.0.0");
    fx.rebuild();

    let (status, body) = fx.get("/FindPackagesById()?id='Alpha'").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<m:count>2</m:count>"));
    assert!(!body.contains("Beta"));

    // missing id parameter is a client error
    let (status, _) = fx.get("/FindPackagesById()").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_prerelease_excluded_by_default_over_http() {
    let fx = fixture();
    common::write_simple_nupkg(&fx.packages, "Stable", "1.0.0");
    common::write_simple_nupkg(&fx.packages, "Edge", "2.0.0-beta1");
    fx.rebuild();

    let (_, body) = fx.get("/Search()").await;
    assert!(body.contains("<m:count>1</m:count>"));

    let (_, body) = fx.get("/Search()?includePrerelease=true").await;
    assert!(body.contains("<m:count>2</m:count>"));
}

#[tokio::test]
async fn test_malformed_top_is_bad_request() {
    let fx = fixture();
    let (status, _) = fx.get("/Search()?$top=banana").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = fx.get("/Search()?$skip=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_streams_archive() {
    let fx = fixture();
    let path = common::write_simple_nupkg(&fx.packages, "Alpha", "1.0.0");
    let expected = std::fs::read(&path).unwrap();

    let response = fx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/Package/Alpha/1.0.0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/zip"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes.to_vec(), expected);

    let (status, _) = fx.get("/Package/Alpha/9.9.9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
