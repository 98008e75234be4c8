//! Test utilities and common setup.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header},
};
use tempfile::TempDir;
use tower::ServiceExt;

use dirshare::{AppState, Config, ServerRoot, routes};

pub const BOUNDARY: &str = "dirshare-test-boundary";

/// A served tree: `a.txt` and `sub/b.txt`, plus an unrelated `other/` tree
/// that can be switched to.
pub struct Fixture {
    pub data: TempDir,
    pub other: TempDir,
    pub app: Router,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let data = TempDir::new().unwrap();
        std::fs::write(data.path().join("a.txt"), "alpha").unwrap();
        std::fs::create_dir(data.path().join("sub")).unwrap();
        std::fs::write(data.path().join("sub/b.txt"), "bravo").unwrap();

        let other = TempDir::new().unwrap();
        std::fs::write(other.path().join("other.txt"), "other").unwrap();

        let root = ServerRoot::open(data.path()).unwrap();
        let app = routes::app(AppState::with_config(root, config));

        Self { data, other, app }
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).method(Method::GET).body(Body::empty()).unwrap())
            .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn upload(&self, field: &str, filename: &str, content: &str) -> Response<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\
             \r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );

        self.send(
            Request::builder()
                .uri("/upload")
                .method(Method::POST)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
