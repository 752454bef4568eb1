//! Static files served from the public directory on disk.

use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use mime_guess::Mime;
use tracing::error;

use crate::application::error::ErrorReport;

const SOURCE: &str = "infra::assets::serve";
const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Serve the file at the request path, `index.html` for directories.
    pub async fn serve(&self, request_path: &str) -> Response {
        let Some(relative) = resolve_path(request_path) else {
            return not_found_response();
        };
        let full = self.root.join(&relative);

        match tokio::fs::read(&full).await {
            Ok(contents) => {
                let mime = mime_guess::from_path(&relative).first_or_octet_stream();
                build_response(Bytes::from(contents), mime)
            }
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
                not_found_response()
            }
            Err(err) => {
                error!(
                    target = SOURCE,
                    path = %full.display(),
                    error = %err,
                    "failed to read static file"
                );
                let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
                ErrorReport::from_error(SOURCE, StatusCode::INTERNAL_SERVER_ERROR, &err)
                    .attach(&mut response);
                response
            }
        }
    }
}

/// Map a URL path to a relative file path, rejecting anything that escapes the root.
fn resolve_path(request_path: &str) -> Option<PathBuf> {
    let trimmed = request_path.trim_start_matches('/');
    let mut relative = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if trimmed.is_empty() || trimmed.ends_with('/') {
        relative.push(INDEX_FILE);
    }
    Some(relative)
}

fn not_found_response() -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    ErrorReport::from_message(SOURCE, StatusCode::NOT_FOUND, "Static file not found")
        .attach(&mut response);
    response
}

fn build_response(bytes: Bytes, mime: Mime) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_and_directories_map_to_index() {
        assert_eq!(resolve_path("/"), Some(PathBuf::from("index.html")));
        assert_eq!(resolve_path(""), Some(PathBuf::from("index.html")));
        assert_eq!(resolve_path("/docs/"), Some(PathBuf::from("docs/index.html")));
        assert_eq!(resolve_path("/style.css"), Some(PathBuf::from("style.css")));
    }

    #[test]
    fn traversal_is_rejected() {
        assert_eq!(resolve_path("/../secret"), None);
        assert_eq!(resolve_path("/a/../../b"), None);
    }

    #[tokio::test]
    async fn serves_files_with_guessed_mime() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("index.html"), "<h1>No</h1>").expect("write");
        std::fs::write(dir.path().join("style.css"), "body{}").expect("write");
        let files = StaticFiles::new(dir.path());

        let index = files.serve("/").await;
        assert_eq!(index.status(), StatusCode::OK);
        assert_eq!(
            index.headers().get(header::CONTENT_TYPE).map(HeaderValue::as_bytes),
            Some(&b"text/html"[..])
        );

        let css = files.serve("/style.css").await;
        assert_eq!(
            css.headers().get(header::CONTENT_TYPE).map(HeaderValue::as_bytes),
            Some(&b"text/css"[..])
        );

        assert_eq!(files.serve("/missing.js").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(files.serve("/../etc/passwd").await.status(), StatusCode::NOT_FOUND);
    }
}
