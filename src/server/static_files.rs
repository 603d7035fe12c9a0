// src/server/static_files.rs

//! Static file serving for the output root. HTML pages and directory
//! listings get the reload client injected; everything else goes through
//! `ServeDir`.

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use html_escape::{encode_double_quoted_attribute, encode_text};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::debug;

use super::{ServerState, CLIENT_PATH};

/// Characters left as is in a listing link; everything else is escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub(super) async fn serve(State(state): State<ServerState>, request: Request) -> Response {
    let url_path = request.uri().path().to_string();
    let Some(rel) = safe_relative(&url_path) else {
        return StatusCode::FORBIDDEN.into_response();
    };
    let path = state.root.join(&rel);

    let Ok(meta) = tokio::fs::metadata(&path).await else {
        debug!(%url_path, "not found");
        return StatusCode::NOT_FOUND.into_response();
    };

    if meta.is_dir() {
        if !url_path.ends_with('/') {
            return Redirect::permanent(&format!("{url_path}/")).into_response();
        }
        let index = path.join("index.html");
        if index.is_file() {
            return html_file(&index).await;
        }
        return match listing(&path, &url_path).await {
            Ok(html) => html_response(html),
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        };
    }

    if is_html(&path) {
        return html_file(&path).await;
    }
    static_file(&state.root, request).await
}

/// Decode the URL path and reject anything that could escape the root.
fn safe_relative(url_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(url_path).decode_utf8().ok()?;
    let mut rel = PathBuf::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains('\\') || s.contains('\0') => return None,
            s => rel.push(s),
        }
    }
    Some(rel)
}

fn is_html(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first()
        .is_some_and(|mime| mime.subtype() == mime_guess::mime::HTML)
}

async fn static_file(root: &Path, request: Request) -> Response {
    let response = match ServeDir::new(root).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let mut response = response.map(Body::new);
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

async fn html_file(path: &Path) -> Response {
    match tokio::fs::read_to_string(path).await {
        Ok(html) => html_response(inject_client(&html)),
        Err(err) => {
            debug!(file = %path.display(), %err, "unreadable page");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn html_response(html: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        html,
    )
        .into_response()
}

/// Insert the reload client before the last `</body>`, or append it.
pub(super) fn inject_client(html: &str) -> String {
    let tag = format!("<script src=\"{CLIENT_PATH}\"></script>");
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(at) => format!("{}{tag}{}", &html[..at], &html[at..]),
        None => format!("{html}{tag}"),
    }
}

async fn listing(dir: &Path, url_path: &str) -> std::io::Result<String> {
    let mut entries = Vec::new();
    let mut read = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = read.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        entries.push((name, is_dir));
    }
    entries.sort();

    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Index of {0}</title></head>\n<body>\n<h1>Index of {0}</h1>\n<ul>\n",
        encode_text(url_path)
    );
    if url_path != "/" {
        html.push_str("<li><a href=\"../\">../</a></li>\n");
    }
    for (name, is_dir) in &entries {
        let slash = if *is_dir { "/" } else { "" };
        let href = utf8_percent_encode(name, PATH_SEGMENT).to_string();
        html.push_str(&format!(
            "<li><a href=\"{}{slash}\">{}{slash}</a></li>\n",
            encode_double_quoted_attribute(&href),
            encode_text(name),
        ));
    }
    html.push_str("</ul>\n</body>\n</html>\n");
    Ok(inject_client(&html))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::body::to_bytes;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::server::{router, ReloadHandle};

    async fn get(root: &Path, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = router(root.to_path_buf(), ReloadHandle::new())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, location, String::from_utf8_lossy(&body).into_owned())
    }

    #[test]
    fn traversal_is_rejected() {
        assert_eq!(safe_relative("/a/b.css"), Some(PathBuf::from("a/b.css")));
        assert_eq!(safe_relative("/my%20file.txt"), Some(PathBuf::from("my file.txt")));
        assert_eq!(safe_relative("/../etc/passwd"), None);
        assert_eq!(safe_relative("/a/%2e%2e/b"), None);
    }

    #[test]
    fn client_goes_before_closing_body() {
        let out = inject_client("<html><BODY><p>x</p></BODY></html>");
        assert_eq!(
            out,
            "<html><BODY><p>x</p><script src=\"/__assetflow/client.js\"></script></BODY></html>"
        );
        assert!(inject_client("<p>frag</p>").ends_with("</script>"));
    }

    #[tokio::test]
    async fn serves_index_listing_and_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets/css")).unwrap();
        fs::write(dir.path().join("index.html"), "<body>home</body>").unwrap();
        fs::write(dir.path().join("assets/css/main.css"), "a{}").unwrap();

        let (status, _, body) = get(dir.path(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("home<script src=\"/__assetflow/client.js\">"));

        let (status, _, body) = get(dir.path(), "/assets/css/main.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "a{}");

        let (status, location, _) = get(dir.path(), "/assets").await;
        assert_eq!(status, StatusCode::PERMANENT_REDIRECT);
        assert_eq!(location.as_deref(), Some("/assets/"));

        let (status, _, body) = get(dir.path(), "/assets/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<a href=\"css/\">css/</a>"));

        let (status, _, _) = get(dir.path(), "/missing.js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn assets_keep_their_content_type_and_skip_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.css"), "a{}").unwrap();

        let response = router(dir.path().to_path_buf(), ReloadHandle::new())
            .oneshot(Request::builder().uri("/main.css").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    }

    #[tokio::test]
    async fn listing_links_are_url_encoded_and_names_escaped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a#b")).unwrap();
        fs::write(dir.path().join("my file & <co>.txt"), "x").unwrap();
        fs::write(dir.path().join("50%.txt"), "half").unwrap();

        let (status, _, body) = get(dir.path(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(
            body.contains("<a href=\"my%20file%20%26%20%3Cco%3E.txt\">my file &amp; &lt;co&gt;.txt</a>"),
            "{body}"
        );
        assert!(body.contains("<a href=\"a%23b/\">a#b/</a>"), "{body}");
        assert!(body.contains("<a href=\"50%25.txt\">50%.txt</a>"), "{body}");

        let (status, _, body) = get(dir.path(), "/50%25.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "half");
    }

    #[test]
    fn invalid_utf8_escapes_are_rejected() {
        assert_eq!(safe_relative("/%ff.css"), None);
    }
}
