//! Embedded static asset serving.

use axum::{
    body::Body,
    extract::Path,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use include_dir::{Dir, include_dir};
use mime_guess::Mime;

use crate::application::error::ErrorReport;

static PUBLIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets");

const SCRIPT_DIR: &str = "js";

/// Serve embedded scripts under `/js/`.
pub async fn serve_script(Path(path): Path<String>) -> Response {
    let candidate = format!("{SCRIPT_DIR}/{}", path.trim_start_matches('/'));
    serve_static(&PUBLIC_ASSETS, &candidate, "infra::assets::serve_script")
}

/// Raw bytes of an embedded asset, for the export command.
pub fn asset_bytes(path: &str) -> Option<&'static [u8]> {
    let candidate = normalize(path)?;
    PUBLIC_ASSETS.get_file(candidate).map(|file| file.contents())
}

/// Relative paths of every embedded asset.
pub fn asset_paths() -> Vec<&'static str> {
    let mut paths = Vec::new();
    collect_paths(&PUBLIC_ASSETS, &mut paths);
    paths
}

fn collect_paths(dir: &'static Dir<'static>, out: &mut Vec<&'static str>) {
    for file in dir.files() {
        if let Some(path) = file.path().to_str() {
            out.push(path);
        }
    }
    for child in dir.dirs() {
        collect_paths(child, out);
    }
}

fn serve_static(bundle: &'static Dir<'static>, path: &str, source: &'static str) -> Response {
    let Some(candidate) = normalize(path) else {
        return not_found_response(source);
    };
    match bundle.get_file(candidate) {
        Some(file) => build_response(
            Bytes::from_static(file.contents()),
            mime_guess::from_path(candidate).first_or_octet_stream(),
        ),
        None => not_found_response(source),
    }
}

/// Reject traversal and directory requests.
fn normalize(path: &str) -> Option<&str> {
    let candidate = path.trim_start_matches('/');
    if candidate.is_empty() || candidate.ends_with('/') || candidate.contains("..") {
        return None;
    }
    Some(candidate)
}

fn not_found_response(source: &'static str) -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    ErrorReport::from_message(source, StatusCode::NOT_FOUND, "Static asset not found")
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
    fn error_filter_is_embedded() {
        let script = asset_bytes("js/error-filter.js").expect("script embedded");
        let script = std::str::from_utf8(script).expect("utf-8 script");
        assert!(script.contains("chrome-extension://"));
        assert!(asset_paths().contains(&"js/error-filter.js"));
    }

    #[test]
    fn traversal_is_rejected() {
        assert!(normalize("../Cargo.toml").is_none());
        assert!(normalize("js/").is_none());
        assert_eq!(normalize("/js/error-filter.js"), Some("js/error-filter.js"));
    }
}
