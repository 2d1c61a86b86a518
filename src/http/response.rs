//! HTTP response building module
//!
//! Provides builders for the responses the filter pipeline produces,
//! decoupled from specific business logic.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Build 200 response carrying compiled CSS
///
/// Content-Length is the byte length of the body; the cached bytes are
/// shared, not copied.
pub fn build_css_response(css: Bytes) -> Response<Full<Bytes>> {
    let content_length = css.len();
    Response::builder()
        .status(200)
        .header("Content-Type", "text/css;charset=UTF-8")
        .header("Content-Length", content_length)
        .body(Full::new(css))
        .unwrap_or_else(|e| {
            log_build_error("CSS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("404 Not Found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from("404 Not Found")))
        })
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(500)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("500 Internal Server Error")))
        .unwrap_or_else(|e| {
            log_build_error("500", &e);
            Response::new(Full::new(Bytes::from("500 Internal Server Error")))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_response_headers() {
        let css = ".a {\n  color: red;\n}\n";
        let response = build_css_response(Bytes::from_static(css.as_bytes()));
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["Content-Type"], "text/css;charset=UTF-8");
        assert_eq!(
            response.headers()["Content-Length"],
            css.len().to_string().as_str()
        );
    }

    #[test]
    fn test_css_response_sets_no_cache_headers() {
        let response = build_css_response(Bytes::from_static(b"x"));
        assert!(response.headers().get("Cache-Control").is_none());
        assert!(response.headers().get("ETag").is_none());
    }

    #[test]
    fn test_404_response() {
        let response = build_404_response();
        assert_eq!(response.status(), 404);
        assert_eq!(response.headers()["Content-Type"], "text/plain");
    }

    #[test]
    fn test_500_response() {
        let response = build_500_response();
        assert_eq!(response.status(), 500);
    }
}
