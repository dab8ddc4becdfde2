//! `htu` reconstruction: the absolute URI the client must have signed.
//!
//! Scheme and host come from `PUBLIC_BASE_URL` when configured, otherwise from
//! the proxy headers. The query string is never part of `htu`.

use axum::extract::OriginalUri;
use axum::http::{HeaderMap, Request, Uri, header};

/// `htu` for a request seen inside a nested router. Nesting strips the
/// prefix from `req.uri()`; the client signed the full path.
pub fn request_htu<B>(req: &Request<B>, public_base_url: Option<&str>) -> String {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or_else(|| req.uri());
    expected_htu(req.headers(), uri, public_base_url)
}

pub fn expected_htu(headers: &HeaderMap, uri: &Uri, public_base_url: Option<&str>) -> String {
    if let Some(base) = public_base_url {
        if let Ok(url) = htu_from_base(base, uri) {
            return url;
        }
        tracing::warn!(base, "PUBLIC_BASE_URL is not a valid base, using request headers");
    }
    htu_from_forwarded(headers, uri)
}

fn htu_from_base(base: &str, uri: &Uri) -> Result<String, url::ParseError> {
    let mut url = url::Url::parse(base)?;
    url.set_path(uri.path());
    url.set_query(None);
    url.set_fragment(None);

    Ok(url.to_string())
}

fn htu_from_forwarded(headers: &HeaderMap, uri: &Uri) -> String {
    let first = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            // proxies may append: "https, http"
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let scheme = first("x-forwarded-proto").unwrap_or("http");
    let host = first("x-forwarded-host")
        .or_else(|| first(header::HOST.as_str()))
        .unwrap_or("localhost");

    format!("{}://{}{}", scheme, host, uri.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn base_url_wins_and_query_is_dropped() {
        let uri: Uri = "/api/v1/auth/profile?x=1".parse().unwrap();
        let h = headers(&[("host", "internal:3000")]);

        assert_eq!(
            expected_htu(&h, &uri, Some("https://api.example.com")),
            "https://api.example.com/api/v1/auth/profile"
        );
    }

    #[test]
    fn forwarded_headers_are_used_without_base() {
        let uri: Uri = "/api/v1/auth/line_login".parse().unwrap();
        let h = headers(&[
            ("host", "internal:3000"),
            ("x-forwarded-proto", "https"),
            ("x-forwarded-host", "api.example.com, proxy.local"),
        ]);

        assert_eq!(
            expected_htu(&h, &uri, None),
            "https://api.example.com/api/v1/auth/line_login"
        );
    }

    #[test]
    fn host_header_and_defaults() {
        let uri: Uri = "/health?verbose".parse().unwrap();
        assert_eq!(
            expected_htu(&headers(&[("host", "127.0.0.1:3000")]), &uri, None),
            "http://127.0.0.1:3000/health"
        );
        assert_eq!(
            expected_htu(&HeaderMap::new(), &uri, None),
            "http://localhost/health"
        );
    }

    #[test]
    fn original_uri_takes_precedence() {
        let mut req = Request::get("/auth/profile")
            .header("host", "api.example.com")
            .body(())
            .unwrap();
        assert_eq!(request_htu(&req, None), "http://api.example.com/auth/profile");

        req.extensions_mut()
            .insert(OriginalUri("/api/v1/auth/profile?a=b".parse().unwrap()));
        assert_eq!(
            request_htu(&req, None),
            "http://api.example.com/api/v1/auth/profile"
        );
    }

    #[test]
    fn invalid_base_falls_back_to_headers() {
        let uri: Uri = "/p".parse().unwrap();
        assert_eq!(
            expected_htu(&headers(&[("host", "h")]), &uri, Some("not a url")),
            "http://h/p"
        );
    }
}
