use axum::http::HeaderMap;

pub const SESSION_COOKIE_NAME: &str = "propertypulse_session";

#[derive(Clone, Debug)]
pub struct SessionCookie {
    pub session_id: String,
}

impl SessionCookie {
    pub fn new(session_id: String) -> Self {
        Self { session_id }
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        // Browsers may send several Cookie headers over HTTP/2
        for value in headers.get_all(axum::http::header::COOKIE) {
            let Ok(cookie_header) = value.to_str() else {
                continue;
            };
            for cookie in cookie_header.split(';') {
                let cookie = cookie.trim();
                if let Some(value) = cookie
                    .strip_prefix(SESSION_COOKIE_NAME)
                    .and_then(|s| s.strip_prefix('='))
                {
                    if !value.is_empty() {
                        return Some(Self {
                            session_id: value.to_string(),
                        });
                    }
                }
            }
        }
        None
    }

    /// Value for an outbound `Cookie` header.
    pub fn to_request_header(&self) -> String {
        format!("{}={}", SESSION_COOKIE_NAME, self.session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_from_headers_finds_session() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark; propertypulse_session=abc123; lang=en"),
        );

        let cookie = SessionCookie::from_headers(&headers).expect("cookie should parse");
        assert_eq!(cookie.session_id, "abc123");
    }

    #[test]
    fn test_from_headers_ignores_prefix_collisions() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("propertypulse_session_old=zzz; propertypulse_session="),
        );

        assert!(SessionCookie::from_headers(&headers).is_none());
    }

    #[test]
    fn test_request_header_round_trip() {
        let cookie = SessionCookie::new("s1".to_string());
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_str(&cookie.to_request_header()).unwrap(),
        );

        assert_eq!(SessionCookie::from_headers(&headers).unwrap().session_id, "s1");
    }
}
