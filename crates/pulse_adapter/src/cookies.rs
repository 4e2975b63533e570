#![forbid(unsafe_code)]

use axum::http::{header, HeaderMap};

pub const SESSION_COOKIE: &str = "pulse_session";

/// Extracts the sealed session value from the request's Cookie headers.
pub fn session_cookie_value(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(sealed: &str) -> String {
    format!("{SESSION_COOKIE}={sealed}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(line: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(line).unwrap());
        headers
    }

    #[test]
    fn at_cookie_01_session_value_is_found_among_other_cookies() {
        let headers =
            headers_with_cookie("theme=dark; pulse_session=c2VhbGVk; lang=en");
        assert_eq!(
            session_cookie_value(&headers).as_deref(),
            Some("c2VhbGVk")
        );
    }

    #[test]
    fn at_cookie_02_absent_session_reads_as_none() {
        let headers = headers_with_cookie("theme=dark; lang=en");
        assert_eq!(session_cookie_value(&headers), None);
        assert_eq!(session_cookie_value(&HeaderMap::new()), None);
    }

    #[test]
    fn at_cookie_03_set_and_clear_lines_target_the_whole_site() {
        assert!(session_cookie("abc").starts_with("pulse_session=abc; Path=/"));
        assert!(session_cookie("abc").contains("HttpOnly"));
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }
}
