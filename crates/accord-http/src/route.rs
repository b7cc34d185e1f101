//! Templated REST endpoints
//!
//! A route pairs an HTTP method with a concrete path and the template the
//! path was built from. The template survives substitution so rate-limit
//! buckets can later be keyed per route shape rather than per URL.

use reqwest::Method;

/// An endpoint of the platform REST API
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    /// Path with parameters substituted, e.g. `/channels/123/messages`
    path: String,
    /// The unsubstituted template, e.g. `/channels/{channel_id}/messages`
    bucket: &'static str,
}

impl Route {
    #[must_use]
    pub fn new(method: Method, bucket: &'static str, path: String) -> Self {
        Self { method, path, bucket }
    }

    /// Full URL under the given versioned base
    #[must_use]
    pub fn url(&self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.path)
    }

    /// The route-shape key for rate-limit bucketing
    #[must_use]
    pub const fn bucket(&self) -> &'static str {
        self.bucket
    }

    /// Whether this route mutates server state (accepts an audit reason)
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(self.method, Method::GET | Method::HEAD)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_url_joins_base() {
        let route = Route::new(Method::GET, "/users/{user_id}", "/users/42".to_string());
        assert_eq!(route.url("https://example.com/api/v9"), "https://example.com/api/v9/users/42");
        assert_eq!(route.url("https://example.com/api/v9/"), "https://example.com/api/v9/users/42");
    }

    #[test]
    fn test_route_bucket_keeps_template() {
        let route = Route::new(Method::GET, "/users/{user_id}", "/users/42".to_string());
        assert_eq!(route.bucket(), "/users/{user_id}");
    }

    #[test]
    fn test_route_is_mutation() {
        assert!(!Route::new(Method::GET, "/gateway", "/gateway".to_string()).is_mutation());
        assert!(Route::new(Method::POST, "/x", "/x".to_string()).is_mutation());
        assert!(Route::new(Method::DELETE, "/x", "/x".to_string()).is_mutation());
    }
}
