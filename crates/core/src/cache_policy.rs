//! Offline caching policy for the web client.
//!
//! The browser worker keeps two named caches and picks a strategy per
//! request. The server uses the same rules to stamp `Cache-Control` headers
//! on the frontend bundle and publishes them as JSON for the worker.

use serde::Serialize;

use crate::error::CoreError;

pub const STATIC_CACHE: &str = "koinonia-static-v1";
pub const DYNAMIC_CACHE: &str = "koinonia-dynamic-v1";

/// Freshness of cache-first static assets.
pub const STATIC_MAX_AGE_SECS: u64 = 3600;

pub const STATIC_EXTENSIONS: &[&str] = &["js", "css", "png", "jpg", "svg", "ico"];

/// Path prefixes that always go to the network untouched.
pub const BYPASS_PATH_PREFIXES: &[&str] = &["/api/", "/storage/"];

/// Which named cache a strategy reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheName {
    Static,
    Dynamic,
}

impl CacheName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Static => STATIC_CACHE,
            Self::Dynamic => DYNAMIC_CACHE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", content = "cache", rename_all = "snake_case")]
pub enum Strategy {
    /// Not intercepted.
    Bypass,
    /// Try the network, store the response, fall back to the cache offline.
    NetworkFirst(CacheName),
    /// Serve from cache, fetch and store on a miss.
    CacheFirst(CacheName),
}

/// The parts of a request the policy looks at.
#[derive(Debug, Clone, Copy)]
pub struct RequestInfo<'a> {
    pub method: &'a str,
    /// Scheme + host (+ port) of the request URL.
    pub origin: &'a str,
    pub path: &'a str,
    pub accept: Option<&'a str>,
    /// Browser `navigate` request mode.
    pub is_navigation: bool,
}

/// Pick the strategy for a request made from `app_origin`.
///
/// Non-GET, cross-origin, API and backend-host requests are bypassed.
pub fn classify(
    request: &RequestInfo<'_>,
    app_origin: &str,
    backend_hostname: Option<&str>,
) -> Strategy {
    if !request.method.eq_ignore_ascii_case("GET") {
        return Strategy::Bypass;
    }
    if request.origin != app_origin {
        return Strategy::Bypass;
    }
    if let Some(host) = backend_hostname {
        if host_of(request.origin) == host {
            return Strategy::Bypass;
        }
    }
    if BYPASS_PATH_PREFIXES
        .iter()
        .any(|prefix| request.path.starts_with(prefix))
    {
        return Strategy::Bypass;
    }

    let wants_html = request
        .accept
        .is_some_and(|accept| accept.contains("text/html"));
    if request.is_navigation || wants_html {
        return Strategy::NetworkFirst(CacheName::Dynamic);
    }
    if is_static_asset(request.path) {
        return Strategy::CacheFirst(CacheName::Static);
    }
    Strategy::NetworkFirst(CacheName::Dynamic)
}

/// Whether a path ends with one of [`STATIC_EXTENSIONS`].
pub fn is_static_asset(path: &str) -> bool {
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((_, ext)) => STATIC_EXTENSIONS
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// `Cache-Control` value for a frontend file.
pub fn cache_control_for(path: &str) -> String {
    if is_static_asset(path) {
        format!("public, max-age={STATIC_MAX_AGE_SECS}")
    } else {
        "no-cache".to_string()
    }
}

/// Caches left behind by older worker versions, to be deleted on activation.
pub fn stale_caches(existing: &[String]) -> Vec<String> {
    existing
        .iter()
        .filter(|name| name.as_str() != STATIC_CACHE && name.as_str() != DYNAMIC_CACHE)
        .cloned()
        .collect()
}

fn host_of(origin: &str) -> &str {
    let without_scheme = origin
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(origin);
    without_scheme
        .split(['/', ':'])
        .next()
        .unwrap_or(without_scheme)
}

// ---------------------------------------------------------------------------
// Control messages
// ---------------------------------------------------------------------------

/// Messages the page can post to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlMessage {
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
    #[serde(rename = "CLEAR_CACHE")]
    ClearCache,
}

impl ControlMessage {
    pub const ALL: [ControlMessage; 2] = [Self::SkipWaiting, Self::ClearCache];

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "SKIP_WAITING" => Ok(Self::SkipWaiting),
            "CLEAR_CACHE" => Ok(Self::ClearCache),
            other => Err(CoreError::Validation(format!(
                "Unknown control message '{other}'"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SkipWaiting => "SKIP_WAITING",
            Self::ClearCache => "CLEAR_CACHE",
        }
    }

    /// Caches the worker must drop when handling this message.
    pub fn caches_to_clear(self) -> &'static [&'static str] {
        match self {
            Self::SkipWaiting => &[],
            Self::ClearCache => &[STATIC_CACHE, DYNAMIC_CACHE],
        }
    }
}

// ---------------------------------------------------------------------------
// Published policy
// ---------------------------------------------------------------------------

/// JSON document served to the worker script.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyDocument {
    pub static_cache: &'static str,
    pub dynamic_cache: &'static str,
    pub static_extensions: &'static [&'static str],
    pub static_max_age_secs: u64,
    pub bypass_path_prefixes: &'static [&'static str],
    pub backend_hostname: Option<String>,
    pub control_messages: Vec<&'static str>,
}

pub fn policy_document(backend_hostname: Option<String>) -> PolicyDocument {
    PolicyDocument {
        static_cache: STATIC_CACHE,
        dynamic_cache: DYNAMIC_CACHE,
        static_extensions: STATIC_EXTENSIONS,
        static_max_age_secs: STATIC_MAX_AGE_SECS,
        bypass_path_prefixes: BYPASS_PATH_PREFIXES,
        backend_hostname,
        control_messages: ControlMessage::ALL.iter().map(|m| m.as_str()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP: &str = "https://app.koinonia.local";

    fn get(path: &str) -> RequestInfo<'_> {
        RequestInfo {
            method: "GET",
            origin: APP,
            path,
            accept: None,
            is_navigation: false,
        }
    }

    #[test]
    fn non_get_is_bypassed() {
        let req = RequestInfo {
            method: "POST",
            ..get("/app.js")
        };
        assert_eq!(classify(&req, APP, None), Strategy::Bypass);
    }

    #[test]
    fn cross_origin_and_api_are_bypassed() {
        let foreign = RequestInfo {
            origin: "https://cdn.example.com",
            ..get("/lib.js")
        };
        assert_eq!(classify(&foreign, APP, None), Strategy::Bypass);
        assert_eq!(classify(&get("/api/v1/songs"), APP, None), Strategy::Bypass);
    }

    #[test]
    fn backend_host_is_bypassed() {
        assert_eq!(
            classify(&get("/index.html"), APP, Some("app.koinonia.local")),
            Strategy::Bypass
        );
    }

    #[test]
    fn navigations_are_network_first() {
        let nav = RequestInfo {
            is_navigation: true,
            ..get("/escalas")
        };
        assert_eq!(
            classify(&nav, APP, None),
            Strategy::NetworkFirst(CacheName::Dynamic)
        );
        let html = RequestInfo {
            accept: Some("text/html,application/xhtml+xml"),
            ..get("/")
        };
        assert_eq!(
            classify(&html, APP, None),
            Strategy::NetworkFirst(CacheName::Dynamic)
        );
    }

    #[test]
    fn static_assets_are_cache_first() {
        for path in ["/assets/index-4f2a.js", "/logo.PNG", "/favicon.ico", "/a/b.css"] {
            assert_eq!(
                classify(&get(path), APP, None),
                Strategy::CacheFirst(CacheName::Static),
                "{path}"
            );
        }
        assert_eq!(
            classify(&get("/manifest.json"), APP, None),
            Strategy::NetworkFirst(CacheName::Dynamic)
        );
    }

    #[test]
    fn cache_control_headers() {
        assert_eq!(cache_control_for("/assets/app.js"), "public, max-age=3600");
        assert_eq!(cache_control_for("/index.html"), "no-cache");
    }

    #[test]
    fn control_messages() {
        assert_eq!(
            ControlMessage::parse("CLEAR_CACHE").unwrap(),
            ControlMessage::ClearCache
        );
        assert!(ControlMessage::parse("RELOAD").is_err());
        assert_eq!(ControlMessage::ClearCache.caches_to_clear().len(), 2);
        assert!(ControlMessage::SkipWaiting.caches_to_clear().is_empty());
    }

    #[test]
    fn stale_caches_skip_current_names() {
        let existing = vec![
            STATIC_CACHE.to_string(),
            "koinonia-static-v0".to_string(),
            DYNAMIC_CACHE.to_string(),
        ];
        assert_eq!(stale_caches(&existing), vec!["koinonia-static-v0".to_string()]);
    }

    #[test]
    fn policy_document_lists_control_messages() {
        let doc = policy_document(Some("db.example.com".into()));
        assert_eq!(doc.control_messages, vec!["SKIP_WAITING", "CLEAR_CACHE"]);
        assert_eq!(doc.static_max_age_secs, 3600);
    }
}
