use url::Url;

/// Normalizes a configured origin: trims, requires http(s) and a host, and
/// forces a `/` path. Anything unusable falls back to `fallback`.
pub fn normalize_origin_url(raw: &str, fallback: &str) -> Url {
    let parsed = Url::parse(raw.trim()).ok().filter(|url| {
        matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
    });

    match parsed {
        Some(mut url) => {
            if url.path().is_empty() {
                url.set_path("/");
            }
            url
        }
        None => Url::parse(fallback).unwrap_or_else(|_| default_origin()),
    }
}

fn default_origin() -> Url {
    // Literal is a valid absolute URL.
    Url::parse(crate::app_constants::DEFAULT_TRUSTED_ORIGIN)
        .expect("default trusted origin is a valid URL")
}

/// True when `host` is `trusted_host` itself or one of its subdomains.
pub fn host_matches(host: &str, trusted_host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let trusted_host = trusted_host.trim_end_matches('.').to_ascii_lowercase();
    if trusted_host.is_empty() {
        return false;
    }

    host == trusted_host
        || host
            .strip_suffix(&trusted_host)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

pub fn is_trusted_url(candidate: &str, trusted_origin: &Url) -> bool {
    let Some(trusted_host) = trusted_origin.host_str() else {
        return false;
    };
    let Ok(parsed) = Url::parse(candidate.trim()) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    parsed
        .host_str()
        .is_some_and(|host| host_matches(host, trusted_host))
}
