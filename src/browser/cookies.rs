use crate::errors::Result;
use crate::types::HttpResponse;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::{Host, Url};

/// Date layouts seen in `Expires` besides RFC 2822 / RFC 1123.
const EXPIRES_FORMATS: &[&str] = &[
    "%A, %d-%b-%y %H:%M:%S GMT",
    "%a, %d-%b-%Y %H:%M:%S GMT",
    "%a, %d %b %Y %H:%M:%S GMT",
    "%a %b %e %H:%M:%S %Y",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Lowercase domain without a leading dot.
    pub domain: String,
    /// Set without a `Domain` attribute: only sent back to the exact host.
    pub host_only: bool,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    /// `None` for session cookies.
    pub expires: Option<DateTime<Utc>>,
}

impl Cookie {
    /// Parses one `Set-Cookie` header received from `url`. Returns `None` when
    /// the header is malformed or names a domain the host may not set.
    pub fn parse(header: &str, url: &Url, now: DateTime<Utc>) -> Option<Self> {
        let host = url.host_str()?.to_ascii_lowercase();
        let mut parts = header.split(';');

        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Cookie {
            name: name.to_string(),
            value: value.trim().trim_matches('"').to_string(),
            domain: host.clone(),
            host_only: true,
            path: default_path(url),
            secure: false,
            http_only: false,
            expires: None,
        };

        let mut max_age: Option<i64> = None;
        let mut expires: Option<DateTime<Utc>> = None;

        for attribute in parts {
            let (key, value) = match attribute.split_once('=') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (attribute.trim(), ""),
            };

            match key.to_ascii_lowercase().as_str() {
                "domain" => {
                    let domain = value.trim_start_matches('.').to_ascii_lowercase();
                    if domain.is_empty() {
                        continue;
                    }
                    if domain == host {
                        // IP addresses and dotless hosts never widen beyond themselves
                        cookie.host_only = is_ip_host(url) || !domain.contains('.');
                        continue;
                    }
                    if is_ip_host(url) || !domain.contains('.') || !domain_match(&host, &domain) {
                        warn!(cookie = %cookie.name, %domain, %host, "rejecting cookie for foreign domain");
                        return None;
                    }
                    cookie.domain = domain;
                    cookie.host_only = false;
                }
                "path" if value.starts_with('/') => cookie.path = value.to_string(),
                "max-age" => max_age = value.parse().ok(),
                "expires" => expires = parse_expires(value),
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                _ => {}
            }
        }

        cookie.expires = match max_age {
            Some(seconds) if seconds <= 0 => Some(DateTime::<Utc>::MIN_UTC),
            Some(seconds) => Some(now + Duration::seconds(seconds.min(i64::from(i32::MAX)))),
            None => expires,
        };

        Some(cookie)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.map_or(false, |expires| expires <= now)
    }

    /// Whether the cookie should accompany a request to `url`.
    pub fn matches(&self, url: &Url, now: DateTime<Utc>) -> bool {
        let host = match url.host_str() {
            Some(host) => host.to_ascii_lowercase(),
            None => return false,
        };

        if self.is_expired(now) || (self.secure && url.scheme() != "https") {
            return false;
        }

        let domain_ok = if self.host_only || is_ip_host(url) {
            host == self.domain
        } else {
            domain_match(&host, &self.domain)
        };
        domain_ok && path_match(url.path(), &self.path)
    }

    fn same_slot(&self, other: &Cookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }
}

/// All cookies of a session, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// Inserts a cookie, replacing any with the same name, domain and path.
    /// An already expired cookie only removes its predecessor.
    pub fn insert(&mut self, cookie: Cookie) {
        self.insert_at(cookie, Utc::now());
    }

    /// Applies every `Set-Cookie` header of `response`.
    pub fn store_response_cookies(&mut self, response: &HttpResponse) {
        let now = Utc::now();
        for header in response.header_values("set-cookie") {
            self.store_at(header, &response.url, now);
        }
    }

    /// Applies one `Set-Cookie` header; returns whether it was accepted.
    pub fn store(&mut self, header: &str, url: &Url) -> bool {
        self.store_at(header, url, Utc::now())
    }

    /// The `Cookie` header value for a request to `url`, longest path first.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        self.cookie_header_at(url, Utc::now())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn store_at(&mut self, header: &str, url: &Url, now: DateTime<Utc>) -> bool {
        match Cookie::parse(header, url, now) {
            Some(cookie) => {
                debug!(name = %cookie.name, domain = %cookie.domain, path = %cookie.path, "storing cookie");
                self.insert_at(cookie, now);
                true
            }
            None => {
                debug!(header, "ignoring Set-Cookie header");
                false
            }
        }
    }

    fn insert_at(&mut self, cookie: Cookie, now: DateTime<Utc>) {
        self.cookies.retain(|c| !c.same_slot(&cookie) && !c.is_expired(now));
        if !cookie.is_expired(now) {
            self.cookies.push(cookie);
        }
    }

    fn cookie_header_at(&self, url: &Url, now: DateTime<Utc>) -> Option<String> {
        let mut matching: Vec<&Cookie> = self.cookies.iter().filter(|c| c.matches(url, now)).collect();
        if matching.is_empty() {
            return None;
        }

        // Stable sort keeps insertion order among equal path lengths
        matching.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        Some(
            matching
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

fn is_ip_host(url: &Url) -> bool {
    matches!(url.host(), Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)))
}

fn domain_match(host: &str, domain: &str) -> bool {
    host == domain || (host.ends_with(domain) && host[..host.len() - domain.len()].ends_with('.'))
}

fn path_match(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

/// The directory of the request path, `/` at minimum.
fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(index) => path[..index].to_string(),
    }
}

fn parse_expires(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }

    EXPIRES_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}
