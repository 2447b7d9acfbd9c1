use crate::browser::cookies::CookieJar;
use crate::core::{Config, Transport};
use crate::dom::Document;
use crate::errors::{BrowserError, Result};
use crate::types::{HttpRequest, HttpResponse};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{debug, info};
use url::Url;

static REFRESH_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

/// Runs one navigation: the initial request plus every redirect and refresh
/// it triggers, up to the configured limit.
pub struct NavigationManager<'a, T: Transport + ?Sized> {
    transport: &'a T,
    config: &'a Config,
}

/// Outcome of a successful navigation. `cookies` is the staged jar with every
/// `Set-Cookie` of the chain applied.
#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub document: Document,
    pub cookies: CookieJar,
    pub status: u16,
    pub redirects: usize,
    pub duration_ms: u64,
}

/// Summary of a finished navigation, kept by the browser after the
/// document and cookies have been taken out of the [`NavigationResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationInfo {
    /// Status of the final response.
    pub status: u16,
    /// Redirects and refreshes followed on the way.
    pub redirects: usize,
    pub duration_ms: u64,
}

impl NavigationResult {
    pub fn info(&self) -> NavigationInfo {
        NavigationInfo {
            status: self.status,
            redirects: self.redirects,
            duration_ms: self.duration_ms,
        }
    }
}

enum Hop {
    /// Another request is needed. `preserve` keeps method, body and headers.
    Follow { target: Url, preserve: bool, refresh: bool },
    Done { document: Document, status: u16 },
}

impl<'a, T: Transport + ?Sized> NavigationManager<'a, T> {
    pub fn new(transport: &'a T, config: &'a Config) -> Self {
        Self { transport, config }
    }

    /// Sends `request` and follows the chain. `jar` is a copy of the session
    /// jar; the caller decides whether to keep it.
    pub async fn run(
        &self,
        mut request: HttpRequest,
        mut jar: CookieJar,
        mut referer: Option<Url>,
    ) -> Result<NavigationResult> {
        let start_time = Instant::now();
        let limit = self.config.navigation.max_redirects;
        let mut redirects = 0;

        loop {
            self.prepare(&mut request, &jar, referer.as_ref());
            debug!(method = %request.method, url = %request.url, "sending request");

            let response = self.transport.request(&request).await?;
            jar.store_response_cookies(&response);

            let (target, preserve) = match self.classify(response)? {
                Hop::Done { document, status } => {
                    let duration_ms = start_time.elapsed().as_millis() as u64;
                    info!(url = %document.url(), status, redirects, duration_ms, "navigation complete");
                    return Ok(NavigationResult {
                        document,
                        cookies: jar,
                        status,
                        redirects,
                        duration_ms,
                    });
                }
                Hop::Follow { target, preserve, refresh } => {
                    if refresh {
                        referer = Some(request.url.clone());
                    }
                    (target, preserve)
                }
            };

            if redirects >= limit {
                return Err(BrowserError::TooManyRedirects {
                    limit,
                    url: target.to_string(),
                });
            }
            redirects += 1;
            debug!(from = %request.url, to = %target, preserve, "following redirect");

            if preserve {
                request.url = target;
            } else {
                request = HttpRequest::get(target);
            }
        }
    }

    /// Sets the per-hop headers: user agent, configured extras, cookies and referer.
    fn prepare(&self, request: &mut HttpRequest, jar: &CookieJar, referer: Option<&Url>) {
        request.url.set_fragment(None);

        let browser = &self.config.browser;
        request.set_header("User-Agent", browser.user_agent.clone());
        for (name, value) in &browser.extra_headers {
            request.set_header(name, value.clone());
        }

        match jar.cookie_header(&request.url) {
            Some(cookies) => request.set_header("Cookie", cookies),
            None => request.remove_header("Cookie"),
        }

        // No Referer when leaving https for plain http
        let referer = referer.filter(|r| {
            self.config.navigation.send_referer && !(r.scheme() == "https" && request.url.scheme() != "https")
        });
        match referer {
            Some(referer) => {
                let mut referer = referer.clone();
                referer.set_fragment(None);
                request.set_header("Referer", referer.to_string());
            }
            None => request.remove_header("Referer"),
        }
    }

    fn classify(&self, response: HttpResponse) -> Result<Hop> {
        if response.is_redirect() {
            return match response.header("location") {
                Some(location) => Ok(Hop::Follow {
                    target: response.url.join(location.trim())?,
                    preserve: matches!(response.status, 307 | 308),
                    refresh: false,
                }),
                None => Err(http_error(&response)),
            };
        }

        if !response.is_success() {
            return Err(http_error(&response));
        }

        let follow_refresh = self.config.navigation.follow_meta_refresh;
        if follow_refresh {
            let target = response
                .header("refresh")
                .and_then(|content| refresh_target(content, &response.url, &response.url));
            if let Some(target) = target {
                return Ok(Hop::Follow {
                    target,
                    preserve: false,
                    refresh: true,
                });
            }
        }

        let document = Document::parse(&response.body, response.content_charset(), response.url.clone());

        if follow_refresh {
            if let Some(target) = meta_refresh(&document) {
                return Ok(Hop::Follow {
                    target,
                    preserve: false,
                    refresh: true,
                });
            }
        }

        Ok(Hop::Done {
            document,
            status: response.status,
        })
    }
}

fn http_error(response: &HttpResponse) -> BrowserError {
    BrowserError::HttpError {
        status: response.status,
        url: response.url.to_string(),
    }
}

fn refresh_pattern() -> Option<&'static Regex> {
    REFRESH_PATTERN
        .get_or_init(|| Regex::new(r"^\s*\d+(?:\.\d*)?\s*[;,]\s*[uU][rR][lL]\s*=(.+)$").ok())
        .as_ref()
}

/// Parses `N; url=...` against `base`. A refresh without a URL, or one that
/// points back at `current`, is not a navigation.
fn refresh_target(content: &str, base: &Url, current: &Url) -> Option<Url> {
    let captures = refresh_pattern()?.captures(content)?;
    let raw = captures
        .get(1)?
        .as_str()
        .trim()
        .trim_matches(|c| c == '"' || c == '\'');
    let target = base.join(raw).ok()?;

    let mut here = current.clone();
    here.set_fragment(None);
    let mut there = target.clone();
    there.set_fragment(None);
    if here == there {
        debug!(url = %current, "ignoring refresh to the same page");
        return None;
    }
    Some(target)
}

fn meta_refresh(document: &Document) -> Option<Url> {
    document
        .root()
        .find(|n| n.tag() == "meta" && n.attr("http-equiv", "").trim().eq_ignore_ascii_case("refresh"))
        .find_map(|meta| refresh_target(meta.get_attr("content")?, document.base_url(), document.url()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_refresh_target() {
        let here = url("http://example.com/a/page");
        assert_eq!(
            refresh_target("0; url=next", &here, &here).map(|u| u.to_string()),
            Some("http://example.com/a/next".to_string())
        );
        assert_eq!(
            refresh_target("5;URL='/other'", &here, &here).map(|u| u.to_string()),
            Some("http://example.com/other".to_string())
        );
        assert!(refresh_target("5", &here, &here).is_none());
        assert!(refresh_target("0; url=page#top", &here, &here).is_none());
    }

    #[test]
    fn test_meta_refresh_uses_base() {
        let document = Document::from_html(
            r#"<head><base href="/base/"><meta http-equiv="Refresh" content="0; url=landing"></head>"#,
            url("http://example.com/start"),
        );
        assert_eq!(
            meta_refresh(&document).map(|u| u.to_string()),
            Some("http://example.com/base/landing".to_string())
        );

        let plain = Document::from_html("<meta name=refresh content='0; url=x'>", url("http://example.com/"));
        assert!(meta_refresh(&plain).is_none());
    }
}
