use crate::browser::cookies::CookieJar;
use crate::browser::http::HttpTransport;
use crate::browser::navigation::{NavigationInfo, NavigationManager};
use crate::core::{Config, Transport};
use crate::dom::{Document, ElementFilter, Link};
use crate::errors::{BrowserError, Result};
use crate::forms::{ButtonHandle, Form};
use crate::types::HttpRequest;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserState {
    /// Nothing opened yet.
    Unopened,
    Ready,
    /// The last operation failed; see [`Browser::last_error`].
    Error,
}

/// One sequential browsing session: current document, history and cookies.
///
/// Every navigation either fully succeeds (new current document, cookies
/// committed) or changes nothing but the state and the last error message.
pub struct Browser<T: Transport = HttpTransport> {
    transport: T,
    config: Config,
    session_id: String,
    state: BrowserState,
    history: Vec<Document>,
    cookies: CookieJar,
    last_error: Option<String>,
    last_navigation: Option<NavigationInfo>,
}

impl Browser<HttpTransport> {
    pub fn new(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(&config.browser)?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> Browser<T> {
    pub fn with_transport(transport: T, config: Config) -> Self {
        Self {
            transport,
            config,
            session_id: Uuid::new_v4().to_string(),
            state: BrowserState::Unopened,
            history: Vec::new(),
            cookies: CookieJar::new(),
            last_error: None,
            last_navigation: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> BrowserState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Status, redirect count and timing of the request chain that produced
    /// the current document. Cleared by [`Browser::back`], kept on failure.
    pub fn last_navigation(&self) -> Option<NavigationInfo> {
        self.last_navigation
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Replaces the cookie jar, e.g. with one restored from JSON.
    pub fn set_cookies(&mut self, cookies: CookieJar) {
        self.cookies = cookies;
    }

    pub fn current(&self) -> Option<&Document> {
        self.history.last()
    }

    /// The current document, or `NoDocument` before the first successful open.
    pub fn document(&self) -> Result<&Document> {
        self.current().ok_or(BrowserError::NoDocument)
    }

    pub fn url(&self) -> Option<&Url> {
        self.current().map(|d| d.url())
    }

    /// Visited documents, oldest first; the last one is current.
    pub fn history(&self) -> &[Document] {
        &self.history
    }

    pub fn links(&self) -> Result<Vec<Link>> {
        Ok(self.document()?.links().collect())
    }

    pub fn forms(&self) -> Result<Vec<Form>> {
        Ok(self.document()?.forms().collect())
    }

    pub fn find_link(&self, filter: &ElementFilter, n: Option<usize>) -> Result<Link> {
        self.document()?.find_link(filter, n)
    }

    pub fn find_form(&self, filter: &ElementFilter, n: Option<usize>) -> Result<Form> {
        self.document()?.find_form(filter, n)
    }

    /// Opens `url`. With a current document the URL may be relative to its
    /// base; otherwise it must be absolute.
    pub async fn open(&mut self, url: &str) -> Result<&Document> {
        let target = match self.current() {
            Some(document) => document.resolve(url),
            None => Url::parse(url.trim()).map_err(BrowserError::from),
        };

        match target {
            Ok(target) => self.navigate(HttpRequest::get(target)).await,
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Follows a link of the current document.
    pub async fn follow(&mut self, link: &Link) -> Result<&Document> {
        let target = self
            .check_handle(link.document_id, "link")
            .and_then(|document| document.resolve(&link.href));

        match target {
            Ok(target) => self.navigate(HttpRequest::get(target)).await,
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Finds a link in the current document and follows it.
    pub async fn follow_link(&mut self, filter: &ElementFilter, n: Option<usize>) -> Result<&Document> {
        match self.find_link(filter, n) {
            Ok(link) => self.follow(&link).await,
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Submits a form of the current document, optionally through a submit button.
    pub async fn submit(&mut self, form: &Form, clicked: Option<ButtonHandle>) -> Result<&Document> {
        let request = self
            .check_handle(form.document_id(), "form")
            .and_then(|_| form.encode(clicked));

        match request {
            Ok(request) => self.navigate(request).await,
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Returns to the previous document without a request.
    pub fn back(&mut self) -> Result<&Document> {
        if self.history.len() < 2 {
            return Err(self.fail(BrowserError::NoHistory));
        }

        self.history.pop();
        self.last_navigation = None;
        self.state = BrowserState::Ready;
        self.last_error = None;
        self.document()
    }

    fn check_handle(&self, document_id: Uuid, what: &str) -> Result<&Document> {
        let document = self.document()?;
        if document.id() != document_id {
            return Err(BrowserError::StaleHandle(format!(
                "{} belongs to document {}, current is {}",
                what,
                document_id,
                document.id()
            )));
        }
        Ok(document)
    }

    async fn navigate(&mut self, request: HttpRequest) -> Result<&Document> {
        let referer = self.current().map(|d| d.url().clone());
        let outcome = NavigationManager::new(&self.transport, &self.config)
            .run(request, self.cookies.clone(), referer)
            .await;

        match outcome {
            Ok(navigation) => {
                self.last_navigation = Some(navigation.info());
                self.cookies = navigation.cookies;
                self.push(navigation.document);
                self.state = BrowserState::Ready;
                self.last_error = None;
                self.document()
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn push(&mut self, document: Document) {
        self.history.push(document);
        let max_history = self.config.navigation.max_history.max(1);
        if self.history.len() > max_history {
            let excess = self.history.len() - max_history;
            self.history.drain(..excess);
            debug!(session = %self.session_id, dropped = excess, "history trimmed");
        }
    }

    fn fail(&mut self, err: BrowserError) -> BrowserError {
        warn!(session = %self.session_id, error = %err, "browser operation failed");
        self.state = BrowserState::Error;
        self.last_error = Some(err.to_string());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{FieldValue, FileUpload};
    use crate::testing::{MockResponse, MockTransport, TestHelper};
    use crate::types::Method;

    fn browser(transport: &MockTransport) -> Browser<MockTransport> {
        Browser::with_transport(transport.clone(), Config::default())
    }

    #[tokio::test]
    async fn test_open_and_state() {
        let transport = MockTransport::new();
        transport.route("http://example.com/", MockResponse::html("<title>Home</title>"));
        let mut browser = browser(&transport);
        assert_eq!(browser.state(), BrowserState::Unopened);
        assert!(matches!(browser.document(), Err(BrowserError::NoDocument)));

        let document = browser.open("http://example.com/").await.unwrap();
        assert_eq!(document.title().as_deref(), Some("Home"));
        assert_eq!(browser.state(), BrowserState::Ready);

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, Method::Get);
        assert!(request.header("User-Agent").unwrap().starts_with("minimech/"));
        assert_eq!(request.header("Referer"), None);
    }

    #[tokio::test]
    async fn test_relative_open_without_document() {
        let transport = MockTransport::new();
        let mut browser = browser(&transport);
        let err = browser.open("/relative").await.unwrap_err();
        assert!(matches!(err, BrowserError::InvalidUrl(_)));
        assert_eq!(browser.state(), BrowserState::Error);
        assert!(browser.last_error().is_some());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_relative_open_and_referer() {
        let transport = MockTransport::new();
        transport.route("http://example.com/a/start", MockResponse::html("<p>start"));
        transport.route("http://example.com/a/next", MockResponse::html("<p>next"));
        let mut browser = browser(&transport);
        browser.open("http://example.com/a/start#frag").await.unwrap();
        browser.open("next").await.unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.url.as_str(), "http://example.com/a/next");
        assert_eq!(request.header("Referer"), Some("http://example.com/a/start"));
        // Fragments are never sent
        assert_eq!(browser.history()[0].url().as_str(), "http://example.com/a/start");
    }

    #[tokio::test]
    async fn test_too_many_redirects_keeps_document() {
        let transport = MockTransport::new();
        transport.route("http://example.com/", MockResponse::html("<title>Start</title>"));
        for i in 0..11 {
            transport.route(
                &format!("http://example.com/r{}", i),
                MockResponse::redirect(302, &format!("/r{}", i + 1)),
            );
        }
        transport.route("http://example.com/r11", MockResponse::html("<title>End</title>"));

        let mut browser = browser(&transport);
        browser.open("http://example.com/").await.unwrap();
        let err = browser.open("/r0").await.unwrap_err();
        assert!(matches!(err, BrowserError::TooManyRedirects { limit: 10, .. }));
        assert_eq!(browser.state(), BrowserState::Error);
        assert_eq!(browser.document().unwrap().title().as_deref(), Some("Start"));
        assert_eq!(browser.history().len(), 1);

        // Ten redirects are still fine
        let document = browser.open("/r1").await.unwrap();
        assert_eq!(document.title().as_deref(), Some("End"));
        assert_eq!(browser.state(), BrowserState::Ready);
    }

    #[tokio::test]
    async fn test_back() {
        let transport = MockTransport::new();
        transport.route("http://example.com/one", MockResponse::html("<title>One</title>"));
        transport.route("http://example.com/two", MockResponse::html("<title>Two</title>"));
        let mut browser = browser(&transport);

        assert!(matches!(browser.back(), Err(BrowserError::NoHistory)));
        let first_id = browser.open("http://example.com/one").await.unwrap().id();
        browser.open("http://example.com/two").await.unwrap();

        let document = browser.back().unwrap();
        assert_eq!(document.id(), first_id);
        assert_eq!(document.url().as_str(), "http://example.com/one");
        assert_eq!(document.title().as_deref(), Some("One"));
        assert!(matches!(browser.back(), Err(BrowserError::NoHistory)));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_post_then_303_is_get() {
        let transport = MockTransport::new();
        transport.route(
            "http://example.com/form",
            MockResponse::html(r#"<form method="post" action="/save"><input name="a" value="1"></form>"#),
        );
        transport.route("http://example.com/save", MockResponse::redirect(303, "/done"));
        transport.route("http://example.com/done", MockResponse::html("<title>Done</title>"));

        let mut browser = browser(&transport);
        browser.open("http://example.com/form").await.unwrap();
        let form = browser.find_form(&ElementFilter::new(), None).unwrap();
        browser.submit(&form, None).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].method, Method::Post);
        assert_eq!(requests[1].body.as_deref(), Some(&b"a=1"[..]));
        assert_eq!(requests[2].method, Method::Get);
        assert_eq!(requests[2].url.as_str(), "http://example.com/done");
        assert!(requests[2].body.is_none());
        assert_eq!(requests[2].header("Content-Type"), None);
    }

    #[tokio::test]
    async fn test_post_then_301_or_302_is_get() {
        for status in [301, 302] {
            let transport = MockTransport::new();
            transport.route(
                "http://example.com/form",
                MockResponse::html(r#"<form method="post" action="/save"><input name="a" value="1"></form>"#),
            );
            transport.route("http://example.com/save", MockResponse::redirect(status, "/done"));
            transport.route("http://example.com/done", MockResponse::html("<title>Done</title>"));

            let mut browser = browser(&transport);
            browser.open("http://example.com/form").await.unwrap();
            let form = browser.find_form(&ElementFilter::new(), None).unwrap();
            let document = browser.submit(&form, None).await.unwrap();
            assert_eq!(document.title().as_deref(), Some("Done"));

            let last = transport.last_request().unwrap();
            assert_eq!(last.method, Method::Get, "status {}", status);
            assert!(last.body.is_none());
            assert_eq!(last.header("Content-Type"), None);
        }
    }

    #[tokio::test]
    async fn test_navigation_info() {
        let transport = MockTransport::new();
        transport.route("http://example.com/start", MockResponse::redirect(302, "/end"));
        transport.route("http://example.com/end", MockResponse::html("<title>End</title>"));
        transport.route("http://example.com/other", MockResponse::html("other"));
        transport.route("http://example.com/gone", MockResponse::status(404));

        let mut browser = browser(&transport);
        assert_eq!(browser.last_navigation(), None);
        browser.open("http://example.com/start").await.unwrap();
        let info = browser.last_navigation().unwrap();
        assert_eq!(info.status, 200);
        assert_eq!(info.redirects, 1);

        browser.open("/other").await.unwrap();
        assert_eq!(browser.last_navigation().unwrap().redirects, 0);

        browser.open("/gone").await.unwrap_err();
        assert_eq!(browser.last_navigation().unwrap().redirects, 0);

        browser.back().unwrap();
        assert_eq!(browser.last_navigation(), None);
    }

    #[tokio::test]
    async fn test_307_preserves_post() {
        let transport = MockTransport::new();
        transport.route(
            "http://example.com/form",
            MockResponse::html(r#"<form method="post" action="/old"><input name="a" value="1"></form>"#),
        );
        transport.route("http://example.com/old", MockResponse::redirect(307, "/new"));
        transport.route("http://example.com/new", MockResponse::html("ok"));

        let mut browser = browser(&transport);
        browser.open("http://example.com/form").await.unwrap();
        let form = browser.find_form(&ElementFilter::new(), None).unwrap();
        browser.submit(&form, None).await.unwrap();

        let last = transport.last_request().unwrap();
        assert_eq!(last.method, Method::Post);
        assert_eq!(last.body.as_deref(), Some(&b"a=1"[..]));
    }

    #[tokio::test]
    async fn test_cookies_sent_and_committed() {
        let transport = MockTransport::new();
        transport.route(
            "http://example.com/login",
            MockResponse::redirect(302, "/home").with_header("Set-Cookie", "sid=42; Path=/"),
        );
        transport.route("http://example.com/home", MockResponse::html("home"));
        transport.route("http://example.com/broken", MockResponse::status(500).with_header("Set-Cookie", "bad=1"));

        let mut browser = browser(&transport);
        browser.open("http://example.com/login").await.unwrap();
        assert_eq!(transport.last_request().unwrap().header("Cookie"), Some("sid=42"));
        assert_eq!(browser.cookies().get("sid").map(|c| c.value.as_str()), Some("42"));

        let err = browser.open("/broken").await.unwrap_err();
        assert!(matches!(err, BrowserError::HttpError { status: 500, .. }));
        assert!(browser.cookies().get("bad").is_none());
    }

    #[tokio::test]
    async fn test_meta_refresh_is_followed() {
        let transport = MockTransport::new();
        transport.route(
            "http://example.com/wait",
            MockResponse::html(r#"<meta http-equiv="refresh" content="0; url=/ready">"#),
        );
        transport.route("http://example.com/ready", MockResponse::html("<title>Ready</title>"));

        let mut browser = browser(&transport);
        let document = browser.open("http://example.com/wait").await.unwrap();
        assert_eq!(document.title().as_deref(), Some("Ready"));
        assert_eq!(
            transport.last_request().unwrap().header("Referer"),
            Some("http://example.com/wait")
        );
        assert_eq!(browser.history().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_header_is_followed() {
        let transport = MockTransport::new();
        transport.route(
            "http://example.com/wait",
            MockResponse::html("<title>Wait</title>").with_header("Refresh", "1; url=/ready"),
        );
        transport.route("http://example.com/ready", MockResponse::html("<title>Ready</title>"));

        let mut browser = browser(&transport);
        let document = browser.open("http://example.com/wait").await.unwrap();
        assert_eq!(document.title().as_deref(), Some("Ready"));
        assert_eq!(transport.requests().len(), 2);
        assert_eq!(browser.last_navigation().unwrap().redirects, 1);
    }

    #[tokio::test]
    async fn test_refresh_not_followed_when_disabled() {
        let transport = MockTransport::new();
        transport.route(
            "http://example.com/wait",
            MockResponse::html(r#"<title>Wait</title><meta http-equiv="refresh" content="0; url=/ready">"#)
                .with_header("Refresh", "0; url=/ready"),
        );
        let mut config = Config::default();
        config.navigation.follow_meta_refresh = false;
        let mut browser = Browser::with_transport(transport.clone(), config);

        let document = browser.open("http://example.com/wait").await.unwrap();
        assert_eq!(document.title().as_deref(), Some("Wait"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_no_referer_from_https_to_http() {
        let transport = MockTransport::new();
        transport.route("https://example.com/secure", MockResponse::html("secure"));
        transport.route("https://example.com/also", MockResponse::html("also"));
        transport.route("http://example.com/plain", MockResponse::html("plain"));

        let mut browser = browser(&transport);
        browser.open("https://example.com/secure").await.unwrap();
        browser.open("/also").await.unwrap();
        assert_eq!(
            transport.last_request().unwrap().header("Referer"),
            Some("https://example.com/secure")
        );

        browser.open("http://example.com/plain").await.unwrap();
        assert_eq!(transport.last_request().unwrap().header("Referer"), None);
    }

    #[tokio::test]
    async fn test_referer_disabled() {
        let transport = MockTransport::new();
        transport.route("http://example.com/a", MockResponse::html("a"));
        transport.route("http://example.com/b", MockResponse::html("b"));
        let mut config = Config::default();
        config.navigation.send_referer = false;
        let mut browser = Browser::with_transport(transport.clone(), config);

        browser.open("http://example.com/a").await.unwrap();
        browser.open("/b").await.unwrap();
        assert_eq!(transport.last_request().unwrap().header("Referer"), None);
    }

    #[tokio::test]
    async fn test_failures_leave_document_and_history() {
        let transport = MockTransport::new();
        transport.route(
            "http://example.com/",
            MockResponse::html(r#"<title>Home</title><a href="/next">Next</a>"#),
        );
        transport.route("http://example.com/next", MockResponse::html("<title>Next</title>"));
        transport.route("http://example.com/missing", MockResponse::status(404));
        transport.fail("http://example.com/down", "connection reset");

        let mut browser = browser(&transport);
        let home_id = browser.open("http://example.com/").await.unwrap().id();
        let link = browser.find_link(&ElementFilter::new().text("Next"), None).unwrap();

        let err = browser.open("/missing").await.unwrap_err();
        assert!(matches!(err, BrowserError::HttpError { status: 404, .. }));
        assert_eq!(browser.document().unwrap().id(), home_id);
        assert_eq!(browser.history().len(), 1);

        let err = browser.open("/down").await.unwrap_err();
        assert!(matches!(err, BrowserError::TransportError(_)));
        assert_eq!(browser.state(), BrowserState::Error);
        assert_eq!(browser.document().unwrap().id(), home_id);
        assert_eq!(browser.history().len(), 1);

        // Handles from the unchanged document still work
        let document = browser.follow(&link).await.unwrap();
        assert_eq!(document.title().as_deref(), Some("Next"));
        assert_eq!(browser.history().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_multipart_form() {
        let transport = MockTransport::new();
        transport.route(
            "http://example.com/upload",
            MockResponse::html(
                r#"<form method="post" action="/files" enctype="multipart/form-data">
                     <input name="title" value="report">
                     <input type="file" name="doc">
                   </form>"#,
            ),
        );
        transport.route("http://example.com/files", MockResponse::html("<title>Stored</title>"));

        let mut browser = browser(&transport);
        browser.open("http://example.com/upload").await.unwrap();
        let stats = TestHelper::get_page_stats(browser.document().unwrap());
        assert_eq!((stats.forms, stats.controls), (1, 2));
        let mut form = browser.find_form(&ElementFilter::new(), None).unwrap();
        form.set_value("doc", FileUpload::new("notes.txt", "text/plain", b"line one".to_vec()))
            .unwrap();
        let document = browser.submit(&form, None).await.unwrap();
        assert_eq!(document.title().as_deref(), Some("Stored"));

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url.as_str(), "http://example.com/files");
        let content_type = request.header("Content-Type").unwrap().to_string();
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap()
            .to_string();

        let body = String::from_utf8(request.body.clone().unwrap()).unwrap();
        assert!(body.starts_with(&format!("--{}\r\n", boundary)));
        assert!(body.ends_with(&format!("--{}--\r\n", boundary)));
        assert!(body.contains("Content-Disposition: form-data; name=\"title\"\r\n\r\nreport\r\n"));
        assert!(body.contains(
            "Content-Disposition: form-data; name=\"doc\"; filename=\"notes.txt\"\r\nContent-Type: text/plain\r\n\r\nline one\r\n"
        ));
    }

    #[tokio::test]
    async fn test_stale_handles() {
        let transport = MockTransport::new();
        transport.route(
            "http://example.com/",
            MockResponse::html(r#"<a href="/next">Next</a><form><input name="q"></form>"#),
        );
        transport.route("http://example.com/next", MockResponse::html("next"));

        let mut browser = browser(&transport);
        browser.open("http://example.com/").await.unwrap();
        let link = browser.find_link(&ElementFilter::new().text("Next"), None).unwrap();
        let form = browser.find_form(&ElementFilter::new(), None).unwrap();

        browser.follow(&link).await.unwrap();
        assert!(matches!(browser.follow(&link).await, Err(BrowserError::StaleHandle(_))));
        assert!(matches!(browser.submit(&form, None).await, Err(BrowserError::StaleHandle(_))));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_get_form() {
        let transport = MockTransport::new();
        transport.route(
            "http://example.com/",
            MockResponse::html(r#"<form action="/search"><input name="q"><input type="submit" name="go" value="Go"></form>"#),
        );
        transport.route("http://example.com/search?q=a+b&go=Go", MockResponse::html("results"));

        let mut browser = browser(&transport);
        browser.open("http://example.com/").await.unwrap();
        let mut form = browser.find_form(&ElementFilter::new(), None).unwrap();
        form.set_value("q", FieldValue::Text("a b".to_string())).unwrap();
        let go = form.button("go").unwrap();
        let document = browser.submit(&form, Some(go)).await.unwrap();

        let pairs: Vec<(String, String)> = document.url().query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![("q".to_string(), "a b".to_string()), ("go".to_string(), "Go".to_string())]
        );
    }

    #[tokio::test]
    async fn test_transport_error() {
        let transport = MockTransport::new();
        transport.fail("http://example.com/down", "connection refused");
        let mut browser = browser(&transport);
        let err = browser.open("http://example.com/down").await.unwrap_err();
        assert!(matches!(err, BrowserError::TransportError(_)));
        assert!(err.is_navigation_error());
        assert!(browser.last_error().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let transport = MockTransport::new();
        transport.route("http://example.com/", MockResponse::html("page"));
        let mut config = Config::default();
        config.navigation.max_history = 2;
        let mut browser = Browser::with_transport(transport.clone(), config);
        for _ in 0..3 {
            browser.open("http://example.com/").await.unwrap();
        }
        assert_eq!(browser.history().len(), 2);
    }

    #[test]
    fn test_follow_link_blocking() {
        let transport = MockTransport::new();
        transport.route("http://example.com/", MockResponse::html(r#"<a href="b" id="go">b</a>"#));
        transport.route("http://example.com/b", MockResponse::html("<title>B</title>"));
        let mut browser = browser(&transport);

        let title = tokio_test::block_on(async {
            browser.open("http://example.com/").await?;
            let document = browser.follow_link(&ElementFilter::new().id("go"), None).await?;
            Ok::<_, BrowserError>(document.title())
        })
        .unwrap();
        assert_eq!(title.as_deref(), Some("B"));
    }
}
