use crate::core::Transport;
use crate::dom::{Document, ElementFilter};
use crate::errors::{BrowserError, Result};
use crate::types::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use url::Url;

/// A canned response for [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl MockResponse {
    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            headers: vec![("Content-Type".to_string(), "text/html; charset=utf-8".to_string())],
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn bytes(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body,
        }
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self::status(status).with_header("Location", location)
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug, Clone)]
enum Route {
    Respond(MockResponse),
    Fail(String),
}

#[derive(Debug, Default)]
struct MockState {
    routes: HashMap<String, Route>,
    requests: Vec<HttpRequest>,
}

/// Scripted in-memory transport. Routes are keyed by the full request URL
/// (fragment excluded); unknown URLs answer 404. Clones share routes and the
/// request log.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, response: MockResponse) {
        self.lock().routes.insert(route_key(url), Route::Respond(response));
    }

    /// Makes requests to `url` fail as if the connection broke.
    pub fn fail(&self, url: &str, message: &str) {
        self.lock().routes.insert(route_key(url), Route::Fail(message.to_string()));
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.lock().requests.last().cloned()
    }

    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    // A test that panicked while holding the lock must not hide later results
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn route_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let route = {
            let mut state = self.lock();
            state.requests.push(request.clone());
            state.routes.get(&route_key(request.url.as_str())).cloned()
        };

        let response = match route {
            Some(Route::Respond(response)) => response,
            Some(Route::Fail(message)) => return Err(BrowserError::TransportError(message)),
            None => MockResponse::status(404),
        };

        Ok(HttpResponse {
            status: response.status,
            url: request.url.clone(),
            headers: response.headers,
            body: response.body,
        })
    }
}

pub struct TestHelper;

impl TestHelper {
    /// Parses a fixture page served from `http://test.invalid/`.
    pub fn document(html: &str) -> Result<Document> {
        Self::document_at(html, "http://test.invalid/")
    }

    /// Parses a fixture page as if it had been served from `url`.
    pub fn document_at(html: &str, url: &str) -> Result<Document> {
        Ok(Document::from_html(html, Url::parse(url)?))
    }

    pub fn count_elements_by_type(document: &Document, tag: &str) -> usize {
        document.find_all_elements(&ElementFilter::new().tag(tag)).count()
    }

    pub fn get_page_stats(document: &Document) -> PageStats {
        PageStats {
            total_elements: document.root().find(|n| n.is_element()).count(),
            links: document.links().count(),
            forms: document.forms().count(),
            controls: document.forms().map(|f| f.controls().len()).sum(),
            images: Self::count_elements_by_type(document, "img"),
            buttons: Self::count_elements_by_type(document, "button"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStats {
    pub total_elements: usize,
    pub links: usize,
    pub forms: usize,
    pub controls: usize,
    pub images: usize,
    pub buttons: usize,
}
