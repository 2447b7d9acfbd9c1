use crate::errors::Result;
use crate::types::{HttpRequest, HttpResponse};
use async_trait::async_trait;

/// The HTTP collaborator the browser drives.
///
/// Implementations perform exactly one request: they must not follow
/// redirects or manage cookies, since the browser does both itself.
/// Connection, TLS and timeout failures are reported as
/// [`BrowserError::TransportError`](crate::errors::BrowserError::TransportError).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn request(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).request(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn request(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).request(request).await
    }
}
