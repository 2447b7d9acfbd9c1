pub mod browser;
pub mod core;
pub mod dom;
pub mod errors;
pub mod forms;
pub mod testing;
pub mod types;

pub use crate::browser::{Browser, BrowserState, Cookie, CookieJar, HttpTransport, NavigationInfo};
pub use crate::core::{BrowserConfig, Config, NavigationConfig, Transport};
pub use crate::dom::{Document, ElementFilter, HtmlTree, Link, NodeId, NodeRef};
pub use crate::errors::{BrowserError, Result};
pub use crate::forms::{ButtonHandle, ControlKind, FieldValue, FileUpload, Form, FormControl};
pub use crate::types::*;
