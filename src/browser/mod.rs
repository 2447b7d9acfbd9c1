pub mod cookies;
pub mod http;
pub mod navigation;
pub mod session;

pub use cookies::{Cookie, CookieJar};
pub use http::HttpTransport;
pub use navigation::{NavigationInfo, NavigationManager, NavigationResult};
pub use session::{Browser, BrowserState};
