pub mod config;
pub mod transport;

pub use config::{BrowserConfig, Config, NavigationConfig};
pub use transport::Transport;
