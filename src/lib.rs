// Media chunk streaming proxy: reshapes byte-range requests into aligned
// chunk-fetch tasks and reshapes their results into partial responses.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod range;
pub mod server;
pub mod source;

pub use api::proxy_api::StreamProxy;
pub use config::StreamConfig;
pub use error::StreamError;
