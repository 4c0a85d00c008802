pub mod http;
pub mod provider;
pub mod types;

pub use http::HttpBackend;
pub use provider::{BackendError, ChatBackend};
pub use types::{ChatReply, ServiceStatus};
