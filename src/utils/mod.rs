pub mod http_client_factory;
pub mod path;
pub mod retry;

pub use http_client_factory::HttpClientFactory;
pub use retry::with_retry;
