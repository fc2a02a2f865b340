mod cors;
mod requests_logging;

pub use cors::cors_headers;
pub use requests_logging::{log_requests, RequestsLoggingLevel};
