pub mod pull_request;
pub mod repository;
pub mod metrics;

pub use pull_request::*;
pub use repository::*;
pub use metrics::*;
