pub mod open_graph;
pub mod request_log;

pub use open_graph::facebook_crawler_middleware;
pub use request_log::request_log_middleware;
