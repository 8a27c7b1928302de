pub mod ai_analysis;
pub mod feed;
pub mod http_client;
pub mod query;
pub mod resolve;
pub mod state;
pub mod stats_fetch;
