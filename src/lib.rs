pub mod cli;
pub mod client;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod protocol;
pub mod render;
pub mod server;
pub mod store;
