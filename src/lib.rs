pub mod client;
pub mod config;
pub mod dto;
pub mod error;
pub mod probes;
pub mod proxy;
pub mod response;
pub mod schema;
pub mod verification;
